use std::time::Duration;

/// Default User-Agent string sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("scc-posture-client/", env!("CARGO_PKG_VERSION"));

/// TLS root certificate strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsRootConfig {
    /// Use Mozilla's root certificates (webpki-roots, bundled at compile time)
    #[default]
    WebPki,
    /// Use the operating system's native certificate store
    Native,
}

/// Transport security mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportSecurity {
    /// Only `https://` URLs are accepted
    #[default]
    TlsOnly,
    /// Allow plain `http://` (for testing with mock servers only)
    AllowInsecureHttp,
}

/// Overall HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-request timeout (default: 30 seconds)
    ///
    /// Covers connect, request write and response headers. Requests are never
    /// retried, so this is also the upper bound for a single operation.
    pub request_timeout: Duration,

    /// Maximum response body size in bytes (default: 10 MB)
    pub max_body_size: usize,

    /// User-Agent header value
    pub user_agent: String,

    /// Transport security mode (default: `TlsOnly`)
    pub transport: TransportSecurity,

    /// TLS root certificate strategy (default: `WebPki`)
    pub tls_roots: TlsRootConfig,

    /// Capacity of the request queue in front of the connection pool (default: 64)
    pub buffer_capacity: usize,

    /// Timeout for idle pooled connections (default: 30 seconds)
    pub pool_idle_timeout: Option<Duration>,

    /// Maximum number of idle connections per host (default: 4)
    ///
    /// `0` disables connection reuse: every request opens a fresh connection
    /// that is released once the response body has been read.
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10 MB
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            transport: TransportSecurity::TlsOnly,
            tls_roots: TlsRootConfig::default(),
            buffer_capacity: 64,
            pool_idle_timeout: Some(Duration::from_secs(30)),
            pool_max_idle_per_host: 4,
        }
    }
}

impl HttpClientConfig {
    /// Configuration for IAM token endpoints
    ///
    /// Token responses are small, so the body limit is tight, and the pool
    /// keeps no idle connections since a token is requested once per run.
    #[must_use]
    pub fn token_endpoint() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_body_size: 64 * 1024,
            pool_max_idle_per_host: 0,
            buffer_capacity: 8,
            ..Self::default()
        }
    }

    /// Configuration for testing with mock servers (allows insecure HTTP)
    ///
    /// **WARNING**: plain HTTP connections are accepted. Use only against
    /// local mock servers.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            max_body_size: 1024 * 1024, // 1 MB
            transport: TransportSecurity::AllowInsecureHttp,
            pool_idle_timeout: Some(Duration::from_secs(10)),
            ..Self::default()
        }
    }
}
