use crate::config::{HttpClientConfig, TlsRootConfig, TransportSecurity};
use crate::error::HttpError;
use crate::headers::DefaultHeadersLayer;
use crate::response::ResponseBody;
use crate::tls;
use bytes::Bytes;
use http::Response;
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use std::time::Duration;
use tower::buffer::Buffer;
use tower::timeout::TimeoutLayer;
use tower::{ServiceBuilder, ServiceExt};
use tower_http::decompression::DecompressionLayer;

/// Builder for an [`HttpClient`](crate::HttpClient)
pub struct HttpClientBuilder {
    config: HttpClientConfig,
}

impl HttpClientBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HttpClientConfig::default(),
        }
    }

    /// Create a builder with a specific configuration
    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self { config }
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the user agent string
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Set the maximum response body size
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    /// Set transport security mode
    #[must_use]
    pub fn transport(mut self, transport: TransportSecurity) -> Self {
        self.config.transport = transport;
        self
    }

    /// Allow insecure HTTP connections (for testing only)
    ///
    /// Only available in debug builds or with the `allow-insecure-http`
    /// feature, so release binaries cannot reach plain HTTP by accident.
    #[must_use]
    #[cfg(any(debug_assertions, feature = "allow-insecure-http"))]
    pub fn allow_insecure_http(mut self) -> Self {
        tracing::warn!(
            target: "scc_http::security",
            "allow_insecure_http() called - HTTP traffic will NOT be encrypted"
        );
        self.config.transport = TransportSecurity::AllowInsecureHttp;
        self
    }

    /// Set the TLS root certificate strategy
    #[must_use]
    pub fn tls_roots(mut self, tls_roots: TlsRootConfig) -> Self {
        self.config.tls_roots = tls_roots;
        self
    }

    /// Set the request queue capacity
    ///
    /// A capacity of 0 is clamped to 1.
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        // tower::Buffer panics with capacity=0
        self.config.buffer_capacity = capacity.max(1);
        self
    }

    /// Set the idle connection timeout for the connection pool
    ///
    /// `None` keeps idle connections indefinitely.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Set the maximum number of idle connections per host
    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    /// Build the HTTP client
    ///
    /// Must be called inside a tokio runtime: the request buffer spawns its
    /// worker task here.
    ///
    /// # Errors
    /// Returns an error if TLS initialization fails or the user agent is not a
    /// valid header value.
    pub fn build(self) -> Result<crate::HttpClient, HttpError> {
        if self.config.transport == TransportSecurity::AllowInsecureHttp {
            tracing::warn!(
                "insecure HTTP enabled (TransportSecurity::AllowInsecureHttp); \
                 use only for testing with mock servers"
            );
        }

        let timeout = self.config.request_timeout;
        let https = tls::build_https_connector(self.config.tls_roots, self.config.transport)?;

        let mut client_builder = Client::builder(TokioExecutor::new());
        // pool_idle_timeout has no effect without a pool timer
        client_builder
            .pool_timer(TokioTimer::new())
            .pool_max_idle_per_host(self.config.pool_max_idle_per_host)
            .http2_only(false);
        if let Some(idle_timeout) = self.config.pool_idle_timeout {
            client_builder.pool_idle_timeout(idle_timeout);
        }
        let hyper_client = client_builder.build::<_, Full<Bytes>>(https);

        let default_headers =
            DefaultHeadersLayer::try_new([("user-agent", self.config.user_agent.as_str())])?;

        // Request flow (outer to inner):
        //   Buffer -> ErrorMapping -> Timeout -> DefaultHeaders ->
        //   Decompression -> hyper_client
        //
        // send() returns Ok for every HTTP status. Only transport, TLS and
        // timeout failures become errors. Redirects are not followed.
        let service = ServiceBuilder::new()
            .layer(TimeoutLayer::new(timeout))
            .layer(default_headers)
            .layer(DecompressionLayer::new())
            .service(hyper_client)
            .map_response(map_decompression_response)
            .map_err(move |e: tower::BoxError| map_tower_error(e, timeout))
            .boxed_clone();

        let buffered_service: crate::client::BufferedService =
            Buffer::new(service, self.config.buffer_capacity.max(1));

        Ok(crate::HttpClient {
            service: buffered_service,
            max_body_size: self.config.max_body_size,
            transport_security: self.config.transport,
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Map tower errors to `HttpError`, reporting the configured timeout.
fn map_tower_error(err: tower::BoxError, timeout: Duration) -> HttpError {
    if err.is::<tower::timeout::error::Elapsed>() {
        return HttpError::Timeout(timeout);
    }

    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(other) => HttpError::Transport(other),
    }
}

/// Box the decompression body into [`ResponseBody`].
fn map_decompression_response<B>(response: Response<B>) -> Response<ResponseBody>
where
    B: hyper::body::Body<Data = Bytes> + Send + Sync + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = response.into_parts();
    let boxed_body: ResponseBody = body.map_err(Into::into).boxed();
    Response::from_parts(parts, boxed_body)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;

    #[test]
    fn test_builder_default() {
        let builder = HttpClientBuilder::new();
        assert_eq!(builder.config.request_timeout, Duration::from_secs(30));
        assert_eq!(builder.config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(builder.config.buffer_capacity, 64);
    }

    #[test]
    fn test_builder_with_config() {
        let builder = HttpClientBuilder::with_config(HttpClientConfig::for_testing());
        assert_eq!(builder.config.request_timeout, Duration::from_secs(10));
        assert_eq!(
            builder.config.transport,
            TransportSecurity::AllowInsecureHttp
        );
    }

    #[test]
    fn test_builder_setters() {
        let builder = HttpClientBuilder::new()
            .timeout(Duration::from_secs(60))
            .user_agent("custom/1.0")
            .max_body_size(1024)
            .tls_roots(TlsRootConfig::Native)
            .pool_idle_timeout(None)
            .pool_max_idle_per_host(0);

        assert_eq!(builder.config.request_timeout, Duration::from_secs(60));
        assert_eq!(builder.config.user_agent, "custom/1.0");
        assert_eq!(builder.config.max_body_size, 1024);
        assert_eq!(builder.config.tls_roots, TlsRootConfig::Native);
        assert!(builder.config.pool_idle_timeout.is_none());
        assert_eq!(builder.config.pool_max_idle_per_host, 0);
    }

    #[test]
    fn test_builder_transport_security() {
        let builder = HttpClientBuilder::new().transport(TransportSecurity::AllowInsecureHttp);
        assert_eq!(
            builder.config.transport,
            TransportSecurity::AllowInsecureHttp
        );

        let builder = HttpClientBuilder::new().allow_insecure_http();
        assert_eq!(
            builder.config.transport,
            TransportSecurity::AllowInsecureHttp
        );
    }

    #[test]
    fn test_builder_zero_buffer_capacity_clamped() {
        let builder = HttpClientBuilder::new().buffer_capacity(0);
        assert_eq!(builder.config.buffer_capacity, 1);
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_user_agent() {
        let result = HttpClientBuilder::new().user_agent("bad\r\nagent").build();
        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[tokio::test]
    async fn test_builder_builds_with_defaults() {
        let client = HttpClientBuilder::new().build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_map_tower_error_timeout() {
        let err: tower::BoxError = Box::new(tower::timeout::error::Elapsed::new());
        let mapped = map_tower_error(err, Duration::from_secs(5));
        assert!(matches!(mapped, HttpError::Timeout(d) if d == Duration::from_secs(5)));
    }

    #[test]
    fn test_map_tower_error_preserves_http_error() {
        let err: tower::BoxError = Box::new(HttpError::Overloaded);
        assert!(matches!(
            map_tower_error(err, Duration::from_secs(1)),
            HttpError::Overloaded
        ));
    }
}
