use std::fmt;
use std::time::Duration;
use url::Url;

use crate::error::AuthError;
use crate::secret::SecretString;

/// Configuration for the IAM apikey token exchange.
///
/// `Debug` is manually implemented to redact [`api_key`](Self::api_key).
#[derive(Clone)]
pub struct IamAuthConfig {
    /// IAM token endpoint, e.g. `https://iam.cloud.ibm.com/identity/token`.
    pub url: Option<Url>,

    /// IBM Cloud API key (redacted in `Debug` output).
    pub api_key: SecretString,

    /// Token lifetime assumed when the response carries neither
    /// `expiration` nor `expires_in` (default: 1 hour).
    pub default_ttl: Duration,

    /// Override for the HTTP client configuration.
    /// When `None`,
    /// [`HttpClientConfig::token_endpoint()`](scc_http::HttpClientConfig::token_endpoint)
    /// is used.
    pub http_config: Option<scc_http::HttpClientConfig>,
}

impl IamAuthConfig {
    /// Config for `url` and `api_key` with default TTL and HTTP settings.
    #[must_use]
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url: Some(url),
            api_key,
            ..Self::default()
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConfigError`] if `url` is missing or `api_key`
    /// is blank.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.url.is_none() {
            return Err(AuthError::ConfigError("url is required".into()));
        }
        if self.api_key.is_blank() {
            return Err(AuthError::ConfigError("api_key must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for IamAuthConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: SecretString::default(),
            default_ttl: Duration::from_secs(60 * 60),
            http_config: None,
        }
    }
}

impl fmt::Debug for IamAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthConfig")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("api_key", &"[REDACTED]")
            .field("default_ttl", &self.default_ttl)
            .field("http_config", &self.http_config)
            .finish()
    }
}
