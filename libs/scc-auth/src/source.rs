use std::time::Duration;

use time::OffsetDateTime;
use url::Url;
use zeroize::Zeroizing;

use crate::config::IamAuthConfig;
use crate::error::AuthError;
use crate::http_error::format_http_error;
use crate::secret::SecretString;
use crate::token::{AccessToken, TokenResponse};

/// `grant_type` for exchanging an IBM Cloud API key.
pub const IAM_APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

const RESPONSE_TYPE: &str = "cloud_iam";
const ERROR_PREFIX: &str = "IAM token";

/// Exchanges an API key for an [`AccessToken`] using `scc-http`.
///
/// Every call to [`request_token`](Self::request_token) performs exactly one
/// HTTP exchange. There is no cache and no retry.
pub struct IamTokenSource {
    client: scc_http::HttpClient,
    url: Url,
    api_key: SecretString,
    default_ttl: Duration,
}

impl IamTokenSource {
    /// Build a token source from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ConfigError`] if the config does not validate and
    /// [`AuthError::Http`] if the HTTP client fails to build.
    pub fn new(config: &IamAuthConfig) -> Result<Self, AuthError> {
        config.validate()?;
        let url = config
            .url
            .clone()
            .ok_or_else(|| AuthError::ConfigError("url is required".into()))?;

        let http_config = config
            .http_config
            .clone()
            .unwrap_or_else(scc_http::HttpClientConfig::token_endpoint);

        let client = scc_http::HttpClientBuilder::with_config(http_config)
            .build()
            .map_err(|e| AuthError::Http(format_http_error(&e, ERROR_PREFIX)))?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            default_ttl: config.default_ttl,
        })
    }

    /// Exchange the API key for a fresh token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Http`] on transport failure or timeout
    /// - [`AuthError::Rejected`] on a non-2xx status
    /// - [`AuthError::InvalidResponse`] on malformed JSON, an empty
    ///   `access_token`, or an out-of-range `expiration`
    /// - [`AuthError::UnsupportedTokenType`] if `token_type` is not `Bearer`
    pub async fn request_token(&self) -> Result<AccessToken, AuthError> {
        let api_key = Zeroizing::new(self.api_key.expose().to_owned());
        let fields: [(&str, &str); 3] = [
            ("grant_type", IAM_APIKEY_GRANT_TYPE),
            ("apikey", api_key.as_str()),
            ("response_type", RESPONSE_TYPE),
        ];

        tracing::debug!(url = %self.url, "requesting IAM access token");

        let response = self
            .client
            .post(self.url.as_str())
            .header("accept", "application/json")
            .form(&fields)
            .map_err(|e| AuthError::Http(format_http_error(&e, ERROR_PREFIX)))?
            .send()
            .await
            .map_err(|e| AuthError::Http(format_http_error(&e, ERROR_PREFIX)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "IAM token request rejected");
            return Err(AuthError::Rejected { status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Http(format_http_error(&e, ERROR_PREFIX)))?;
        let token_resp: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("malformed JSON: {e}")))?;

        let token = self.build_access_token(token_resp, OffsetDateTime::now_utc())?;
        tracing::debug!(expires_at = %token.expires_at(), "IAM access token acquired");
        Ok(token)
    }

    fn build_access_token(
        &self,
        resp: TokenResponse,
        now: OffsetDateTime,
    ) -> Result<AccessToken, AuthError> {
        if resp.access_token.trim().is_empty() {
            return Err(AuthError::InvalidResponse("empty access_token".into()));
        }

        let token_type = resp.token_type.unwrap_or_else(|| "Bearer".to_owned());
        if !token_type.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::UnsupportedTokenType(token_type));
        }

        let expires_at = expiry(resp.expiration, resp.expires_in, self.default_ttl, now)?;
        Ok(AccessToken::new(resp.access_token, "Bearer", expires_at))
    }
}

impl std::fmt::Debug for IamTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamTokenSource")
            .field("url", &self.url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

/// Expiry from `expiration` if present, else `now + expires_in`, else
/// `now + default_ttl`.
fn expiry(
    expiration: Option<i64>,
    expires_in: Option<u64>,
    default_ttl: Duration,
    now: OffsetDateTime,
) -> Result<OffsetDateTime, AuthError> {
    if let Some(unix) = expiration {
        return OffsetDateTime::from_unix_timestamp(unix)
            .map_err(|e| AuthError::InvalidResponse(format!("expiration out of range: {e}")));
    }

    let lifetime = expires_in.map_or(default_ttl, Duration::from_secs);
    let lifetime = time::Duration::try_from(lifetime).unwrap_or(time::Duration::MAX);
    Ok(now.saturating_add(lifetime))
}

/// One-shot exchange of `api_key` at `auth_url` with default settings.
///
/// # Errors
///
/// Returns [`AuthError::ConfigError`] if `auth_url` does not parse or
/// `api_key` is blank, otherwise the errors of
/// [`IamTokenSource::request_token`].
pub async fn get_token(api_key: &str, auth_url: &str) -> Result<AccessToken, AuthError> {
    let url = Url::parse(auth_url)
        .map_err(|e| AuthError::ConfigError(format!("invalid IAM url '{auth_url}': {e}")))?;
    let config = IamAuthConfig::new(url, SecretString::new(api_key));
    IamTokenSource::new(&config)?.request_token().await
}
