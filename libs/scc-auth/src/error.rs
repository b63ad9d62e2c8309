use thiserror::Error;

/// Errors returned by the IAM apikey token exchange.
///
/// No variant ever carries the API key or a token value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Transport failure while talking to the token endpoint.
    ///
    /// The message comes from
    /// [`format_http_error`](crate::http_error::format_http_error).
    #[error("{0}")]
    Http(String),

    /// The token endpoint answered with a non-2xx status (bad API key,
    /// disabled account, ...).
    #[error("IAM token request rejected: HTTP {status}")]
    Rejected { status: http::StatusCode },

    /// The token endpoint returned an unparseable or incomplete response.
    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    /// The token endpoint returned a `token_type` that is not `Bearer`.
    #[error("unsupported token type: {0}")]
    UnsupportedTokenType(String),

    /// The token expired before it was used.
    #[error("access token expired at {0}")]
    Expired(time::OffsetDateTime),

    /// The auth configuration is incomplete.
    #[error("IAM config error: {0}")]
    ConfigError(String),
}
