use std::fmt;

use serde::Deserialize;
use time::OffsetDateTime;
use zeroize::Zeroizing;

use crate::secret::SecretString;

/// Bearer token obtained from IAM.
///
/// Passed by reference into every API call. `Debug` never shows the token.
#[derive(Clone)]
pub struct AccessToken {
    token: SecretString,
    token_type: String,
    expires_at: OffsetDateTime,
}

impl AccessToken {
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            token: SecretString::new(token),
            token_type: token_type.into(),
            expires_at,
        }
    }

    /// A `Bearer` token valid for `ttl` from now.
    #[must_use]
    pub fn bearer(token: impl Into<String>, ttl: std::time::Duration) -> Self {
        Self::new(token, "Bearer", OffsetDateTime::now_utc() + ttl)
    }

    /// The raw token value. Do not log it.
    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        OffsetDateTime::now_utc() >= self.expires_at
    }

    /// Value for the `Authorization` header, e.g. `Bearer eyJ...`.
    ///
    /// Zeroed when dropped.
    #[must_use]
    pub fn authorization_value(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("{} {}", self.token_type, self.token.expose()))
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// IAM token endpoint response.
///
/// `Deserialize`-only so tokens cannot be serialized back out by accident.
/// `refresh_token` and `scope` are accepted but unused.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Absolute expiry as unix seconds.
    #[serde(default)]
    pub expiration: Option<i64>,
}
