//! Error types for the Posture Management client.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`PostureManagementClient`](crate::PostureManagementClient)
/// operations.
///
/// Every HTTP status is delivered as `Ok(DetailedResponse)` by the operations
/// themselves; `Api` is produced when a caller turns a response into a result
/// with [`DetailedResponse::into_result`](crate::DetailedResponse::into_result)
/// or [`DetailedResponse::expect_status`](crate::DetailedResponse::expect_status).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SccError {
    /// Network, DNS, TLS or timeout failure. No partial result exists.
    #[error("transport error: {0}")]
    Transport(#[from] scc_http::HttpError),

    /// Bad credentials, rejected IAM exchange or expired token.
    #[error("authentication failed: {0}")]
    Auth(#[from] scc_auth::AuthError),

    /// The API answered with a status the caller did not accept.
    #[error("API returned HTTP {status}: {body}")]
    Api {
        status: http::StatusCode,
        body: String,
    },

    /// Local input is missing or malformed; nothing was sent.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A 2xx response whose JSON does not match the expected model.
    #[error("failed to decode HTTP {status} response: {source}")]
    Decode {
        status: http::StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

impl SccError {
    /// HTTP status attached to the error, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Api { status, .. } | Self::Decode { status, .. } => Some(*status),
            Self::Transport(_) | Self::Auth(_) | Self::Validation(_) => None,
        }
    }
}

/// Invalid local input detected before any request is sent.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A credential or PEM file could not be read.
    #[error("cannot read {} file '{}': {}", .field, .path.display(), .source)]
    UnreadableFile {
        field: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// One or more ids are not numeric. `invalid` lists every bad entry.
    #[error("invalid {}: {}", .field, .invalid.join(", "))]
    InvalidIds {
        field: &'static str,
        invalid: Vec<String>,
    },

    /// A required field is empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// The API base URL is unusable.
    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Fail with [`ValidationError::EmptyField`] if `value` is blank.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn invalid_ids_lists_every_entry() {
        let e = ValidationError::InvalidIds {
            field: "gateway_ids",
            invalid: vec!["abc".into(), "1x".into()],
        };
        assert_eq!(e.to_string(), "invalid gateway_ids: abc, 1x");
    }

    #[test]
    fn unreadable_file_names_path() {
        let e = ValidationError::UnreadableFile {
            field: "credential_data_file",
            path: PathBuf::from("/nope/cred.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let msg = e.to_string();
        assert!(msg.contains("/nope/cred.json"), "got: {msg}");
        assert!(msg.contains("credential_data_file"), "got: {msg}");
    }

    #[test]
    fn api_error_renders_status_and_body() {
        let e = SccError::Api {
            status: http::StatusCode::BAD_REQUEST,
            body: r#"{"message":"bad collector"}"#.into(),
        };
        assert_eq!(
            e.to_string(),
            r#"API returned HTTP 400 Bad Request: {"message":"bad collector"}"#
        );
        assert_eq!(e.status(), Some(http::StatusCode::BAD_REQUEST));
    }

    #[test]
    fn require_non_empty_rejects_blank() {
        assert!(require_non_empty("scope_name", "x").is_ok());
        assert!(matches!(
            require_non_empty("scope_name", "  "),
            Err(ValidationError::EmptyField("scope_name"))
        ));
    }
}
