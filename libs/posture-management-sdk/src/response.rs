use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::SccError;

/// Longest body excerpt copied into [`SccError::Api`].
const API_ERROR_BODY_LIMIT: usize = scc_http::ERROR_BODY_PREVIEW_LIMIT;

/// Full outcome of one API call: status, headers, raw body and, for a 2xx
/// JSON body, the parsed model.
///
/// Produced for every HTTP status. Use [`into_result`](Self::into_result) or
/// [`expect_status`](Self::expect_status) to turn unwanted statuses into
/// [`SccError::Api`].
#[derive(Debug, Clone)]
pub struct DetailedResponse<T> {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    result: Option<T>,
}

impl<T: DeserializeOwned> DetailedResponse<T> {
    /// Build a response, parsing the body when the status is 2xx, the body is
    /// non-empty and `Content-Type` names JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SccError::Decode`] if a 2xx JSON body does not match `T`.
    pub fn from_parts(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    ) -> Result<Self, SccError> {
        let result = if status.is_success() && is_json_body(&headers, &body) {
            Some(
                serde_json::from_slice(&body)
                    .map_err(|source| SccError::Decode { status, source })?,
            )
        } else {
            None
        };

        Ok(Self {
            status,
            headers,
            body,
            result,
        })
    }
}

impl<T> DetailedResponse<T> {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parsed model, present only for a 2xx JSON body.
    #[must_use]
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Value of the `transaction-id` header echoed by the server, if any.
    #[must_use]
    pub fn transaction_id(&self) -> Option<&str> {
        self.headers
            .get("transaction-id")
            .and_then(|v| v.to_str().ok())
    }

    /// Keep the response only if its status is one of `accepted`.
    ///
    /// # Errors
    ///
    /// Returns [`SccError::Api`] with the status and body otherwise.
    pub fn expect_status(self, accepted: &[StatusCode]) -> Result<Self, SccError> {
        if accepted.contains(&self.status) {
            Ok(self)
        } else {
            Err(self.into_api_error())
        }
    }

    /// Parsed model of a 2xx response.
    ///
    /// `Ok(None)` means a 2xx response without a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SccError::Api`] for a non-2xx status.
    pub fn into_result(self) -> Result<Option<T>, SccError> {
        if self.status.is_success() {
            Ok(self.result)
        } else {
            Err(self.into_api_error())
        }
    }

    fn into_api_error(self) -> SccError {
        api_error(self.status, &self.body)
    }
}

/// [`SccError::Api`] carrying a bounded excerpt of `body`.
pub(crate) fn api_error(status: StatusCode, body: &Bytes) -> SccError {
    let end = body.len().min(API_ERROR_BODY_LIMIT);
    SccError::Api {
        status,
        body: String::from_utf8_lossy(&body[..end]).into_owned(),
    }
}

fn is_json_body(headers: &HeaderMap, body: &Bytes) -> bool {
    if body.iter().all(u8::is_ascii_whitespace) {
        return false;
    }
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}
