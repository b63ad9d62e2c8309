/// Render an [`scc_http::HttpError`] as a message prefixed with the caller
/// context (e.g. `"IAM token"`).
///
/// `HttpStatus` keeps only the status code; response bodies from the token
/// endpoint are never copied into errors or logs.
#[must_use]
pub fn format_http_error(e: &scc_http::HttpError, prefix: &str) -> String {
    use scc_http::HttpError;

    match e {
        HttpError::HttpStatus { status, .. } => format!("{prefix} HTTP {status}"),
        HttpError::Json(err) => format!("{prefix} JSON parse failed: {err}"),
        HttpError::Timeout(duration) => {
            format!("{prefix} request timed out after {duration:?}")
        }
        HttpError::Transport(err) => format!("{prefix} transport error: {err}"),
        HttpError::BodyTooLarge { limit, actual } => {
            format!("{prefix} response too large: limit {limit} bytes, got {actual} bytes")
        }
        HttpError::Tls(err) => format!("{prefix} TLS error: {err}"),
        HttpError::RequestBuild(err) => format!("{prefix} request build failed: {err}"),
        HttpError::InvalidHeaderName(err) => format!("{prefix} invalid header name: {err}"),
        HttpError::InvalidHeaderValue(_) => format!("{prefix} invalid header value"),
        HttpError::FormEncode(err) => format!("{prefix} form encode error: {err}"),
        HttpError::Overloaded => format!("{prefix} request rejected: client overloaded"),
        HttpError::ServiceClosed => format!("{prefix} HTTP client unavailable"),
        HttpError::InvalidUri { url, reason, .. } => {
            format!("{prefix} invalid URL '{url}': {reason}")
        }
        HttpError::InvalidScheme { scheme, reason } => {
            format!("{prefix} invalid scheme '{scheme}': {reason}")
        }
        _ => format!("{prefix} request failed"),
    }
}
