use crate::client::{BufferedService, map_buffer_error, try_acquire_buffer_slot};
use crate::config::TransportSecurity;
use crate::error::{HttpError, InvalidUriKind};
use crate::response::{HttpResponse, ResponseBody};
use bytes::{Bytes, BytesMut};
use common_multipart_rfc7578::client::multipart::{Body as MultipartBody, Form};
use futures_util::TryStreamExt;
use http::{Request, Response};
use http_body_util::Full;
use serde::Serialize;
use tower::Service;

/// Body type for the request builder
#[derive(Clone, Debug)]
enum BodyKind {
    Empty,
    Json(Bytes),
    Form(Bytes),
    /// Encoded multipart body plus its `Content-Type` (carries the boundary)
    Multipart { body: Bytes, content_type: String },
}

/// HTTP request builder with fluent API
///
/// Created by [`HttpClient::get`](crate::HttpClient::get),
/// [`HttpClient::post`](crate::HttpClient::post), etc.
///
/// Query strings are not composed here. Build the URL with `url::Url` and
/// pass the final string.
///
/// ```ignore
/// let resp = client
///     .post("https://api.example.com/alpha/v1.0/collectors")
///     .header("REALM", account_id)
///     .json(&body)?
///     .send()
///     .await?;
/// ```
#[must_use = "RequestBuilder does nothing until .send() is called"]
pub struct RequestBuilder {
    service: BufferedService,
    max_body_size: usize,
    method: http::Method,
    url: String,
    headers: Vec<(http::header::HeaderName, http::header::HeaderValue)>,
    body: BodyKind,
    /// Error captured during building (deferred to `send()`)
    error: Option<HttpError>,
    transport_security: TransportSecurity,
}

impl RequestBuilder {
    pub(crate) fn new(
        service: BufferedService,
        max_body_size: usize,
        method: http::Method,
        url: String,
        transport_security: TransportSecurity,
    ) -> Self {
        Self {
            service,
            max_body_size,
            method,
            url,
            headers: Vec::new(),
            body: BodyKind::Empty,
            error: None,
            transport_security,
        }
    }

    /// Add a single header to the request
    ///
    /// An invalid name or value is remembered and reported by `send()`.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if self.error.is_some() {
            return self;
        }

        match (
            http::header::HeaderName::try_from(name),
            http::header::HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => self.headers.push((name, value)),
            (Err(e), _) => self.error = Some(HttpError::InvalidHeaderName(e)),
            (_, Err(e)) => self.error = Some(HttpError::InvalidHeaderValue(e)),
        }
        self
    }

    /// Add a header whose value must not show up in `Debug` output or logs
    pub fn sensitive_header(mut self, name: &str, value: &str) -> Self {
        let before = self.headers.len();
        self = self.header(name, value);
        if self.headers.len() > before
            && let Some((_, value)) = self.headers.last_mut()
        {
            value.set_sensitive(true);
        }
        self
    }

    /// Set request body as JSON
    ///
    /// Sets `Content-Type: application/json` unless the caller provided one.
    ///
    /// # Errors
    ///
    /// Returns `Err(HttpError::Json)` if serialization fails.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let json_bytes = serde_json::to_vec(body)?;
        self.body = BodyKind::Json(Bytes::from(json_bytes));
        Ok(self)
    }

    /// Set request body as form URL-encoded
    ///
    /// Sets `Content-Type: application/x-www-form-urlencoded` unless the
    /// caller provided one.
    ///
    /// # Errors
    ///
    /// Returns `Err(HttpError::FormEncode)` if encoding fails.
    pub fn form(mut self, fields: &[(&str, &str)]) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let form_string = serde_urlencoded::to_string(fields)?;
        self.body = BodyKind::Form(Bytes::from(form_string));
        Ok(self)
    }

    /// Set request body as `multipart/form-data`
    ///
    /// The form is encoded in full before sending. The `Content-Type` (with
    /// boundary) always comes from the form; a caller-provided one is dropped
    /// because it could not carry the right boundary.
    ///
    /// # Errors
    ///
    /// Returns `Err(HttpError::Multipart)` if a part cannot be read.
    pub async fn multipart(mut self, form: Form<'_>) -> Result<Self, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let content_type = form.content_type();
        let mut stream = std::pin::pin!(MultipartBody::from(form));
        let mut encoded = BytesMut::new();
        while let Some(chunk) = stream
            .try_next()
            .await
            .map_err(|e| HttpError::Multipart(e.to_string()))?
        {
            encoded.extend_from_slice(&chunk);
        }

        self.headers
            .retain(|(name, _)| name != http::header::CONTENT_TYPE);
        self.body = BodyKind::Multipart {
            body: encoded.freeze(),
            content_type,
        };
        Ok(self)
    }

    /// Validate URL and scheme against the transport security configuration.
    fn validate_url(&self) -> Result<http::Uri, HttpError> {
        let uri: http::Uri =
            self.url
                .parse()
                .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
                    url: self.url.clone(),
                    kind: InvalidUriKind::ParseError,
                    reason: e.to_string(),
                })?;

        if uri.authority().is_none() {
            return Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingAuthority,
                reason: "missing host/authority".to_owned(),
            });
        }

        match uri.scheme_str() {
            Some("https") => Ok(uri),
            Some("http") => match self.transport_security {
                TransportSecurity::AllowInsecureHttp => Ok(uri),
                TransportSecurity::TlsOnly => Err(HttpError::InvalidScheme {
                    scheme: "http".to_owned(),
                    reason: "HTTPS required (transport security is TlsOnly)".to_owned(),
                }),
            },
            Some(scheme) => Err(HttpError::InvalidScheme {
                scheme: scheme.to_owned(),
                reason: "only http:// and https:// schemes are supported".to_owned(),
            }),
            None => Err(HttpError::InvalidUri {
                url: self.url.clone(),
                kind: InvalidUriKind::MissingScheme,
                reason: "missing scheme".to_owned(),
            }),
        }
    }

    /// Send the request and return the response
    ///
    /// Every HTTP status, including 4xx and 5xx, is returned as `Ok`.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` if:
    /// - Request building failed (invalid headers, URL, etc.)
    /// - URL scheme is invalid for the transport security mode
    /// - Network/transport error or timeout
    /// - The request queue is full (`Overloaded`)
    pub async fn send(mut self) -> Result<HttpResponse, HttpError> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }

        let uri = self.validate_url()?;
        let mut builder = Request::builder().method(self.method).uri(uri);

        let has_content_type = self
            .headers
            .iter()
            .any(|(name, _)| name == http::header::CONTENT_TYPE);
        let default_content_type = match &self.body {
            BodyKind::Json(_) => Some("application/json"),
            BodyKind::Form(_) => Some("application/x-www-form-urlencoded"),
            BodyKind::Multipart { content_type, .. } => Some(content_type.as_str()),
            BodyKind::Empty => None,
        };
        if !has_content_type && let Some(content_type) = default_content_type {
            builder = builder.header(http::header::CONTENT_TYPE, content_type);
        }

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        let body_bytes = match self.body {
            BodyKind::Empty => Bytes::new(),
            BodyKind::Json(b) | BodyKind::Form(b) => b,
            BodyKind::Multipart { body, .. } => body,
        };

        let request = builder.body(Full::new(body_bytes))?;

        try_acquire_buffer_slot(&mut self.service).await?;

        let inner: Response<ResponseBody> =
            self.service.call(request).await.map_err(map_buffer_error)?;

        Ok(HttpResponse {
            inner,
            max_body_size: self.max_body_size,
        })
    }
}
