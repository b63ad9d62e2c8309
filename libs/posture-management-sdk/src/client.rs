use std::io::Cursor;
use std::path::Path;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use scc_auth::AccessToken;
use scc_http::{HttpClient, HttpClientBuilder, HttpClientConfig, MultipartForm, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::cleanup::{DeleteOutcome, ResourceKind};
use crate::discovery::DiscoveryRequest;
use crate::error::{SccError, ValidationError, require_non_empty};
use crate::models::{
    Collector, Credential, ProfileList, ScanSummaryList, Scope, ScopeList, ValidationScanReply,
};
use crate::options::{
    CreateCollectorOptions, CreateCredentialOptions, CreateScopeOptions,
    CreateValidationScanOptions, ScanSummariesOptions,
};
use crate::response::{DetailedResponse, api_error};

/// Path prefix of every Posture Management endpoint.
pub const API_VERSION_PATH: [&str; 2] = ["alpha", "v1.0"];

/// Account header required by the API.
pub const REALM_HEADER: &str = "REALM";

/// Per-request correlation header; a fresh UUIDv4 is sent on every call.
pub const TRANSACTION_ID_HEADER: &str = "transaction-id";

/// Client for the Posture Management REST API.
///
/// Build once with [`PostureManagementClient::builder`] and reuse. Cloning is
/// cheap and shares the connection pool.
///
/// Every operation takes the [`AccessToken`] explicitly and returns
/// `Ok(DetailedResponse)` for every HTTP status; see [`SccError`] for what
/// becomes an error.
#[derive(Debug, Clone)]
pub struct PostureManagementClient {
    http: HttpClient,
    base_url: Url,
    account_id: String,
}

impl PostureManagementClient {
    #[must_use]
    pub fn builder() -> PostureManagementClientBuilder {
        PostureManagementClientBuilder::default()
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Register a collector. The API answers 201 on success.
    ///
    /// # Errors
    ///
    /// [`SccError::Validation`] for an empty name, [`SccError::Transport`] on
    /// network failure, [`SccError::Decode`] for an unexpected 2xx body.
    pub async fn create_collector(
        &self,
        token: &AccessToken,
        options: &CreateCollectorOptions,
    ) -> Result<DetailedResponse<Collector>, SccError> {
        let body = options.to_body()?;
        let url = self.endpoint(&["collectors"])?;
        let request = self.request(http::Method::POST, &url, token)?.json(&body)?;
        self.execute("create_collector", request).await
    }

    /// Upload a credential file, and optionally a PEM file, as
    /// `multipart/form-data`. The API answers 201 on success.
    ///
    /// # Errors
    ///
    /// [`SccError::Validation`] naming the path if a file cannot be read.
    pub async fn create_credential(
        &self,
        token: &AccessToken,
        options: &CreateCredentialOptions,
    ) -> Result<DetailedResponse<Credential>, SccError> {
        let credential =
            read_part_file("credential_data_file", options.credential_path()).await?;
        let mut form = MultipartForm::default();
        form.add_reader_file_with_mime(
            "credential_data_file",
            Cursor::new(credential),
            file_name_of(options.credential_path(), "credential.json"),
            mime::APPLICATION_JSON,
        );
        if let Some(pem_path) = options.pem() {
            let pem = read_part_file("pem_file", pem_path).await?;
            form.add_reader_file_with_mime(
                "pem_file",
                Cursor::new(pem),
                file_name_of(pem_path, "key.pem"),
                mime::TEXT_PLAIN,
            );
        }

        let url = self.endpoint(&["credentials"])?;
        let request = self
            .request(http::Method::POST, &url, token)?
            .multipart(form)
            .await?;
        self.execute("create_credential", request).await
    }

    /// Create a scope over existing collectors and a credential.
    ///
    /// Referenced ids are not checked locally; unknown ids surface as a
    /// non-2xx status.
    ///
    /// # Errors
    ///
    /// [`SccError::Validation`] for an empty name, credential id or collector
    /// list.
    pub async fn create_scope(
        &self,
        token: &AccessToken,
        options: &CreateScopeOptions,
    ) -> Result<DetailedResponse<Scope>, SccError> {
        let body = options.to_body()?;
        let url = self.endpoint(&["schemas"])?;
        let request = self.request(http::Method::POST, &url, token)?.json(&body)?;
        self.execute("create_scope", request).await
    }

    /// List all scopes of the account.
    ///
    /// # Errors
    ///
    /// [`SccError::Transport`] or [`SccError::Decode`].
    pub async fn list_scopes(
        &self,
        token: &AccessToken,
    ) -> Result<DetailedResponse<ScopeList>, SccError> {
        let url = self.endpoint(&["schemas"])?;
        let request = self.request(http::Method::GET, &url, token)?;
        self.execute("list_scopes", request).await
    }

    /// List the compliance profiles available to the account.
    ///
    /// # Errors
    ///
    /// [`SccError::Transport`] or [`SccError::Decode`].
    pub async fn list_profiles(
        &self,
        token: &AccessToken,
    ) -> Result<DetailedResponse<ProfileList>, SccError> {
        let url = self.endpoint(&["profiles"])?;
        let request = self.request(http::Method::GET, &url, token)?;
        self.execute("list_profiles", request).await
    }

    /// Trigger top-level discovery for a scope. The API answers 200.
    ///
    /// The reply body has no fixed shape and is kept as JSON.
    ///
    /// # Errors
    ///
    /// [`SccError::Transport`] or [`SccError::Decode`].
    pub async fn create_discovery(
        &self,
        token: &AccessToken,
        request: &DiscoveryRequest,
    ) -> Result<DetailedResponse<serde_json::Value>, SccError> {
        let url = self.endpoint(&["schemas", "tldiscover"])?;
        let builder = self.request(http::Method::POST, &url, token)?.json(request)?;
        self.execute("create_discovery", builder).await
    }

    /// Start a validation scan of a scope against a profile.
    ///
    /// # Errors
    ///
    /// [`SccError::Validation`] for an empty scope or profile id.
    pub async fn create_validation_scan(
        &self,
        token: &AccessToken,
        options: &CreateValidationScanOptions,
    ) -> Result<DetailedResponse<ValidationScanReply>, SccError> {
        options.validate()?;
        let url = self.endpoint(&["scans", "validation"])?;
        let request = self
            .request(http::Method::POST, &url, token)?
            .json(options)?;
        self.execute("create_validation_scan", request).await
    }

    /// Scan summaries for a scope, optionally narrowed by profile.
    ///
    /// # Errors
    ///
    /// [`SccError::Validation`] for an empty scope id.
    pub async fn scan_summaries(
        &self,
        token: &AccessToken,
        options: &ScanSummariesOptions,
    ) -> Result<DetailedResponse<ScanSummaryList>, SccError> {
        let pairs = options.query_pairs()?;
        let mut url = self.endpoint(&["scans", "summaries"])?;
        url.query_pairs_mut().extend_pairs(pairs);
        let request = self.request(http::Method::GET, &url, token)?;
        self.execute("scan_summaries", request).await
    }

    /// Permanently delete a collector or scope.
    ///
    /// A 2xx status is [`DeleteOutcome::Deleted`]; 404 is
    /// [`DeleteOutcome::AlreadyAbsent`], so repeating a delete is safe.
    ///
    /// # Errors
    ///
    /// [`SccError::Api`] for any other status, [`SccError::Validation`] for
    /// an empty id, [`SccError::Transport`] on network failure.
    pub async fn hard_delete(
        &self,
        token: &AccessToken,
        kind: ResourceKind,
        id: &str,
    ) -> Result<DeleteOutcome, SccError> {
        require_non_empty(kind.id_field(), id)?;
        let url = self.endpoint(&[kind.path_segment(), id])?;
        let request = self.request(http::Method::DELETE, &url, token)?;
        // Only the status decides; the reply body is never decoded.
        let (status, _, body) = self.send("hard_delete", request).await?;

        if status.is_success() {
            Ok(DeleteOutcome::Deleted(status))
        } else if status == StatusCode::NOT_FOUND {
            tracing::info!(kind = %kind, id, "resource already absent");
            Ok(DeleteOutcome::AlreadyAbsent(status))
        } else {
            Err(api_error(status, &body))
        }
    }

    /// `{base}/alpha/v1.0/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SccError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ValidationError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_owned(),
            })?
            .pop_if_empty()
            .extend(API_VERSION_PATH)
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: http::Method,
        url: &Url,
        token: &AccessToken,
    ) -> Result<PreparedRequest, SccError> {
        if token.is_expired() {
            return Err(scc_auth::AuthError::Expired(token.expires_at()).into());
        }

        let transaction_id = Uuid::new_v4().to_string();
        let builder = self
            .http
            .request(method.clone(), url.as_str())
            .sensitive_header("authorization", &token.authorization_value())
            .header(REALM_HEADER, &self.account_id)
            .header(TRANSACTION_ID_HEADER, &transaction_id)
            .header("accept", "application/json");

        Ok(PreparedRequest {
            builder,
            method,
            path: url.path().to_owned(),
            transaction_id,
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: PreparedRequest,
    ) -> Result<DetailedResponse<T>, SccError> {
        let (status, headers, body) = self.send(operation, request).await?;
        DetailedResponse::from_parts(status, headers, body)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: PreparedRequest,
    ) -> Result<(StatusCode, HeaderMap, Bytes), SccError> {
        let PreparedRequest {
            builder,
            method,
            path,
            transaction_id,
        } = request;

        let response = builder.send().await.inspect_err(|e| {
            tracing::debug!(
                operation,
                %method,
                path,
                transaction_id,
                error = %e,
                "request failed before a response"
            );
        })?;
        let (status, headers, body) = response.into_parts().await?;

        tracing::debug!(
            operation,
            %method,
            path,
            transaction_id,
            status = status.as_u16(),
            body_len = body.len(),
            "API response received"
        );

        Ok((status, headers, body))
    }
}

/// A request with the common headers set, plus what is logged about it.
struct PreparedRequest {
    builder: RequestBuilder,
    method: http::Method,
    path: String,
    transaction_id: String,
}

impl PreparedRequest {
    fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, SccError> {
        self.builder = self.builder.json(body)?;
        Ok(self)
    }

    async fn multipart(mut self, form: MultipartForm<'_>) -> Result<Self, SccError> {
        self.builder = self.builder.multipart(form).await?;
        Ok(self)
    }
}

async fn read_part_file(field: &'static str, path: &Path) -> Result<Vec<u8>, ValidationError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| ValidationError::UnreadableFile {
            field,
            path: path.to_path_buf(),
            source,
        })
}

fn file_name_of(path: &Path, fallback: &str) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(fallback)
        .to_owned()
}

/// Builder for [`PostureManagementClient`].
#[derive(Debug, Default)]
pub struct PostureManagementClientBuilder {
    base_url: Option<String>,
    account_id: Option<String>,
    http_config: Option<HttpClientConfig>,
    http_client: Option<HttpClient>,
}

impl PostureManagementClientBuilder {
    /// API base URL, e.g. `https://asap.compliance.cloud.ibm.com`.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Account id sent in the `REALM` header.
    #[must_use]
    pub fn account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// HTTP settings used to build an internal client.
    #[must_use]
    pub fn http_config(mut self, config: HttpClientConfig) -> Self {
        self.http_config = Some(config);
        self
    }

    /// Use an already built client; takes precedence over `http_config`.
    #[must_use]
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the client. Must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// [`SccError::Validation`] if the base URL or account id is missing or
    /// unusable, [`SccError::Transport`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<PostureManagementClient, SccError> {
        let raw_url = self.base_url.unwrap_or_default();
        require_non_empty("base_url", &raw_url)?;
        let base_url = Url::parse(raw_url.trim()).map_err(|e| ValidationError::InvalidBaseUrl {
            url: raw_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidBaseUrl {
                url: raw_url,
                reason: "expected an http(s) URL".to_owned(),
            }
            .into());
        }

        let account_id = self.account_id.unwrap_or_default();
        require_non_empty("account_id", &account_id)?;

        let http = match self.http_client {
            Some(client) => client,
            None => {
                HttpClientBuilder::with_config(self.http_config.unwrap_or_default()).build()?
            }
        };

        Ok(PostureManagementClient {
            http,
            base_url,
            account_id,
        })
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    async fn client(base: &str) -> PostureManagementClient {
        PostureManagementClient::builder()
            .base_url(base)
            .account_id("acc-1")
            .http_config(HttpClientConfig::for_testing())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn endpoint_appends_version_prefix() {
        let c = client("https://asap.example.com").await;
        assert_eq!(
            c.endpoint(&["schemas", "tldiscover"]).unwrap().as_str(),
            "https://asap.example.com/alpha/v1.0/schemas/tldiscover"
        );
    }

    #[tokio::test]
    async fn endpoint_keeps_base_path_and_trailing_slash() {
        let c = client("https://gw.example.com/posture/").await;
        assert_eq!(
            c.endpoint(&["collectors"]).unwrap().as_str(),
            "https://gw.example.com/posture/alpha/v1.0/collectors"
        );
    }

    #[tokio::test]
    async fn endpoint_encodes_ids() {
        let c = client("https://asap.example.com").await;
        assert_eq!(
            c.endpoint(&["collectors", "a/b"]).unwrap().as_str(),
            "https://asap.example.com/alpha/v1.0/collectors/a%2Fb"
        );
    }

    #[tokio::test]
    async fn builder_requires_account_id() {
        let err = PostureManagementClient::builder()
            .base_url("https://asap.example.com")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SccError::Validation(ValidationError::EmptyField("account_id"))
        ));
    }

    #[tokio::test]
    async fn builder_rejects_non_http_url() {
        let err = PostureManagementClient::builder()
            .base_url("mailto:ops@example.com")
            .account_id("acc")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            SccError::Validation(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[tokio::test]
    async fn expired_token_rejected_before_sending() {
        let c = client("http://127.0.0.1:1").await;
        let token = AccessToken::new(
            "t",
            "Bearer",
            time::OffsetDateTime::now_utc() - time::Duration::minutes(1),
        );
        let err = c.list_profiles(&token).await.unwrap_err();
        assert!(matches!(
            err,
            SccError::Auth(scc_auth::AuthError::Expired(_))
        ));
    }

    #[test]
    fn file_name_falls_back() {
        assert_eq!(file_name_of(Path::new("/x/cred.json"), "f"), "cred.json");
        assert_eq!(file_name_of(Path::new("/"), "f"), "f");
    }
}
