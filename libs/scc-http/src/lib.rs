#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the SCC Posture Management client
//!
//! This crate provides a hyper-based HTTP client with:
//! - Automatic TLS via rustls (HTTPS only by default)
//! - An explicit, bounded per-request timeout
//! - Default header injection (`User-Agent`, `Accept`)
//! - Transparent response decompression (gzip, brotli, deflate)
//! - JSON, form URL-encoded and `multipart/form-data` request bodies
//!
//! Requests are never retried. `send()` returns `Ok` for every HTTP status;
//! only transport failures (connect, DNS, TLS, timeout) surface as errors.
//!
//! # Example
//!
//! ```ignore
//! use scc_http::HttpClient;
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let resp = client
//!     .post("https://iam.cloud.ibm.com/identity/token")
//!     .form(&[("grant_type", "urn:ibm:params:oauth:grant-type:apikey")])?
//!     .send()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod headers;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{DEFAULT_USER_AGENT, HttpClientConfig, TlsRootConfig, TransportSecurity};
pub use common_multipart_rfc7578::client::multipart::Form as MultipartForm;
pub use error::{HttpError, InvalidUriKind};
pub use headers::{DefaultHeadersLayer, DefaultHeadersService};
pub use request::RequestBuilder;
pub use response::{ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody};
