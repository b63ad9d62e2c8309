#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Client for the IBM Cloud Security and Compliance Center Posture
//! Management API.
//!
//! Build a [`PostureManagementClient`] once, obtain an
//! [`AccessToken`](scc_auth::AccessToken) with
//! [`scc_auth::IamTokenSource`], and pass the token to every call:
//!
//! ```ignore
//! let client = PostureManagementClient::builder()
//!     .base_url(api_url)
//!     .account_id(account_id)
//!     .build()?;
//! let token = scc_auth::get_token(&api_key, &iam_url).await?;
//!
//! let collector = client
//!     .create_collector(&token, &CreateCollectorOptions::new("test-1"))
//!     .await?
//!     .expect_status(&[StatusCode::CREATED])?;
//! ```
//!
//! Operations return a [`DetailedResponse`] for every HTTP status; only
//! transport, auth, validation and decode failures are errors.

pub mod cleanup;
pub mod client;
pub mod discovery;
pub mod error;
pub mod models;
pub mod options;
pub mod response;

pub use cleanup::{
    CleanupEntry, CleanupReport, CreatedResources, DeleteOutcome, ResourceKind, cleanup,
};
pub use client::{
    API_VERSION_PATH, PostureManagementClient, PostureManagementClientBuilder, REALM_HEADER,
    TRANSACTION_ID_HEADER,
};
pub use discovery::{DEFAULT_DISCOVERY_LEVEL, DiscoveryRequest, RequestType, parse_gateway_ids};
pub use error::{SccError, ValidationError};
pub use models::{
    Collector, Credential, Profile, ProfileList, ScanSummary, ScanSummaryList, Scope, ScopeList,
    ValidationScanReply,
};
pub use options::{
    CreateCollectorOptions, CreateCredentialOptions, CreateScopeOptions,
    CreateValidationScanOptions, ScanSummariesOptions,
};
pub use response::DetailedResponse;
