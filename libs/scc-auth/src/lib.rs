#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! IAM authentication for the SCC Posture Management client
//!
//! Exchanges an IBM Cloud API key for a bearer [`AccessToken`] with a single
//! form-encoded POST to the IAM token endpoint. Tokens are neither cached nor
//! refreshed: every [`IamTokenSource::request_token`] call performs one
//! exchange and the caller passes the token explicitly to each API call.
//!
//! ```ignore
//! use scc_auth::get_token;
//!
//! let token = get_token(&api_key, "https://iam.cloud.ibm.com/identity/token").await?;
//! assert_eq!(token.token_type(), "Bearer");
//! ```

pub mod config;
pub mod error;
pub mod http_error;
pub mod secret;
pub mod source;
pub mod token;

pub use config::IamAuthConfig;
pub use error::AuthError;
pub use secret::SecretString;
pub use source::{IAM_APIKEY_GRANT_TYPE, IamTokenSource, get_token};
pub use token::AccessToken;
