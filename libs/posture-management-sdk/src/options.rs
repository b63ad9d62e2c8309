//! Option builders for Posture Management operations.
//!
//! Required fields are constructor arguments; everything else has a setter.

use std::path::{Path, PathBuf};

use scc_auth::SecretString;
use serde::Serialize;

use crate::error::{ValidationError, require_non_empty};

/// Options for `create_collector`.
#[derive(Debug, Clone)]
pub struct CreateCollectorOptions {
    collector_name: String,
    collector_description: Option<String>,
    managed_by: Option<String>,
    is_public: Option<bool>,
    pass_phrase: Option<SecretString>,
}

impl CreateCollectorOptions {
    #[must_use]
    pub fn new(collector_name: impl Into<String>) -> Self {
        Self {
            collector_name: collector_name.into(),
            collector_description: None,
            managed_by: None,
            is_public: None,
            pass_phrase: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.collector_description = Some(description.into());
        self
    }

    /// `"ibm"` or `"customer"`.
    #[must_use]
    pub fn managed_by(mut self, managed_by: impl Into<String>) -> Self {
        self.managed_by = Some(managed_by.into());
        self
    }

    #[must_use]
    pub fn is_public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    #[must_use]
    pub fn pass_phrase(mut self, pass_phrase: SecretString) -> Self {
        self.pass_phrase = Some(pass_phrase);
        self
    }

    #[must_use]
    pub fn collector_name(&self) -> &str {
        &self.collector_name
    }

    pub(crate) fn to_body(&self) -> Result<CreateCollectorBody<'_>, ValidationError> {
        require_non_empty("collector_name", &self.collector_name)?;
        Ok(CreateCollectorBody {
            collector_name: &self.collector_name,
            collector_description: self.collector_description.as_deref(),
            managed_by: self.managed_by.as_deref(),
            is_public: self.is_public,
            pass_phrase: self.pass_phrase.as_ref().map(SecretString::expose),
        })
    }
}

#[derive(Serialize)]
pub(crate) struct CreateCollectorBody<'a> {
    collector_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    collector_description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    managed_by: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pass_phrase: Option<&'a str>,
}

/// Options for `create_credential`.
///
/// Files are read when the operation runs, not here.
#[derive(Debug, Clone)]
pub struct CreateCredentialOptions {
    credential_path: PathBuf,
    pem_path: Option<PathBuf>,
}

impl CreateCredentialOptions {
    /// `credential_path` points at the JSON credential file.
    #[must_use]
    pub fn new(credential_path: impl Into<PathBuf>) -> Self {
        Self {
            credential_path: credential_path.into(),
            pem_path: None,
        }
    }

    /// Attach a PEM file as the `pem_file` part.
    #[must_use]
    pub fn pem_path(mut self, pem_path: impl Into<PathBuf>) -> Self {
        self.pem_path = Some(pem_path.into());
        self
    }

    #[must_use]
    pub fn credential_path(&self) -> &Path {
        &self.credential_path
    }

    #[must_use]
    pub fn pem(&self) -> Option<&Path> {
        self.pem_path.as_deref()
    }
}

/// Options for `create_scope`.
#[derive(Debug, Clone)]
pub struct CreateScopeOptions {
    scope_name: String,
    scope_description: Option<String>,
    collector_ids: Vec<String>,
    credential_id: String,
    environment_type: Option<String>,
}

impl CreateScopeOptions {
    #[must_use]
    pub fn new(
        scope_name: impl Into<String>,
        credential_id: impl Into<String>,
        collector_ids: Vec<String>,
    ) -> Self {
        Self {
            scope_name: scope_name.into(),
            scope_description: None,
            collector_ids,
            credential_id: credential_id.into(),
            environment_type: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.scope_description = Some(description.into());
        self
    }

    /// e.g. `"ibm"`, `"aws"`, `"azure"`, `"on_premise"`.
    #[must_use]
    pub fn environment_type(mut self, environment_type: impl Into<String>) -> Self {
        self.environment_type = Some(environment_type.into());
        self
    }

    #[must_use]
    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    pub(crate) fn to_body(&self) -> Result<CreateScopeBody<'_>, ValidationError> {
        require_non_empty("scope_name", &self.scope_name)?;
        require_non_empty("credential_id", &self.credential_id)?;
        if self.collector_ids.is_empty() {
            return Err(ValidationError::EmptyField("collector_ids"));
        }
        Ok(CreateScopeBody {
            scope_name: &self.scope_name,
            scope_description: self.scope_description.as_deref(),
            collector_ids: &self.collector_ids,
            credential_id: &self.credential_id,
            environment_type: self.environment_type.as_deref(),
        })
    }
}

#[derive(Serialize)]
pub(crate) struct CreateScopeBody<'a> {
    scope_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope_description: Option<&'a str>,
    collector_ids: &'a [String],
    credential_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment_type: Option<&'a str>,
}

/// Options for `scan_summaries`.
#[derive(Debug, Clone)]
pub struct ScanSummariesOptions {
    scope_id: String,
    profile_id: Option<String>,
    group_profile_id: Option<String>,
}

impl ScanSummariesOptions {
    #[must_use]
    pub fn new(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            profile_id: None,
            group_profile_id: None,
        }
    }

    #[must_use]
    pub fn profile_id(mut self, profile_id: impl Into<String>) -> Self {
        self.profile_id = Some(profile_id.into());
        self
    }

    #[must_use]
    pub fn group_profile_id(mut self, group_profile_id: impl Into<String>) -> Self {
        self.group_profile_id = Some(group_profile_id.into());
        self
    }

    /// Query pairs in a stable order, optional pairs omitted.
    pub(crate) fn query_pairs(&self) -> Result<Vec<(&'static str, &str)>, ValidationError> {
        require_non_empty("scope_id", &self.scope_id)?;
        let mut pairs = vec![("scope_id", self.scope_id.as_str())];
        if let Some(profile_id) = &self.profile_id {
            pairs.push(("profile_id", profile_id.as_str()));
        }
        if let Some(group_profile_id) = &self.group_profile_id {
            pairs.push(("group_profile_id", group_profile_id.as_str()));
        }
        Ok(pairs)
    }
}

/// Options for `create_validation_scan`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateValidationScanOptions {
    scope_id: String,
    profile_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_profile_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_of_occurrences: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
}

impl CreateValidationScanOptions {
    #[must_use]
    pub fn new(scope_id: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            scope_id: scope_id.into(),
            profile_id: profile_id.into(),
            group_profile_id: None,
            name: None,
            description: None,
            frequency: None,
            no_of_occurrences: None,
            end_time: None,
        }
    }

    #[must_use]
    pub fn group_profile_id(mut self, group_profile_id: impl Into<String>) -> Self {
        self.group_profile_id = Some(group_profile_id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Repeat interval in milliseconds.
    #[must_use]
    pub fn frequency(mut self, frequency: u64) -> Self {
        self.frequency = Some(frequency);
        self
    }

    #[must_use]
    pub fn no_of_occurrences(mut self, count: u64) -> Self {
        self.no_of_occurrences = Some(count);
        self
    }

    /// RFC 3339 timestamp after which no more scans are scheduled.
    #[must_use]
    pub fn end_time(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("scope_id", &self.scope_id)?;
        require_non_empty("profile_id", &self.profile_id)
    }
}
