//! Resource models returned by the Posture Management API.
//!
//! Only `*_id` fields are required. Everything else is optional so that new
//! or missing server fields do not break decoding. Ids are accepted as JSON
//! strings or numbers and always exposed as strings.

use serde::{Deserialize, Deserializer};

/// Accept `"123"` or `123` for an id.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "string_or_number")] String);

    Ok(Option::<Wrapped>::deserialize(deserializer)?.map(|Wrapped(s)| s))
}

fn string_or_number_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "string_or_number")] String);

    let items: Option<Vec<Wrapped>> = Option::deserialize(deserializer)?;
    Ok(items
        .unwrap_or_default()
        .into_iter()
        .map(|Wrapped(s)| s)
        .collect())
}

/// A registered collector.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Collector {
    #[serde(deserialize_with = "string_or_number")]
    pub collector_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub managed_by: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub registration_code: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A stored credential.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Credential {
    #[serde(deserialize_with = "string_or_number")]
    pub credential_id: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "type")]
    pub credential_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A scope (the API calls it a schema).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Scope {
    #[serde(deserialize_with = "string_or_number")]
    pub scope_id: String,
    #[serde(default)]
    pub scope_name: Option<String>,
    #[serde(default)]
    pub scope_description: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub credential_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_number_vec")]
    pub collector_ids: Vec<String>,
    #[serde(default)]
    pub environment_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `GET schemas` reply.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScopeList {
    pub scopes: Vec<Scope>,
}

impl ScopeList {
    /// Number of entries whose id equals `scope_id`.
    #[must_use]
    pub fn count_of(&self, scope_id: &str) -> usize {
        self.scopes.iter().filter(|s| s.scope_id == scope_id).count()
    }
}

/// A compliance profile.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Profile {
    #[serde(deserialize_with = "string_or_number")]
    pub profile_id: String,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default)]
    pub profile_description: Option<String>,
    #[serde(default)]
    pub profile_type: Option<String>,
    #[serde(default)]
    pub profile_version: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// `GET profiles` reply.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProfileList {
    pub profiles: Vec<Profile>,
}

/// Summary of one scan run.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScanSummary {
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub scan_id: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub scope_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub profile_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// `GET scans/summaries` reply.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScanSummaryList {
    #[serde(default)]
    pub summaries: Vec<ScanSummary>,
}

/// Reply to `POST scans/validation`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ValidationScanReply {
    #[serde(default)]
    pub result: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}
