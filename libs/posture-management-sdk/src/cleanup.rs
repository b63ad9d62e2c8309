//! Removal of resources created during a run.

use std::fmt;

use http::StatusCode;
use scc_auth::AccessToken;

use crate::client::PostureManagementClient;
use crate::error::SccError;

/// Resource types with a hard-delete endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Collector,
    Scope,
}

impl ResourceKind {
    /// Path segment under `/alpha/v1.0`.
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Collector => "collectors",
            Self::Scope => "schemas",
        }
    }

    #[must_use]
    pub fn id_field(self) -> &'static str {
        match self {
            Self::Collector => "collector_id",
            Self::Scope => "scope_id",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Collector => "collector",
            Self::Scope => "scope",
        })
    }
}

/// Successful result of a hard delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The server removed the resource.
    Deleted(StatusCode),
    /// The server answered 404; nothing left to remove.
    AlreadyAbsent(StatusCode),
}

impl DeleteOutcome {
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::Deleted(status) | Self::AlreadyAbsent(status) => status,
        }
    }
}

/// Ids created by a run, filled in as each step succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedResources {
    pub collector_id: Option<String>,
    pub credential_id: Option<String>,
    pub scope_id: Option<String>,
}

impl CreatedResources {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collector_id.is_none() && self.credential_id.is_none() && self.scope_id.is_none()
    }
}

/// Outcome of deleting one resource.
#[derive(Debug)]
pub struct CleanupEntry {
    pub kind: ResourceKind,
    pub id: String,
    pub outcome: Result<DeleteOutcome, SccError>,
}

/// Per-resource outcomes of [`cleanup`], in the order attempted.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub entries: Vec<CleanupEntry>,
}

impl CleanupReport {
    /// `true` when every attempted delete succeeded or found nothing.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|e| e.outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CleanupEntry> {
        self.entries.iter().filter(|e| e.outcome.is_err())
    }
}

/// Delete the scope, then the collector.
///
/// Every present id is attempted even if an earlier delete failed. The
/// credential has no delete endpoint and is only logged.
pub async fn cleanup(
    client: &PostureManagementClient,
    token: &AccessToken,
    created: &CreatedResources,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    let targets = [
        (ResourceKind::Scope, created.scope_id.as_deref()),
        (ResourceKind::Collector, created.collector_id.as_deref()),
    ];
    for (kind, id) in targets {
        let Some(id) = id else { continue };
        let outcome = client.hard_delete(token, kind, id).await;
        match &outcome {
            Ok(DeleteOutcome::Deleted(status)) => {
                tracing::info!(%kind, id, status = status.as_u16(), "deleted");
            }
            Ok(DeleteOutcome::AlreadyAbsent(_)) => {}
            Err(e) => tracing::warn!(%kind, id, error = %e, "delete failed"),
        }
        report.entries.push(CleanupEntry {
            kind,
            id: id.to_owned(),
            outcome,
        });
    }

    if let Some(credential_id) = created.credential_id.as_deref() {
        tracing::info!(
            credential_id,
            "credential has no delete endpoint; left in place"
        );
    }

    report
}
