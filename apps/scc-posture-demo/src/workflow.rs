//! The end-to-end run: provision a collector, credential and scope, trigger
//! discovery, verify the listings, then optionally remove what was created.
//!
//! Steps run strictly in order and each runs at most once. The first failing
//! step stops the run; cleanup, when requested, still runs for the ids
//! created up to that point.

use std::fmt;
use std::path::PathBuf;

use http::StatusCode;
use posture_management_sdk::{
    CleanupReport, CreateCollectorOptions, CreateCredentialOptions, CreateScopeOptions,
    CreatedResources, DetailedResponse, DiscoveryRequest, PostureManagementClient, SccError,
    cleanup,
};
use scc_auth::{AccessToken, IamTokenSource, SecretString};
use thiserror::Error;
use uuid::Uuid;

/// Progress of a run. Ordered: a later stage implies all earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    CollectorCreated,
    CredentialCreated,
    ScopeCreated,
    DiscoveryTriggered,
    Verified,
    Cleanup,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::CollectorCreated => "collector_created",
            Self::CredentialCreated => "credential_created",
            Self::ScopeCreated => "scope_created",
            Self::DiscoveryTriggered => "discovery_triggered",
            Self::Verified => "verified",
            Self::Cleanup => "cleanup",
            Self::Done => "done",
        })
    }
}

/// Why a step failed.
#[derive(Debug, Error)]
pub enum StepFailure {
    #[error(transparent)]
    Sdk(#[from] SccError),

    #[error("HTTP {status} response carried no {expected}")]
    MissingResult {
        status: StatusCode,
        expected: &'static str,
    },

    #[error("scope {scope_id} listed {found} times, expected exactly once")]
    ScopeCount { scope_id: String, found: usize },
}

/// A failed step. `stage` is the stage the step would have reached; an
/// authentication failure is reported as [`Stage::Init`].
#[derive(Debug, Error)]
#[error("step '{stage}' failed: {source}")]
pub struct StepError {
    pub stage: Stage,
    #[source]
    pub source: StepFailure,
}

impl StepError {
    fn new(stage: Stage, source: impl Into<StepFailure>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }
}

/// What the run achieved.
#[derive(Debug)]
pub struct RunReport {
    /// Last stage reached.
    pub completed: Stage,
    pub created: CreatedResources,
    pub discovery_skipped: bool,
    pub error: Option<StepError>,
    /// Present when cleanup ran.
    pub cleanup: Option<CleanupReport>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            completed: Stage::Init,
            created: CreatedResources::default(),
            discovery_skipped: false,
            error: None,
            cleanup: None,
        }
    }

    /// `true` if every step up to verification passed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.completed >= Stage::Verified
    }

    fn reach(&mut self, stage: Stage) {
        tracing::info!(stage = %stage, "stage reached");
        self.completed = stage;
    }

    /// One summary event for the whole run.
    pub fn log_summary(&self) {
        if let Some(cleanup) = &self.cleanup {
            for entry in cleanup.failures() {
                tracing::warn!(kind = %entry.kind, id = %entry.id, "resource left behind");
            }
        }

        match &self.error {
            None => tracing::info!(
                completed = %self.completed,
                collector_id = ?self.created.collector_id,
                credential_id = ?self.created.credential_id,
                scope_id = ?self.created.scope_id,
                discovery_skipped = self.discovery_skipped,
                "run succeeded"
            ),
            Some(error) => tracing::error!(
                completed = %self.completed,
                failed = %error.stage,
                error = %error.source,
                collector_id = ?self.created.collector_id,
                credential_id = ?self.created.credential_id,
                scope_id = ?self.created.scope_id,
                "run failed"
            ),
        }
    }
}

/// Inputs that do not come from the API.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub credential_path: PathBuf,
    pub pem_path: PathBuf,
    pub pass_phrase: SecretString,
    pub skip_discovery: bool,
    pub cleanup: bool,
}

pub struct Workflow<'a> {
    client: &'a PostureManagementClient,
    tokens: &'a IamTokenSource,
    options: WorkflowOptions,
}

impl<'a> Workflow<'a> {
    #[must_use]
    pub fn new(
        client: &'a PostureManagementClient,
        tokens: &'a IamTokenSource,
        options: WorkflowOptions,
    ) -> Self {
        Self {
            client,
            tokens,
            options,
        }
    }

    /// Run every step once. Never panics; failures end up in the report.
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::new();

        let token = match self.tokens.request_token().await {
            Ok(token) => token,
            Err(e) => {
                report.error = Some(StepError::new(Stage::Init, SccError::from(e)));
                return report;
            }
        };
        tracing::info!(expires_at = %token.expires_at(), "IAM token obtained");

        if let Err(e) = self.provision_and_verify(&token, &mut report).await {
            tracing::error!(stage = %e.stage, error = %e.source, "step failed");
            report.error = Some(e);
        }

        if self.options.cleanup {
            if report.created.is_empty() {
                tracing::info!("nothing to clean up");
            } else {
                let outcome = cleanup(self.client, &token, &report.created).await;
                if report.error.is_none() {
                    report.reach(Stage::Cleanup);
                }
                report.cleanup = Some(outcome);
            }
        }

        if report.error.is_none() {
            report.reach(Stage::Done);
        }
        report
    }

    async fn provision_and_verify(
        &self,
        token: &AccessToken,
        report: &mut RunReport,
    ) -> Result<(), StepError> {
        let collector_id = self
            .create_collector(token)
            .await
            .map_err(|e| StepError::new(Stage::CollectorCreated, e))?;
        report.created.collector_id = Some(collector_id.clone());
        report.reach(Stage::CollectorCreated);

        let credential_id = self
            .create_credential(token)
            .await
            .map_err(|e| StepError::new(Stage::CredentialCreated, e))?;
        report.created.credential_id = Some(credential_id.clone());
        report.reach(Stage::CredentialCreated);

        let scope_id = self
            .create_scope(token, &collector_id, &credential_id)
            .await
            .map_err(|e| StepError::new(Stage::ScopeCreated, e))?;
        report.created.scope_id = Some(scope_id.clone());
        report.reach(Stage::ScopeCreated);

        if self.options.skip_discovery {
            tracing::info!(scope_id, "discovery skipped");
            report.discovery_skipped = true;
        } else {
            self.trigger_discovery(token, &scope_id, &collector_id)
                .await
                .map_err(|e| StepError::new(Stage::DiscoveryTriggered, e))?;
            report.reach(Stage::DiscoveryTriggered);
        }

        self.verify(token, &scope_id)
            .await
            .map_err(|e| StepError::new(Stage::Verified, e))?;
        report.reach(Stage::Verified);
        Ok(())
    }

    async fn create_collector(&self, token: &AccessToken) -> Result<String, StepFailure> {
        let options = CreateCollectorOptions::new(format!("test-{}", Uuid::new_v4()))
            .description("test collector")
            .managed_by("customer")
            .is_public(true)
            .pass_phrase(self.options.pass_phrase.clone());

        let response = self.client.create_collector(token, &options).await?;
        let collector = required(response, &[StatusCode::CREATED], "collector")?;
        tracing::info!(
            collector_id = %collector.collector_id,
            name = options.collector_name(),
            "collector created"
        );
        Ok(collector.collector_id)
    }

    async fn create_credential(&self, token: &AccessToken) -> Result<String, StepFailure> {
        let options = CreateCredentialOptions::new(&self.options.credential_path)
            .pem_path(&self.options.pem_path);

        let response = self.client.create_credential(token, &options).await?;
        let credential = required(response, &[StatusCode::CREATED], "credential")?;
        tracing::info!(credential_id = %credential.credential_id, "credential created");
        Ok(credential.credential_id)
    }

    async fn create_scope(
        &self,
        token: &AccessToken,
        collector_id: &str,
        credential_id: &str,
    ) -> Result<String, StepFailure> {
        let options = CreateScopeOptions::new(
            format!("scope-{}", Uuid::new_v4()),
            credential_id,
            vec![collector_id.to_owned()],
        )
        .description("test scope")
        .environment_type("ibm");

        let response = self.client.create_scope(token, &options).await?;
        let scope = required(response, &[StatusCode::CREATED, StatusCode::OK], "scope")?;
        tracing::info!(
            scope_id = %scope.scope_id,
            name = options.scope_name(),
            "scope created"
        );
        Ok(scope.scope_id)
    }

    async fn trigger_discovery(
        &self,
        token: &AccessToken,
        scope_id: &str,
        collector_id: &str,
    ) -> Result<(), StepFailure> {
        let request = DiscoveryRequest::new(scope_id, &[collector_id]).map_err(SccError::from)?;
        self.client
            .create_discovery(token, &request)
            .await?
            .expect_status(&[StatusCode::OK])?;
        tracing::info!(
            scope_id,
            discovery_level = request.discovery_level(),
            "discovery triggered"
        );
        Ok(())
    }

    async fn verify(&self, token: &AccessToken, scope_id: &str) -> Result<(), StepFailure> {
        let scopes = required(
            self.client.list_scopes(token).await?,
            &[StatusCode::OK],
            "scope list",
        )?;
        let found = scopes.count_of(scope_id);
        if found != 1 {
            return Err(StepFailure::ScopeCount {
                scope_id: scope_id.to_owned(),
                found,
            });
        }

        let profiles = required(
            self.client.list_profiles(token).await?,
            &[StatusCode::OK],
            "profile list",
        )?;
        tracing::info!(
            scopes = scopes.scopes.len(),
            profiles = profiles.profiles.len(),
            "listings verified"
        );
        Ok(())
    }
}

/// Parsed body of a response whose status is in `accepted`.
fn required<T>(
    response: DetailedResponse<T>,
    accepted: &[StatusCode],
    expected: &'static str,
) -> Result<T, StepFailure> {
    let response = response.expect_status(accepted)?;
    let status = response.status();
    response
        .into_result()?
        .ok_or(StepFailure::MissingResult { status, expected })
}
