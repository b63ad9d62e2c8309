mod config;
mod logging;
mod workflow;

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use posture_management_sdk::PostureManagementClient;
use scc_auth::IamTokenSource;

use crate::config::DemoConfig;
use crate::logging::LogFormat;
use crate::workflow::{Workflow, WorkflowOptions};

/// SCC Posture Management demo - creates a collector, credential and scope,
/// triggers discovery and verifies the listings
#[derive(Parser, Debug)]
#[command(name = "scc-posture-demo")]
#[command(version)]
#[command(
    about = "Create, verify and optionally remove SCC Posture Management resources",
    after_help = "Required environment: IAM_API_KEY, IAM_APIKEY_URL, ACCOUNT_ID, API_URL, \
                  CREDENTIAL_PATH, PEM_PATH"
)]
struct Cli {
    /// Delete the created scope and collector when the run ends
    #[arg(long)]
    cleanup: bool,

    /// Do not trigger discovery on the new scope
    #[arg(long)]
    skip_discovery: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Per-request timeout, e.g. `45s` (overrides `SCC_REQUEST_TIMEOUT`)
    #[arg(long, value_parser = parse_timeout)]
    timeout: Option<Duration>,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let timeout = humantime::parse_duration(value).map_err(|e| e.to_string())?;
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_owned());
    }
    Ok(timeout)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let mut config = DemoConfig::from_env()?;
    if let Some(timeout) = cli.timeout {
        config.request_timeout = timeout;
    }
    if config.allow_insecure_http {
        tracing::warn!("SCC_ALLOW_INSECURE_HTTP is set; plain http:// URLs are accepted");
    }

    let tokens =
        IamTokenSource::new(&config.iam_auth_config()).context("invalid IAM configuration")?;
    let client = PostureManagementClient::builder()
        .base_url(config.api_url.as_str())
        .account_id(config.account_id.as_str())
        .http_config(config.http_config())
        .build()
        .context("failed to build the API client")?;

    tracing::info!(
        api_url = %config.api_url,
        account_id = %config.account_id,
        timeout = ?config.request_timeout,
        cleanup = cli.cleanup,
        skip_discovery = cli.skip_discovery,
        "scc-posture-demo starting"
    );

    let options = WorkflowOptions {
        credential_path: config.credential_path.clone(),
        pem_path: config.pem_path.clone(),
        pass_phrase: config.pass_phrase.clone(),
        skip_discovery: cli.skip_discovery,
        cleanup: cli.cleanup,
    };
    let report = Workflow::new(&client, &tokens, options).run().await;
    report.log_summary();

    Ok(if report.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
