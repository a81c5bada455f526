//! Unattended teardown of a demo resource group, designed for scheduled
//! execution (an automation runbook); developers tear down interactively
//! with terraform instead. Exit code 0 on success, 1 on failure or when the
//! deletion is still in flight at the timeout.

use chrono::Utc;
use clap::Parser;
use epigraph::ops::OpsError;
use epigraph::ops::azcli;
use epigraph::ops::webhook::{Notifier, NotifyStatus};
use serde_json::Value;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

#[derive(Parser)]
#[command(
    name = "auto-cleanup",
    version,
    about = "Scheduled teardown of the demo resource group"
)]
struct Cli {
    /// Resource group to delete.
    #[arg(long)]
    resource_group: String,

    /// Azure subscription id.
    #[arg(long)]
    subscription: String,

    /// Optional Slack-format webhook for notifications.
    #[arg(long)]
    webhook_url: Option<Url>,

    /// Enable verbose logging.
    #[arg(long)]
    verbose: bool,
}

const DELETE_TIMEOUT: Duration = Duration::from_secs(10 * 60);
const POLL_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::new(level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let notifier = Notifier::new(cli.webhook_url.clone(), cli.subscription.clone());

    match run(&cli, &notifier).await {
        Ok(true) => {
            info!("Cleanup completed successfully");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            error!("Cleanup completed with warnings");
            ExitCode::from(1)
        }
        Err(e) => {
            let message = format!("Cleanup failed: {e}");
            error!("{message}");
            notifier.notify(&message, NotifyStatus::Error).await;
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli, notifier: &Notifier) -> Result<bool, OpsError> {
    info!(
        resource_group = %cli.resource_group,
        subscription = %cli.subscription,
        "starting scheduled cleanup"
    );

    let exists = azcli::az_json(&["group", "exists", "--name", &cli.resource_group])?;
    if exists.as_bool() != Some(true) {
        let message = format!(
            "Resource group '{}' not found. It may have already been deleted.",
            cli.resource_group
        );
        info!("{message}");
        notifier.notify(&message, NotifyStatus::Info).await;
        return Ok(true);
    }

    // Cost reporting before deletion, for transparency. Detailed analysis
    // lives in Cost Management; here only the period is recorded.
    let now = Utc::now();
    let period = format!("{} to {}", now.format("%Y-%m-01"), now.format("%Y-%m-%d"));
    info!(period = %period, "cost data for the current month is available in Cost Management");

    match azcli::az_json(&["resource", "list", "--resource-group", &cli.resource_group]) {
        Ok(Value::Array(resources)) => {
            info!(count = resources.len(), "resources scheduled for deletion");
            for resource in &resources {
                info!(
                    "  - {} ({})",
                    resource.get("name").and_then(serde_json::Value::as_str).unwrap_or("?"),
                    resource.get("type").and_then(serde_json::Value::as_str).unwrap_or("?"),
                );
            }
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "failed to list resources before deletion"),
    }

    azcli::az_json(&[
        "group",
        "delete",
        "--name",
        &cli.resource_group,
        "--yes",
        "--no-wait",
    ])?;
    info!(timeout_secs = DELETE_TIMEOUT.as_secs(), "deletion started; polling for completion");

    let start = Instant::now();
    loop {
        tokio::time::sleep(POLL_INTERVAL).await;

        let exists = azcli::az_json(&["group", "exists", "--name", &cli.resource_group])?;
        if exists.as_bool() == Some(false) {
            let message = format!(
                "Resource group '{}' deleted successfully. Cost period: {period}",
                cli.resource_group
            );
            info!("{message}");
            notifier.notify(&message, NotifyStatus::Success).await;
            return Ok(true);
        }

        if start.elapsed() > DELETE_TIMEOUT {
            let message = "Resource group deletion initiated but still in progress; check the portal for status.".to_string();
            warn!("{message}");
            notifier.notify(&message, NotifyStatus::Warning).await;
            return Ok(false);
        }

        info!(
            elapsed_secs = start.elapsed().as_secs(),
            "waiting for deletion to complete"
        );
    }
}
