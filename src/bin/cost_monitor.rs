//! Cost monitor for the demo deployment: wraps the Azure CLI, reports
//! per-resource-group spend, and enforces a budget threshold for scripting.

use chrono::Datelike;
use clap::{Parser, ValueEnum};
use epigraph::ops::{azcli, costs};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EnvName {
    Dev,
    Staging,
    Prod,
}

impl EnvName {
    fn as_str(self) -> &'static str {
        match self {
            EnvName::Dev => "dev",
            EnvName::Staging => "staging",
            EnvName::Prod => "prod",
        }
    }
}

#[derive(Parser)]
#[command(
    name = "cost-monitor",
    version,
    about = "Monitor Azure costs for the epigraph demo deployment"
)]
struct Cli {
    /// Project name used to discover resource groups.
    #[arg(long, default_value = "webapp-demo")]
    project_name: String,

    /// Restrict the report to one environment.
    #[arg(long, value_enum)]
    environment: Option<EnvName>,

    /// Number of days to analyze.
    #[arg(long, default_value_t = 30)]
    days: i64,

    /// Budget limit in USD; enables threshold alerts.
    #[arg(long)]
    budget_alert: Option<f64>,

    /// Report the current month only.
    #[arg(long)]
    current_month: bool,

    /// Export the full report as JSON to this file.
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Minimal output for scripting: prints the total cost only.
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // The report itself goes to stdout; tracing carries only CLI diagnostics.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let subscription_id = match azcli::az_text(&["account", "show", "--query", "id"]) {
        Ok(id) if !id.is_empty() => id,
        _ => {
            eprintln!("error: could not get the Azure subscription id; run 'az login' first");
            return ExitCode::from(1);
        }
    };

    let environment = cli.environment.map(EnvName::as_str);
    if !cli.quiet {
        println!("Monitoring costs for project: {}", cli.project_name);
        println!("Subscription: {subscription_id}");
        if let Some(env) = environment {
            println!("Environment: {env}");
        }
        println!();
    }

    let days = if cli.current_month {
        i64::from(chrono::Utc::now().day())
    } else {
        cli.days
    };

    let report = costs::gather_cost_data(&subscription_id, &cli.project_name, days, environment);
    let budget = cli
        .budget_alert
        .map(|limit| costs::check_budget(limit, report.total_cost));

    if cli.quiet {
        println!("{:.2}", report.total_cost);
    } else {
        print!(
            "{}",
            costs::format_cost_report(&report, &cli.project_name, environment)
        );

        if let Some(status) = &budget {
            println!("Budget Status:");
            println!("{}", "-".repeat(20));
            println!("Budget Utilization: {:.1}%", status.percentage);
            for alert in &status.alerts {
                println!("ALERT: {alert}");
            }
            println!();
        }
    }

    if let Some(path) = &cli.export {
        let payload = json!({
            "project_name": cli.project_name,
            "environment": environment,
            "cost_data": &report,
            "budget_status": &budget,
            "generated_at": chrono::Utc::now().to_rfc3339(),
        });
        let serialized = match serde_json::to_string_pretty(&payload) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: failed to serialize export payload: {e}");
                return ExitCode::from(1);
            }
        };
        if let Err(e) = std::fs::write(path, serialized) {
            eprintln!("error: failed to write {}: {e}", path.display());
            return ExitCode::from(1);
        }
        if !cli.quiet {
            println!("Cost data exported to: {}", path.display());
        }
    }

    if budget.is_some_and(|s| s.status == costs::BudgetLevel::Critical) {
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
