//! Cost reporting for the demo deployment.
//!
//! Billing data is fetched with a three-tier fallback: the Cost Management
//! query first, the consumption usage API second, and a per-resource-type
//! estimation table when no billing rows exist yet (new deployments take
//! 24-48 hours to appear in billing).

use super::azcli;
use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::warn;

/// Monthly USD estimates per resource type, used when billing has no data.
const RESOURCE_COSTS: &[(&str, f64)] = &[
    ("Microsoft.Sql/servers", 0.0),
    ("Microsoft.Sql/servers/databases", 5.0),
    ("Microsoft.Web/serverFarms", 13.0),
    ("Microsoft.Web/sites", 0.0),
    ("Microsoft.ContainerRegistry/registries", 5.0),
    ("Microsoft.KeyVault/vaults", 0.03),
    ("Microsoft.Insights/components", 2.3),
    ("Microsoft.OperationalInsights/workspaces", 2.3),
    ("microsoft.insights/actiongroups", 0.0),
];

const DEFAULT_RESOURCE_COST: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Actual,
    Estimated,
}

#[derive(Debug, Serialize)]
pub struct ResourceEstimate {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub estimated_monthly_cost: f64,
}

#[derive(Debug, Serialize)]
pub struct CostReport {
    pub total_cost: f64,
    pub breakdown: BTreeMap<String, f64>,
    pub resource_details: BTreeMap<String, Vec<ResourceEstimate>>,
    pub period: String,
    pub currency: String,
    pub data_source: DataSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLevel {
    Ok,
    Warning,
    Critical,
}

#[derive(Debug, Serialize)]
pub struct BudgetStatus {
    pub percentage: f64,
    pub alerts: Vec<String>,
    pub status: BudgetLevel,
}

/// Resource groups belonging to the project: discovered by name via the CLI,
/// with a naming-convention fallback when discovery yields nothing.
pub fn project_resource_groups(project_name: &str) -> Vec<String> {
    let query = format!("[?contains(name, '{project_name}')].name");
    match azcli::az_json(&["group", "list", "--query", &query]) {
        Ok(Value::Array(names)) => {
            let discovered: Vec<String> = names
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            if !discovered.is_empty() {
                return discovered;
            }
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "could not discover resource groups via azure cli"),
    }

    let mut groups: Vec<String> = ["dev", "staging", "prod"]
        .iter()
        .map(|env| format!("{project_name}-{env}-rg"))
        .collect();
    groups.push(format!("{project_name}-terraform-state-rg"));
    groups
}

pub fn gather_cost_data(
    subscription_id: &str,
    project_name: &str,
    days: i64,
    environment: Option<&str>,
) -> CostReport {
    let end = Utc::now().date_naive();
    let start = end - Duration::days(days);

    let mut groups = project_resource_groups(project_name);
    if let Some(env) = environment {
        groups.retain(|g| g.contains(env));
    }

    let (mut total, mut breakdown) = try_cost_management(subscription_id, &groups, start, end);
    if total == 0.0 {
        (total, breakdown) = try_consumption(&groups, start, end);
    }

    let mut resource_details = BTreeMap::new();
    let mut data_source = DataSource::Actual;
    if total == 0.0 {
        (total, breakdown, resource_details) = estimate_from_resources(&groups, environment);
        data_source = DataSource::Estimated;
    }

    CostReport {
        total_cost: total,
        breakdown,
        resource_details,
        period: format!("{start} to {end}"),
        currency: "USD".to_string(),
        data_source,
    }
}

fn try_cost_management(
    subscription_id: &str,
    groups: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> (f64, BTreeMap<String, f64>) {
    let mut total = 0.0;
    let mut breakdown = BTreeMap::new();

    for rg in groups {
        let scope = format!("/subscriptions/{subscription_id}/resourceGroups/{rg}");
        let from = format!("from={start}T00:00:00+00:00");
        let to = format!("to={end}T23:59:59+00:00");
        let result = azcli::az_json(&[
            "costmanagement",
            "query",
            "--type",
            "ActualCost",
            "--dataset-aggregation",
            r#"{"totalCost":{"name":"PreTaxCost","function":"Sum"}}"#,
            "--dataset-grouping",
            "name=ResourceGroup,type=Dimension",
            "--timeframe",
            "Custom",
            "--time-period",
            &from,
            "--time-period",
            &to,
            "--scope",
            &scope,
        ]);

        let Ok(data) = result else { continue };
        let Some(rows) = data.get("rows").and_then(Value::as_array) else {
            continue;
        };
        for row in rows {
            let Some(cells) = row.as_array() else { continue };
            if cells.len() < 2 {
                continue;
            }
            if let Some(cost) = lenient_f64(&cells[0]) {
                total += cost;
                breakdown.insert(rg.clone(), cost);
            }
        }
    }

    (total, breakdown)
}

fn try_consumption(
    groups: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> (f64, BTreeMap<String, f64>) {
    let mut total = 0.0;
    let mut breakdown = BTreeMap::new();

    for rg in groups {
        if azcli::az_json(&["group", "show", "--name", rg]).is_err() {
            continue;
        }

        let query = format!("[?contains(instanceName, '{rg}')].{{cost:pretaxCost,service:meterCategory}}");
        let start_arg = start.to_string();
        let end_arg = end.to_string();
        let result = azcli::az_json(&[
            "consumption",
            "usage",
            "list",
            "--start-date",
            &start_arg,
            "--end-date",
            &end_arg,
            "--query",
            &query,
        ]);

        let Ok(Value::Array(usage)) = result else {
            continue;
        };
        let rg_cost: f64 = usage
            .iter()
            .filter_map(|item| item.get("cost").and_then(lenient_f64))
            .sum();
        if rg_cost > 0.0 {
            total += rg_cost;
            breakdown.insert(rg.clone(), rg_cost);
        }
    }

    (total, breakdown)
}

#[allow(clippy::type_complexity)]
fn estimate_from_resources(
    groups: &[String],
    environment: Option<&str>,
) -> (
    f64,
    BTreeMap<String, f64>,
    BTreeMap<String, Vec<ResourceEstimate>>,
) {
    let mut total = 0.0;
    let mut breakdown = BTreeMap::new();
    let mut details = BTreeMap::new();

    for rg in groups {
        let resources = match azcli::az_json(&["resource", "list", "--resource-group", rg]) {
            Ok(Value::Array(resources)) => resources,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "resource estimation failed; using flat environment estimate");
                return flat_environment_estimate(groups, environment);
            }
        };

        let mut rg_cost = 0.0;
        let mut rg_resources = Vec::new();
        for resource in &resources {
            let resource_type = resource.get("type").and_then(Value::as_str).unwrap_or("");
            let name = resource
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            let cost = monthly_cost_estimate(resource_type);
            rg_cost += cost;
            rg_resources.push(ResourceEstimate {
                name,
                resource_type: resource_type.to_string(),
                estimated_monthly_cost: cost,
            });
        }

        if rg_cost > 0.0 {
            total += rg_cost;
            breakdown.insert(rg.clone(), rg_cost);
            details.insert(rg.clone(), rg_resources);
        }
    }

    (total, breakdown, details)
}

#[allow(clippy::type_complexity)]
fn flat_environment_estimate(
    groups: &[String],
    environment: Option<&str>,
) -> (
    f64,
    BTreeMap<String, f64>,
    BTreeMap<String, Vec<ResourceEstimate>>,
) {
    let fallback = match environment {
        Some("staging") => 50.0,
        Some("prod") => 100.0,
        _ => 25.0,
    };

    let mut total = 0.0;
    let mut breakdown = BTreeMap::new();
    if !groups.is_empty() {
        let per_group = fallback / groups.len() as f64;
        for rg in groups {
            breakdown.insert(rg.clone(), per_group);
            total += per_group;
        }
    }
    (total, breakdown, BTreeMap::new())
}

fn monthly_cost_estimate(resource_type: &str) -> f64 {
    RESOURCE_COSTS
        .iter()
        .find(|(ty, _)| *ty == resource_type)
        .map_or(DEFAULT_RESOURCE_COST, |(_, cost)| *cost)
}

/// The CLI sometimes emits costs as strings; accept both.
fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn check_budget(budget_limit: f64, current_cost: f64) -> BudgetStatus {
    let percentage = if budget_limit > 0.0 {
        current_cost / budget_limit * 100.0
    } else {
        0.0
    };

    let mut alerts = Vec::new();
    if percentage >= 100.0 {
        alerts.push(format!(
            "CRITICAL: cost has exceeded budget by {:.1}%",
            percentage - 100.0
        ));
    } else if percentage >= 90.0 {
        alerts.push(format!("WARNING: cost is at {percentage:.1}% of budget"));
    } else if percentage >= 75.0 {
        alerts.push(format!("CAUTION: cost is at {percentage:.1}% of budget"));
    }

    let status = if percentage >= 100.0 {
        BudgetLevel::Critical
    } else if percentage >= 75.0 {
        BudgetLevel::Warning
    } else {
        BudgetLevel::Ok
    };

    BudgetStatus {
        percentage,
        alerts,
        status,
    }
}

pub fn format_cost_report(
    report: &CostReport,
    project_name: &str,
    environment: Option<&str>,
) -> String {
    let mut out = String::new();
    let rule = "=".repeat(70);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Azure Cost Report - {project_name}");
    if let Some(env) = environment {
        let _ = writeln!(out, "Environment: {env}");
    }
    let _ = writeln!(out, "Period: {}", report.period);
    let _ = writeln!(out, "Currency: {}", report.currency);
    let _ = writeln!(
        out,
        "Data Source: {}",
        match report.data_source {
            DataSource::Actual => "Actual",
            DataSource::Estimated => "Estimated",
        }
    );
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total Cost: ${:.2}", report.total_cost);
    let _ = writeln!(out);

    if !report.breakdown.is_empty() {
        let _ = writeln!(out, "Cost Breakdown by Resource Group:");
        let _ = writeln!(out, "{}", "-".repeat(50));
        let mut entries: Vec<(&String, &f64)> = report.breakdown.iter().collect();
        entries.sort_by(|a, b| b.1.total_cmp(a.1));
        for (rg, cost) in entries {
            let percentage = if report.total_cost > 0.0 {
                cost / report.total_cost * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "{rg:<35} ${cost:>8.2} ({percentage:>5.1}%)");
        }
        let _ = writeln!(out);
    }

    if !report.resource_details.is_empty() {
        let _ = writeln!(out, "Resource Details:");
        let _ = writeln!(out, "{}", "-".repeat(50));
        for (rg, resources) in &report.resource_details {
            let _ = writeln!(out, "\n{rg}:");
            for resource in resources {
                let name = if resource.name.len() > 25 {
                    format!("{}...", &resource.name[..25])
                } else {
                    resource.name.clone()
                };
                let short_type = resource
                    .resource_type
                    .rsplit('/')
                    .next()
                    .unwrap_or(&resource.resource_type);
                let _ = writeln!(
                    out,
                    "  {name:<28} {short_type:<15} ${:>6.2}",
                    resource.estimated_monthly_cost
                );
            }
        }
        let _ = writeln!(out);
    }

    if report.data_source == DataSource::Estimated {
        let _ = writeln!(out, "Note: costs are estimated from deployed resources.");
        let _ = writeln!(
            out,
            "Actual billing data may take 24-48 hours to appear; use 'az billing' for current data."
        );
    }

    out
}
