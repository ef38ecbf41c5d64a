//! Check command - load every template and report problems

use crate::cli::GlobalArgs;
use crate::context::Context;
use anyhow::{Result, bail};
use chrono::Utc;
use colored::Colorize;
use pagecast_core::Orchestrator;
use serde::Serialize;
use std::collections::BTreeMap;

/// Check command JSON output schema
#[derive(Debug, Serialize)]
struct CheckOutput {
    schema_version: String,
    config: Option<String>,
    timestamp: String,
    checks: Vec<Check>,
}

#[derive(Debug, Serialize)]
struct Check {
    id: String,
    name: String,
    status: CheckStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Error,
}

impl Check {
    fn ok(id: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: CheckStatus::Ok,
            message: message.into(),
            details: None,
        }
    }

    fn error(id: impl Into<String>, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Error,
            ..Self::ok(id, name, message)
        }
    }
}

/// Validate the configuration, the storage backend and every template
///
/// All checks are reported before deciding the exit status; the command
/// fails if any of them is an error.
pub fn run(args: &GlobalArgs, json: bool) -> Result<()> {
    let mut checks = Vec::new();
    let mut config_path = None;

    match Context::new(args) {
        Ok(ctx) => {
            config_path = Some(ctx.config_path.display().to_string());
            checks.push(Check::ok(
                "config_valid",
                "Configuration file",
                format!("{} is valid", ctx.config_path.display()),
            ));

            match ctx.orchestrator(false) {
                Ok(orchestrator) => {
                    checks.push(Check::ok(
                        "storage",
                        "Storage backend",
                        format!("{:?} backend ready", ctx.config.storage.backend).to_lowercase(),
                    ));
                    for name in ctx.config.templates.keys() {
                        checks.push(check_template(&orchestrator, name));
                    }
                }
                Err(e) => checks.push(Check::error("storage", "Storage backend", e.to_string())),
            }
        }
        Err(e) => checks.push(Check::error(
            "config_valid",
            "Configuration file",
            format!("Failed to load config: {}", e),
        )),
    }

    let output = CheckOutput {
        schema_version: "1.0".to_string(),
        config: config_path,
        timestamp: Utc::now().to_rfc3339(),
        checks,
    };

    if json {
        crate::output::print_json(&output)?;
    } else {
        print_human_readable(&output);
    }

    let failed = output
        .checks
        .iter()
        .filter(|check| check.status == CheckStatus::Error)
        .count();
    if failed > 0 {
        bail!("{} check(s) failed", failed);
    }
    Ok(())
}

/// Load the body and compute today's destination of one template
fn check_template(orchestrator: &Orchestrator, name: &str) -> Check {
    let id = format!("template:{}", name);
    let label = format!("Template '{}'", name);

    let page = match orchestrator.registry().load(name) {
        Ok(page) => page,
        Err(e) => return Check::error(id, label, e.to_string()),
    };

    match orchestrator.plan(name, Utc::now()) {
        Ok(plan) => {
            let mut details = BTreeMap::new();
            details.insert(
                "period".to_string(),
                serde_json::Value::String(plan.period.key.to_string()),
            );
            details.insert(
                "path".to_string(),
                serde_json::Value::String(plan.path.to_string()),
            );
            details.insert(
                "placeholders".to_string(),
                serde_json::Value::from(page.placeholders().count()),
            );

            Check {
                details: Some(details),
                ..Check::ok(id, label, format!("{} template loads", page.cadence))
            }
        }
        Err(e) => Check::error(id, label, e.to_string()),
    }
}

fn print_human_readable(output: &CheckOutput) {
    println!("{}", "Template Check".bold());
    println!();

    if let Some(config) = &output.config {
        println!("  Config: {}", config);
        println!();
    }

    println!("{}", "Checks:".bold());
    for check in &output.checks {
        let status_str = match check.status {
            CheckStatus::Ok => "✓".green(),
            CheckStatus::Error => "✗".red(),
        };

        println!("  {} {}: {}", status_str, check.name.bold(), check.message);

        if let Some(details) = &check.details {
            for (key, value) in details {
                println!("      {}: {}", key, value);
            }
        }
    }
}
