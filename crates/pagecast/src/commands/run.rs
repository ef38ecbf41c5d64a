//! Run command - create the page of one template

use crate::cli::GlobalArgs;
use crate::context::Context;
use crate::output;
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use pagecast_core::RunOutcome;
use pagecast_core::orchestrator::SkipReason;
use serde::Serialize;

#[derive(Serialize)]
struct RunOutput<'a> {
    dry_run: bool,
    #[serde(flatten)]
    outcome: &'a RunOutcome,
}

/// Create the page for the period containing `at` (default: now)
///
/// Exits 0 when the page is created or already present; a skipped run is
/// reported, not treated as a failure.
pub fn run(
    args: &GlobalArgs,
    template: &str,
    at: Option<DateTime<Utc>>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let ctx = Context::new(args)?;
    let orchestrator = ctx.orchestrator(dry_run)?;
    let instant = at.unwrap_or_else(Utc::now);

    let outcome = orchestrator.run(template, instant)?;

    if json {
        return output::print_json(&RunOutput {
            dry_run,
            outcome: &outcome,
        });
    }

    match &outcome {
        RunOutcome::Created(page) if dry_run => {
            output::info(&format!(
                "Would create {} ({})",
                page.path.to_string().bold(),
                page.period.key
            ));
            println!();
            output::print_text(&page.content)?;
        }
        RunOutcome::Created(page) => {
            output::success(&format!(
                "Created {} ({})",
                page.path.to_string().bold(),
                page.period.key
            ));
        }
        RunOutcome::Skipped(page) => {
            let reason = match page.reason {
                SkipReason::Exists => "already exists",
                SkipReason::LostRace => "created by a concurrent run",
            };
            output::info(&format!(
                "Skipped {} ({}): {}",
                page.path.to_string().bold(),
                page.period.key,
                reason
            ));
        }
    }

    Ok(())
}
