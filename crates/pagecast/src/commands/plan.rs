//! Plan command - where a run would write

use crate::cli::GlobalArgs;
use crate::context::Context;
use crate::output;
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;

pub fn run(args: &GlobalArgs, template: &str, at: Option<DateTime<Utc>>, json: bool) -> Result<()> {
    let ctx = Context::new(args)?;
    let orchestrator = ctx.orchestrator(false)?;
    let plan = orchestrator.plan(template, at.unwrap_or_else(Utc::now))?;

    if json {
        return output::print_json(&plan);
    }

    println!("{}", format!("Template '{}'", plan.template).bold());
    println!(
        "  Period: {} {} ({} .. {})",
        plan.period.cadence, plan.period.key, plan.period.start, plan.period.end
    );
    println!("  Path:   {}", plan.path);
    if plan.exists {
        output::info("Page already exists; run would skip");
    } else {
        output::success("Page does not exist yet; run would create it");
    }

    Ok(())
}
