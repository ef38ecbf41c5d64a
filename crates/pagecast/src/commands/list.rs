//! List command - registered templates

use crate::cli::GlobalArgs;
use crate::context::Context;
use crate::output;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct TemplateSummary {
    name: String,
    cadence: String,
    offset: i32,
    folder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    schedule: Option<String>,
}

pub fn run(args: &GlobalArgs, json: bool) -> Result<()> {
    let ctx = Context::new(args)?;

    let summaries: Vec<TemplateSummary> = ctx
        .config
        .templates
        .iter()
        .map(|(name, template)| TemplateSummary {
            name: name.clone(),
            cadence: template.cadence().to_string(),
            offset: template.offset,
            folder: template.folder.clone(),
            schedule: template.schedule.clone(),
        })
        .collect();

    if json {
        return output::print_json(&summaries);
    }

    if summaries.is_empty() {
        output::warning(&format!(
            "No templates defined in {}",
            ctx.config_path.display()
        ));
        return Ok(());
    }

    for summary in &summaries {
        let folder = if summary.folder.is_empty() {
            "/"
        } else {
            summary.folder.as_str()
        };
        println!(
            "{}  {} (offset {:+})  {}",
            summary.name.bold(),
            summary.cadence,
            summary.offset,
            folder
        );
        if let Some(schedule) = &summary.schedule {
            println!("    schedule: {}", schedule);
        }
    }

    Ok(())
}
