//! Crontab command - schedule lines for templates

use crate::cli::GlobalArgs;
use crate::context::Context;
use anyhow::Result;
use std::env;

/// Print one cron line per template that declares a `schedule`
pub fn run(args: &GlobalArgs, bin: Option<String>) -> Result<()> {
    let ctx = Context::new(args)?;
    let bin = match bin {
        Some(bin) => bin,
        None => env::current_exe()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "pagecast".to_string()),
    };
    let config = std::path::absolute(&ctx.config_path)?;
    let config = config.display().to_string();

    println!("# pagecast schedule for {}", config);
    for (name, template) in &ctx.config.templates {
        let Some(schedule) = &template.schedule else {
            println!("# {}: no schedule", name);
            continue;
        };

        if !is_cron_schedule(schedule) {
            tracing::warn!("Template '{}' has an invalid schedule '{}'", name, schedule);
            println!("# {}: invalid schedule '{}'", name, schedule);
            continue;
        }

        println!(
            "{} {} --config {} run {}",
            schedule.trim(),
            cron_quote(&bin),
            cron_quote(&config),
            cron_quote(name)
        );
    }

    Ok(())
}

/// Five time fields, or a macro such as `@daily`
fn is_cron_schedule(schedule: &str) -> bool {
    let schedule = schedule.trim();
    if schedule.starts_with('@') {
        return !schedule.contains(char::is_whitespace);
    }
    schedule.split_whitespace().count() == 5
}

/// Quote for `sh`; cron additionally treats `%` as a newline
fn cron_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:=,@".contains(c));
    let quoted = if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    };
    quoted.replace('%', r"\%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_quote() {
        assert_eq!(cron_quote("/usr/local/bin/pagecast"), "/usr/local/bin/pagecast");
        assert_eq!(cron_quote("/home/me/My Vault/pagecast.toml"), "'/home/me/My Vault/pagecast.toml'");
        assert_eq!(cron_quote("it's"), r"'it'\''s'");
        assert_eq!(cron_quote("100%"), r"'100\%'");
        assert_eq!(cron_quote(""), "''");
    }

    #[test]
    fn test_is_cron_schedule() {
        assert!(is_cron_schedule("0 22 * * 6"));
        assert!(is_cron_schedule("  5 0 * * *  "));
        assert!(is_cron_schedule("@daily"));
        assert!(!is_cron_schedule("0 22 * *"));
        assert!(!is_cron_schedule("@every day"));
    }
}
