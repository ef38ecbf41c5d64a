//! CLI command structure using clap

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pagecast")]
#[command(version, about = "Create recurring vault pages from templates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file (default: nearest pagecast.toml)
    #[arg(long, global = true, env = "PAGECAST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Vault root, overriding `storage.root`
    #[arg(long, global = true, env = "PAGECAST_VAULT")]
    pub vault: Option<String>,

    /// Access token for the Dropbox backend
    #[arg(long, global = true, env = "DROPBOX_ACCESS_TOKEN", hide_env_values = true)]
    pub dropbox_token: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the page of a template for the current period
    Run {
        /// Template name from pagecast.toml
        template: String,

        /// Act as if invoked at this instant (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,

        /// Render without writing to the vault
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        json: bool,
    },

    /// Show the period and destination of a template without writing
    Plan {
        template: String,

        /// Act as if invoked at this instant (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,

        #[arg(long)]
        json: bool,
    },

    /// List registered templates
    List {
        #[arg(long)]
        json: bool,
    },

    /// Load every template and report problems
    Check {
        #[arg(long)]
        json: bool,
    },

    /// Print cron lines for templates with a schedule
    Crontab {
        /// Program invoked by cron (default: this executable)
        #[arg(long)]
        bin: Option<String>,
    },
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|e| {
            format!(
                "expected an RFC 3339 instant like 2026-10-18T22:00:00-05:00: {}",
                e
            )
        })
}
