mod cli;
mod commands;
mod context;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Log to stderr; `PAGECAST_LOG` picks the filter unless `--verbose` is given
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pagecast=debug,pagecast_core=debug,warn")
    } else {
        EnvFilter::try_from_env("PAGECAST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let result = match cli.command {
        Commands::Run {
            template,
            at,
            dry_run,
            json,
        } => commands::run::run(&cli.global, &template, at, dry_run, json),
        Commands::Plan { template, at, json } => {
            commands::plan::run(&cli.global, &template, at, json)
        }
        Commands::List { json } => commands::list::run(&cli.global, json),
        Commands::Check { json } => commands::check::run(&cli.global, json),
        Commands::Crontab { bin } => commands::crontab::run(&cli.global, bin),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
