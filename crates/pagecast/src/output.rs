use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")?;
    Ok(())
}

pub fn print_text(s: &str) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{s}")
}

/// `✓ message`
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// `→ message`
pub fn info(message: &str) {
    println!("{} {}", "→".cyan(), message);
}

/// `! message`
pub fn warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}
