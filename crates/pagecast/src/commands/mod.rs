//! CLI command implementations

pub mod check;
pub mod crontab;
pub mod list;
pub mod plan;
pub mod run;
