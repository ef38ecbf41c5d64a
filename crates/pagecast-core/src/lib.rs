// Core modules
pub mod config;
pub mod error;
pub mod naming;
pub mod orchestrator;
pub mod path;
pub mod period;
pub mod storage;
pub mod template;

// Re-export commonly used types
pub use error::{PagecastError, Result};
pub use orchestrator::{Orchestrator, RunOutcome};
