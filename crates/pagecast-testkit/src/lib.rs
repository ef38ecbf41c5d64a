//! Test utilities for pagecast
//!
//! This crate provides shared testing utilities used across the pagecast workspace.

mod env;
mod mock;

pub use env::{ENV_LOCK, ISOLATED_VARS, with_isolated_env};
pub use mock::{SHARED_MOCK_SERVER, get_shared_mock_server};

use tempfile::TempDir;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// This keeps test vaults in a single gitignored location that is easy to
/// clean up manually if needed.
///
/// # Panics
///
/// Panics if the current directory cannot be determined or `.tmp/` cannot be
/// created.
///
/// # Examples
///
/// ```rust
/// use pagecast_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let file_path = temp.path().join("pagecast.toml");
/// std::fs::write(&file_path, "").unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}
