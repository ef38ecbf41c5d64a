//! Environment isolation utilities for testing
//!
//! Tests that read configuration from the process environment must not see
//! each other's variables, nor the developer's own `PAGECAST_*` settings.

use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// Static mutex to serialize tests that modify environment variables
pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Variables cleared for the duration of [`with_isolated_env`]
pub const ISOLATED_VARS: &[&str] = &[
    "PAGECAST_CONFIG",
    "PAGECAST_VAULT",
    "PAGECAST_LOG",
    "DROPBOX_ACCESS_TOKEN",
];

/// Run a test with every pagecast variable unset and an isolated HOME
///
/// `vars` are set after clearing; everything is restored afterwards, even if
/// the closure panics. The closure receives the fake HOME directory.
///
/// # Examples
///
/// ```no_run
/// use pagecast_testkit::with_isolated_env;
///
/// with_isolated_env(&[("PAGECAST_VAULT", "/tmp/vault")], |_home| {
///     assert_eq!(std::env::var("PAGECAST_VAULT").unwrap(), "/tmp/vault");
///     assert!(std::env::var("PAGECAST_CONFIG").is_err());
/// });
/// ```
pub fn with_isolated_env<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce(&Path) -> R,
{
    let _guard = ENV_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let fake_home = TempDir::new().expect("Failed to create isolated HOME");

    let mut touched: Vec<&str> = ISOLATED_VARS.to_vec();
    touched.push("HOME");
    touched.extend(vars.iter().map(|(key, _)| *key));
    let saved: Vec<(String, Option<String>)> = touched
        .iter()
        .map(|key| (key.to_string(), std::env::var(key).ok()))
        .collect();

    // SAFETY: We hold ENV_LOCK, ensuring no other test is modifying env vars concurrently.
    unsafe {
        for key in ISOLATED_VARS {
            std::env::remove_var(key);
        }
        std::env::set_var("HOME", fake_home.path());
        for (key, value) in vars {
            std::env::set_var(key, value);
        }
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(fake_home.path())));

    // SAFETY: We still hold ENV_LOCK, ensuring exclusive access to env vars.
    unsafe {
        for (key, value) in &saved {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}
