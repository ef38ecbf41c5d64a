//! Mock server infrastructure for testing
//!
//! A single shared mockito server serves every HTTP test in a test binary.
//! Tests stay independent by mocking distinct paths or request bodies.

use lazy_static::lazy_static;
use mockito::{Server, ServerGuard};
use std::sync::Mutex;

lazy_static! {
    /// Global shared mockito server for all tests
    ///
    /// This server is initialized once and shared across all test threads.
    pub static ref SHARED_MOCK_SERVER: Mutex<ServerGuard> = Mutex::new(Server::new());
}

/// Get reference to shared mock server
///
/// The server is initialized lazily on first access.
///
/// # Best Practices for Avoiding Mock Collisions
///
/// 1. **Use unique matchers per test**: Different tests should match on
///    different request bodies or headers (e.g. a vault root per test)
/// 2. **Mock cleanup is automatic**: Mocks are removed when the Mock object drops
/// 3. **Lock scope matters**: Acquire the server lock only during mock setup,
///    not during the entire test execution
///
/// # Examples
///
/// ```no_run
/// use pagecast_testkit::get_shared_mock_server;
///
/// fn test_with_shared_server() {
///     // Acquire lock only for mock setup
///     let mock = {
///         let mut server = get_shared_mock_server();
///         server
///             .mock("POST", "/2/files/get_metadata")
///             .match_body(mockito::Matcher::Regex("/unique-root/".to_string()))
///             .with_status(200)
///             .create()
///     }; // Lock released here
///
///     // Test logic runs with server unlocked
/// }
/// ```
pub fn get_shared_mock_server() -> std::sync::MutexGuard<'static, ServerGuard> {
    SHARED_MOCK_SERVER.lock().unwrap_or_else(|poisoned| {
        // Mockito stays functional after a panic; the lock only serializes setup
        poisoned.into_inner()
    })
}
