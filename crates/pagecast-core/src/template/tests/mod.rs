//! Tests for template parsing and resolution
//!
//! Organized into focused submodules like the rendering pipeline itself.

use super::*;

// Test helper functions
mod helpers;


// Parsing and rendering tests
mod escaping;
