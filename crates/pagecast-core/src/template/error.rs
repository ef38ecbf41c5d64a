//! Template parse errors

use std::fmt;

/// Errors raised while parsing a template body
///
/// Rendering itself cannot fail: missing values are reported through
/// [`Resolution`](super::Resolution) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Marker syntax is broken (unclosed, stray or nested braces)
    MalformedSyntax {
        /// Error message
        message: String,
        /// Line number where the error occurred
        line: usize,
    },

    /// Placeholder name is empty or uses characters outside `[A-Za-z0-9_.-]`
    InvalidName {
        /// The name as written
        name: String,
        /// Line number where the error occurred
        line: usize,
    },

    /// Date format is not a valid strftime string
    InvalidFormat {
        /// The format as written
        format: String,
        /// Line number where the error occurred
        line: usize,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::MalformedSyntax { message, line } => {
                write!(f, "Malformed syntax at line {}: {}", line, message)
            }
            TemplateError::InvalidName { name, line } => {
                write!(f, "Invalid placeholder name '{}' at line {}", name, line)
            }
            TemplateError::InvalidFormat { format, line } => {
                write!(f, "Invalid date format '{}' at line {}", format, line)
            }
        }
    }
}

impl std::error::Error for TemplateError {}
