//! Template module - pure text substitution for recurring pages
//!
//! A template body is Markdown with placeholder markers. Bodies are parsed once
//! into [`Block`]s when the template is loaded; rendering then walks the blocks
//! and never rescans substituted values.
//!
//! ## Syntax
//!
//! - Placeholders: `{{name}}` or `{{ name }}` (spaces optional)
//! - Dotted names: `{{ period.start }}`, `{{ prior.last.title }}`
//! - Date formats: `{{ period.end | %B %-d, %Y }}` (strftime, dates only)
//! - Escape sequences: `\{{literal}}` renders `{{literal}}`; `\\{{name}}`
//!   renders a backslash followed by the value
//! - Prose between braces, `{{ write your goal here }}`, is left as written
//!
//! No loops, conditionals or expressions.

pub mod error;
mod parse;
mod registry;
mod resolve;
mod tokenize;

#[cfg(test)]
mod tests;

pub use error::TemplateError;
pub use parse::{is_valid_date_format, is_valid_name, parse};
pub use registry::{PriorRef, SequenceRule, TemplatePage, TemplateRegistry};
pub use resolve::{resolve, ContextValue, RenderContext, Resolution, DEFAULT_DATE_FORMAT};

use serde::Serialize;

/// Whether a placeholder may be left unresolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderClass {
    /// Missing value fails the render
    Required,
    /// Missing value keeps the marker text as authored
    Optional,
}

/// One `{{ ... }}` marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub name: String,
    /// strftime format applied to date values
    pub format: Option<String>,
    pub class: PlaceholderClass,
    /// Marker text exactly as authored, braces included
    pub raw: String,
    pub line: usize,
}

/// Parsed piece of a template body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Block {
    Literal(String),
    Placeholder(Placeholder),
}

impl Block {
    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Block::Placeholder(placeholder) => Some(placeholder),
            Block::Literal(_) => None,
        }
    }
}
