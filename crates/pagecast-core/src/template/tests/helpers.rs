//! Shared test helpers for template tests

use crate::template::{parse, Block, ContextValue, RenderContext};
use chrono::NaiveDate;
use std::collections::BTreeSet;

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Parse with every placeholder required
pub(super) fn blocks(text: &str) -> Vec<Block> {
    parse(text, &BTreeSet::new()).unwrap()
}

/// Parse with the given names optional
pub(super) fn blocks_with_optional(text: &str, optional: &[&str]) -> Vec<Block> {
    let optional = optional.iter().map(|s| s.to_string()).collect();
    parse(text, &optional).unwrap()
}

/// A context with a title, a date and a field
pub(super) fn simple_context() -> RenderContext {
    let mut context = RenderContext::new();
    context.insert("title", "My Title");
    context.insert("today", ContextValue::Date(date(2026, 10, 18)));
    context.insert("fields.author", "Sam");
    context
}
