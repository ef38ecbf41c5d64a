//! Placeholder resolution

use super::{Block, PlaceholderClass};
use crate::period::{Period, PeriodKey};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Default rendering of [`ContextValue::Date`]
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// A value placeholders can be bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Date(NaiveDate),
}

impl ContextValue {
    /// Render with an optional strftime format
    ///
    /// Formats only apply to dates; text is emitted unchanged.
    pub fn render(&self, format: Option<&str>) -> String {
        match self {
            ContextValue::Text(text) => text.clone(),
            ContextValue::Date(date) => {
                let format = format.unwrap_or(DEFAULT_DATE_FORMAT);
                let mut out = String::new();
                let datetime = date.and_time(NaiveTime::MIN);
                if write!(out, "{}", datetime.format(format)).is_err() {
                    return date.format(DEFAULT_DATE_FORMAT).to_string();
                }
                out
            }
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<NaiveDate> for ContextValue {
    fn from(value: NaiveDate) -> Self {
        ContextValue::Date(value)
    }
}

/// Placeholder name → value, built fresh for every render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    values: BTreeMap<String, ContextValue>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any earlier value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ContextValue> {
        self.values.get(name)
    }

    /// Bind `<prefix>.key|start|end|year|month|week|day` for `period`
    ///
    /// `year` and `week` are ISO week-numbering values for weekly periods and
    /// calendar values otherwise; all numbers describe the period start.
    pub fn insert_period(&mut self, prefix: &str, period: &Period) {
        let start = period.start;
        let year = match period.key {
            PeriodKey::Week { iso_year, .. } => iso_year,
            _ => start.year(),
        };
        self.insert(format!("{}.key", prefix), period.key.to_string());
        self.insert(format!("{}.start", prefix), period.start);
        self.insert(format!("{}.end", prefix), period.end);
        self.insert(format!("{}.year", prefix), format!("{:04}", year));
        self.insert(format!("{}.month", prefix), format!("{:02}", start.month()));
        self.insert(format!("{}.week", prefix), format!("{:02}", start.iso_week().week()));
        self.insert(format!("{}.day", prefix), format!("{:02}", start.day()));
    }
}

/// Output of [`resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub text: String,
    /// Required placeholders with no value, sorted and deduplicated
    pub unresolved_required: BTreeSet<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.unresolved_required.is_empty()
    }
}

/// Substitute every placeholder of `blocks` from `context`
///
/// Values are inserted verbatim and never rescanned. A missing optional
/// placeholder keeps its marker text as authored; a missing required one is
/// recorded and rendered as its marker too, so the text stays inspectable.
pub fn resolve(blocks: &[Block], context: &RenderContext) -> Resolution {
    let mut text = String::new();
    let mut unresolved_required = BTreeSet::new();

    for block in blocks {
        match block {
            Block::Literal(literal) => text.push_str(literal),
            Block::Placeholder(placeholder) => match context.get(&placeholder.name) {
                Some(value) => text.push_str(&value.render(placeholder.format.as_deref())),
                None => {
                    if placeholder.class == PlaceholderClass::Required {
                        unresolved_required.insert(placeholder.name.clone());
                    }
                    text.push_str(&placeholder.raw);
                }
            },
        }
    }

    Resolution {
        text,
        unresolved_required,
    }
}
