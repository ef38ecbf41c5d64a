//! Parse a template body into blocks

use super::error::TemplateError;
use super::tokenize::{TokenKind, TokenStream};
use super::{Block, Placeholder, PlaceholderClass};
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeSet;
use std::fmt::Write;

/// Parse `text` into literal and placeholder blocks
///
/// Names listed in `optional` are classed [`PlaceholderClass::Optional`];
/// every other placeholder is required. Adjacent literal text is merged.
pub fn parse(text: &str, optional: &BTreeSet<String>) -> Result<Vec<Block>, TemplateError> {
    let mut blocks = Vec::new();
    let mut literal = String::new();
    let mut cursor = 0;

    for token in TokenStream::new(text) {
        let token = token?;
        let text_end = token.start - token.backslash_count;
        literal.push_str(&text[cursor..text_end]);

        // Backslashes before a marker are halved
        for _ in 0..(token.backslash_count / 2) {
            literal.push('\\');
        }

        let raw = &text[token.start..token.end];
        cursor = token.end;

        if token.is_escaped() {
            literal.push_str(raw);
            continue;
        }

        match token.kind {
            TokenKind::CloseBraces => {
                return Err(TemplateError::MalformedSyntax {
                    message: "Unexpected '}}' without a matching '{{'".to_string(),
                    line: token.line,
                });
            }
            TokenKind::Marker { content } => {
                let Some(placeholder) = parse_marker(&text[content], raw, token.line, optional)?
                else {
                    literal.push_str(raw);
                    continue;
                };
                if !literal.is_empty() {
                    blocks.push(Block::Literal(std::mem::take(&mut literal)));
                }
                blocks.push(Block::Placeholder(placeholder));
            }
        }
    }

    literal.push_str(&text[cursor..]);
    if !literal.is_empty() {
        blocks.push(Block::Literal(literal));
    }

    Ok(blocks)
}

/// `name` or `name | format`
///
/// Prose between braces, such as `{{ write your goal here }}`, is an author's
/// fill-in blank rather than a placeholder and yields `None`.
fn parse_marker(
    content: &str,
    raw: &str,
    line: usize,
    optional: &BTreeSet<String>,
) -> Result<Option<Placeholder>, TemplateError> {
    let (name, format) = match content.split_once('|') {
        Some((name, format)) => (name.trim(), Some(format.trim())),
        None => (content.trim(), None),
    };

    if format.is_none() && name.contains(char::is_whitespace) {
        return Ok(None);
    }

    if !is_valid_name(name) {
        return Err(TemplateError::InvalidName {
            name: name.to_string(),
            line,
        });
    }

    if let Some(format) = format {
        if !is_valid_date_format(format) {
            return Err(TemplateError::InvalidFormat {
                format: format.to_string(),
                line,
            });
        }
    }

    let class = if optional.contains(name) {
        PlaceholderClass::Optional
    } else {
        PlaceholderClass::Required
    };

    Ok(Some(Placeholder {
        name: name.to_string(),
        format: format.map(str::to_string),
        class,
        raw: raw.to_string(),
        line,
    }))
}

/// Dotted identifier: non-empty segments of `[A-Za-z0-9_-]`
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}

/// A strftime string that formats a calendar date without error
///
/// Time fields render as midnight; offset and timezone fields are rejected
/// since dates carry no zone.
pub fn is_valid_date_format(format: &str) -> bool {
    if format.is_empty() || StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return false;
    }
    let Some(sample) = NaiveDate::from_ymd_opt(2026, 1, 1) else {
        return false;
    };
    let mut out = String::new();
    write!(out, "{}", sample.and_time(NaiveTime::MIN).format(format)).is_ok()
}
