//! Escape sequence tests

use super::helpers::{blocks, simple_context};
use super::*;

fn render(text: &str) -> String {
    resolve(&blocks(text), &simple_context()).text
}

#[test]
fn test_escaped_marker_is_literal() {
    assert_eq!(render(r"Literal: \{{title}}"), "Literal: {{title}}");
}

#[test]
fn test_escape_with_spaces() {
    assert_eq!(render(r"Literal: \{{ title }}"), "Literal: {{ title }}");
}

#[test]
fn test_double_backslash_keeps_one_and_substitutes() {
    assert_eq!(render(r"Backslash: \\{{title}}"), r"Backslash: \My Title");
}

#[test]
fn test_triple_backslash_is_escaped() {
    assert_eq!(render(r"\\\{{title}}"), r"\{{title}}");
}

#[test]
fn test_backslashes_elsewhere_are_untouched() {
    assert_eq!(render(r"C:\notes\ {{title}}"), r"C:\notes\ My Title");
}

#[test]
fn test_escaped_marker_content_is_not_validated() {
    // Not a valid name, but escaped markers are plain text
    assert_eq!(render(r"\{{ not a name! }}"), "{{ not a name! }}");
}

#[test]
fn test_escaped_marker_is_not_a_placeholder() {
    let parsed = blocks(r"\{{title}}");
    assert!(parsed.iter().all(|b| b.as_placeholder().is_none()));
}

#[test]
fn test_escaped_close_braces_are_literal() {
    assert_eq!(render(r"a \}} b"), "a }} b");
}

#[test]
fn test_escaped_marker_unclosed_is_error() {
    let result = parse(r"Before \{{title after", &Default::default());
    match result {
        Err(TemplateError::MalformedSyntax { message, .. }) => {
            assert!(message.contains("Unclosed"));
        }
        other => panic!("expected MalformedSyntax, got {:?}", other),
    }
}
