//! Tokenization of `{{ ... }}` markers
//!
//! Single forward pass over the bytes using a small state machine. Only ASCII
//! bytes are significant, so every yielded offset is a char boundary.

use super::error::TemplateError;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// `{{ ... }}` with the byte range of its content
    Marker { content: Range<usize> },

    /// `}}` outside of any marker
    CloseBraces,
}

/// A single token with position and escape information
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Absolute byte position of the first brace
    pub start: usize,
    /// Byte position one past the last brace
    pub end: usize,
    /// Number of backslashes immediately before `start`
    /// Odd count = escaped (literal), even = real (processed)
    pub backslash_count: usize,
    /// Line number where the token starts
    pub line: usize,
}

impl Token {
    pub fn is_escaped(&self) -> bool {
        self.backslash_count % 2 == 1
    }
}

/// Scanner state
///
/// ```text
/// Normal ──{──> SeenLBrace ──{──> InToken ──}──> SeenRBrace ──}──> [Marker] → Normal
///   │                                │  └──{{──> error (nested)
///   └──}──> SeenStrayRBrace ──}──> [CloseBraces] → Normal
///
/// End of input inside a marker → error (unclosed)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScanState {
    Normal {
        backslash_count: usize,
    },
    SeenLBrace {
        pos: usize,
        backslash_count: usize,
    },
    SeenStrayRBrace {
        pos: usize,
        backslash_count: usize,
    },
    InToken {
        start: usize,
        content_start: usize,
        backslash_count: usize,
        line: usize,
    },
    SeenRBrace {
        start: usize,
        content_start: usize,
        rbrace_pos: usize,
        backslash_count: usize,
        line: usize,
    },
}

pub(crate) struct TokenStream<'a> {
    bytes: &'a [u8],
    pos: usize,
    state: ScanState,
    line: usize,
    failed: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            state: ScanState::Normal { backslash_count: 0 },
            line: 1,
            failed: false,
        }
    }

    fn fail(&mut self, message: &str, line: usize) -> Option<Result<Token, TemplateError>> {
        self.failed = true;
        Some(Err(TemplateError::MalformedSyntax {
            message: message.to_string(),
            line,
        }))
    }

    fn process_normal(&mut self, byte: u8, backslash_count: usize) {
        self.state = match byte {
            b'\\' => ScanState::Normal {
                backslash_count: backslash_count + 1,
            },
            b'{' => ScanState::SeenLBrace {
                pos: self.pos,
                backslash_count,
            },
            b'}' => ScanState::SeenStrayRBrace {
                pos: self.pos,
                backslash_count,
            },
            _ => {
                if byte == b'\n' {
                    self.line += 1;
                }
                ScanState::Normal { backslash_count: 0 }
            }
        };
        self.pos += 1;
    }

    /// Returns false if the byte must be reprocessed in `Normal`
    fn process_seen_lbrace(&mut self, byte: u8, lbrace_pos: usize, backslash_count: usize) -> bool {
        if byte == b'{' {
            self.state = ScanState::InToken {
                start: lbrace_pos,
                content_start: self.pos + 1,
                backslash_count,
                line: self.line,
            };
            self.pos += 1;
            true
        } else {
            self.state = ScanState::Normal { backslash_count: 0 };
            false
        }
    }

    fn process_seen_stray(&mut self, byte: u8, rbrace_pos: usize, backslash_count: usize) -> Option<Token> {
        if byte == b'}' {
            self.state = ScanState::Normal { backslash_count: 0 };
            self.pos += 1;
            Some(Token {
                kind: TokenKind::CloseBraces,
                start: rbrace_pos,
                end: self.pos,
                backslash_count,
                line: self.line,
            })
        } else {
            self.state = ScanState::Normal { backslash_count: 0 };
            None
        }
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Result<Token, TemplateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while self.pos < self.bytes.len() {
            let byte = self.bytes[self.pos];

            match self.state.clone() {
                ScanState::Normal { backslash_count } => self.process_normal(byte, backslash_count),
                ScanState::SeenLBrace {
                    pos,
                    backslash_count,
                } => {
                    self.process_seen_lbrace(byte, pos, backslash_count);
                }
                ScanState::SeenStrayRBrace {
                    pos,
                    backslash_count,
                } => {
                    if let Some(token) = self.process_seen_stray(byte, pos, backslash_count) {
                        return Some(Ok(token));
                    }
                }
                ScanState::InToken {
                    start,
                    content_start,
                    backslash_count,
                    line,
                } => match byte {
                    b'}' => {
                        self.state = ScanState::SeenRBrace {
                            start,
                            content_start,
                            rbrace_pos: self.pos,
                            backslash_count,
                            line,
                        };
                        self.pos += 1;
                    }
                    b'{' if self.bytes.get(self.pos + 1) == Some(&b'{') => {
                        let current = self.line;
                        return self.fail("Nested '{{' inside a placeholder", current);
                    }
                    _ => {
                        if byte == b'\n' {
                            self.line += 1;
                        }
                        self.pos += 1;
                    }
                },
                ScanState::SeenRBrace {
                    start,
                    content_start,
                    rbrace_pos,
                    backslash_count,
                    line,
                } => {
                    if byte == b'}' {
                        self.state = ScanState::Normal { backslash_count: 0 };
                        self.pos += 1;
                        return Some(Ok(Token {
                            kind: TokenKind::Marker {
                                content: content_start..rbrace_pos,
                            },
                            start,
                            end: self.pos,
                            backslash_count,
                            line,
                        }));
                    }
                    // A lone '}' inside content, reprocess in InToken
                    self.state = ScanState::InToken {
                        start,
                        content_start,
                        backslash_count,
                        line,
                    };
                }
            }
        }

        match self.state {
            ScanState::InToken { line, .. } | ScanState::SeenRBrace { line, .. } => {
                self.fail("Unclosed placeholder", line)
            }
            _ => None,
        }
    }
}
