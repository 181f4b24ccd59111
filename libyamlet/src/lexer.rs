//! Phase 1: Lexer
//!
//! The lexer converts source text into a flat token vector. It:
//! - Splits lines, rejecting carriage returns without a line feed
//! - Emits an explicit `Indent` token at the start of every line
//! - Recognizes document markers, dashes, colons, and block indicators
//! - Drops comments
//!
//! Every token records its byte offset, byte length, and the character
//! column it starts at. Text, spaces, and indent tokens borrow their
//! literal slice of the source.

use crate::error::{Error, Result};
use crate::node::Run;

/// Token kind in the lexer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Sentinel after the last real token.
    End,
    /// `---` at the start of a line.
    DocumentStart,
    /// `...` at the start of a line.
    DocumentEnd,
    /// Leading spaces of a line, possibly zero of them.
    Indent,
    /// Spaces in the middle of a line.
    Spaces,
    /// A line break, `\n` or `\r\n`.
    Line,
    /// Key/value separator.
    Colon,
    /// Sequence entry indicator.
    Dash,
    /// A run of scalar text.
    Text,
    /// `|`
    BlockIndicator,
    /// `|-`
    BlockIndicatorChomped,
    /// `>`
    FoldedIndicator,
    /// `>-`
    FoldedIndicatorChomped,
}

impl TokenKind {
    /// Returns `true` for the four block scalar indicators.
    pub fn is_indicator(self) -> bool {
        matches!(
            self,
            TokenKind::BlockIndicator
                | TokenKind::BlockIndicatorChomped
                | TokenKind::FoldedIndicator
                | TokenKind::FoldedIndicatorChomped
        )
    }
}

/// A single token in the token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub start: usize,
    pub length: usize,
    /// Characters since the most recent line start.
    pub column: usize,
    /// Literal source for text, spaces, and indent tokens; empty otherwise.
    pub value: &'a str,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, start: usize, length: usize, column: usize, value: &'a str) -> Self {
        Self {
            kind,
            start,
            length,
            column,
            value,
        }
    }

    fn punct(kind: TokenKind, start: usize, length: usize, column: usize) -> Self {
        Self::new(kind, start, length, column, "")
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn run(&self) -> Run {
        Run::new(self.start, self.length)
    }

    /// The token's spelling in the source.
    pub fn text(&self) -> &'a str {
        match self.kind {
            TokenKind::Text | TokenKind::Spaces | TokenKind::Indent => self.value,
            TokenKind::End => "",
            TokenKind::DocumentStart => "---",
            TokenKind::DocumentEnd => "...",
            TokenKind::Line if self.length == 2 => "\r\n",
            TokenKind::Line => "\n",
            TokenKind::Colon => ":",
            TokenKind::Dash => "-",
            TokenKind::BlockIndicator => "|",
            TokenKind::BlockIndicatorChomped => "|-",
            TokenKind::FoldedIndicator => ">",
            TokenKind::FoldedIndicatorChomped => ">-",
        }
    }
}

/// Convert source text to a token vector ending in a single `End` token.
pub fn lex(text: &str) -> Result<Vec<Token<'_>>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut here = 0;
    let mut col = 0;

    if bytes.first() == Some(&b' ') {
        return Err(Error::LeadingIndent);
    }

    // The first line gets the same explicit indent every other line does.
    tokens.push(Token::new(TokenKind::Indent, 0, 0, 0, ""));

    while here < bytes.len() {
        match bytes[here] {
            b'-' if col == 0 && is_marker(bytes, here, b'-') => {
                tokens.push(Token::punct(TokenKind::DocumentStart, here, 3, col));
                here += 3;
                col += 3;
            }
            b'.' if col == 0 && is_marker(bytes, here, b'.') => {
                tokens.push(Token::punct(TokenKind::DocumentEnd, here, 3, col));
                here += 3;
                col += 3;
            }
            b'-' if is_blank_at(bytes, here + 1) => {
                tokens.push(Token::punct(TokenKind::Dash, here, 1, col));
                here += 1;
                col += 1;
            }
            b' ' => {
                let len = count_spaces(bytes, here);
                tokens.push(Token::new(
                    TokenKind::Spaces,
                    here,
                    len,
                    col,
                    &text[here..here + len],
                ));
                here += len;
                col += len;
            }
            b'\r' | b'\n' => {
                let len = if bytes[here] == b'\r' {
                    if bytes.get(here + 1) != Some(&b'\n') {
                        return Err(Error::BareCarriageReturn { offset: here });
                    }
                    2
                } else {
                    1
                };
                tokens.push(Token::punct(TokenKind::Line, here, len, col));
                here += len;

                let indent = count_spaces(bytes, here);
                tokens.push(Token::new(
                    TokenKind::Indent,
                    here,
                    indent,
                    0,
                    &text[here..here + indent],
                ));
                here += indent;
                col = indent;
            }
            b':' => {
                tokens.push(Token::punct(TokenKind::Colon, here, 1, col));
                here += 1;
                col += 1;
            }
            b'#' => {
                // Comments run to the line break, which is lexed normally.
                let from = here;
                while here < bytes.len() && bytes[here] != b'\r' && bytes[here] != b'\n' {
                    here += 1;
                }
                col += text[from..here].chars().count();
            }
            b @ (b'|' | b'>') => {
                let chomped = bytes.get(here + 1) == Some(&b'-');
                let kind = match (b, chomped) {
                    (b'|', false) => TokenKind::BlockIndicator,
                    (b'|', true) => TokenKind::BlockIndicatorChomped,
                    (_, false) => TokenKind::FoldedIndicator,
                    (_, true) => TokenKind::FoldedIndicatorChomped,
                };
                let len = if chomped { 2 } else { 1 };
                tokens.push(Token::punct(kind, here, len, col));
                here += len;
                col += len;
            }
            _ => {
                let start = here;
                here = scan_text(bytes, here);
                let value = &text[start..here];
                tokens.push(Token::new(TokenKind::Text, start, here - start, col, value));
                col += value.chars().count();
            }
        }
    }

    tokens.push(Token::punct(TokenKind::End, here, 0, col));
    Ok(tokens)
}

/// Whether the byte at `i` ends a token: space, line break, or end of input.
fn is_blank_at(bytes: &[u8], i: usize) -> bool {
    matches!(bytes.get(i), None | Some(b' ' | b'\r' | b'\n'))
}

/// Whether `bytes[i..]` holds a three-character document marker.
fn is_marker(bytes: &[u8], i: usize, mark: u8) -> bool {
    bytes.len() >= i + 3
        && bytes[i..i + 3].iter().all(|&b| b == mark)
        && is_blank_at(bytes, i + 3)
}

/// Count consecutive spaces starting at `i`.
fn count_spaces(bytes: &[u8], i: usize) -> usize {
    bytes[i..].iter().take_while(|&&b| b == b' ').count()
}

/// Find the end of a text run starting at `i`.
///
/// A colon only ends the run when a blank follows it, so `a:b` stays whole.
/// Every terminator is ASCII, so the returned offset is a char boundary.
fn scan_text(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\r' | b'\n' => break,
            b':' if is_blank_at(bytes, i + 1) => break,
            _ => i += 1,
        }
    }
    i
}
