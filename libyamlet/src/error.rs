//! Error types for lexing and parsing.

use std::fmt;

use thiserror::Error;

use crate::lexer::TokenKind;
use crate::node::{Node, NodeKind};

/// Result type for lexer and parser internals.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for yamlet. Every error is fatal to the call that raised it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The text starts with a space, so the first line has no anchor.
    #[error("Content cannot start with indentation")]
    LeadingIndent,

    /// A carriage return not followed by a line feed.
    #[error("Carriage return without line feed at offset {offset}")]
    BareCarriageReturn { offset: usize },

    /// A token the current parse function has no rule for.
    #[error("Unexpected token {kind:?} at offset {offset}")]
    UnexpectedToken { kind: TokenKind, offset: usize },

    /// A leaf of a kind the caller did not contract for.
    #[error("Unexpected {kind} at offset {offset} in {context}")]
    UnexpectedNode {
        kind: NodeKind,
        offset: usize,
        context: &'static str,
    },

    /// The parser would re-read the same position.
    #[error("No progress at offset {offset}")]
    NoProgress { offset: usize },

    /// Nesting went past the configured frame limit.
    #[error("Nesting deeper than {limit} levels at offset {offset}")]
    DepthExceeded { limit: usize, offset: usize },

    /// A frame was popped that was never pushed.
    #[error("Parser frame stack underflow")]
    StackUnderflow,

    /// A mapping key at or left of its enclosing scope's threshold.
    #[error("Key at column {column} must be indented past column {threshold} at offset {offset}")]
    KeyNotIndented {
        column: usize,
        threshold: isize,
        offset: usize,
    },

    /// A mapping key off its siblings' column.
    #[error("Expected column {expected}, found column {column} at offset {offset}")]
    Misaligned {
        column: usize,
        expected: usize,
        offset: usize,
    },
}

impl Error {
    /// The source offset the error points at, if it has one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::LeadingIndent => Some(0),
            Error::BareCarriageReturn { offset }
            | Error::UnexpectedToken { offset, .. }
            | Error::UnexpectedNode { offset, .. }
            | Error::NoProgress { offset }
            | Error::DepthExceeded { offset, .. }
            | Error::KeyNotIndented { offset, .. }
            | Error::Misaligned { offset, .. } => Some(*offset),
            Error::StackUnderflow => None,
        }
    }
}

/// A failed parse, with the nodes emitted before the failure.
///
/// `partial` is for diagnostics only; it is not a valid node stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct ParseFailure {
    pub error: Error,
    pub partial: Vec<Node>,
}

impl From<Error> for ParseFailure {
    fn from(error: Error) -> Self {
        Self {
            error,
            partial: Vec::new(),
        }
    }
}

/// A 0-based line and column resolved from a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Resolve `offset` against `source`. Columns count characters.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count();
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}
