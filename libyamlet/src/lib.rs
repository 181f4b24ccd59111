//! yamlet: a block-style YAML lexer and parser.
//!
//! yamlet reads the block subset of YAML (mappings, sequences, plain,
//! literal, and folded scalars, multi-document streams) and produces a flat
//! stream of structural nodes rather than a value tree.
//!
//! # Parsing Pipeline
//!
//! The parser operates in two phases:
//!
//! 1. **Lexer**: Converts source text into tokens with byte offsets and
//!    character columns, emitting an explicit indent token for every line.
//!
//! 2. **Node Parser**: Recursively descends over the tokens, tracking an
//!    indentation threshold per scope, and emits start/end markers and
//!    scalars in document order.
//!
//! [`YamlReader`] offers the same stream one node at a time.

mod error;
mod lexer;
mod node;
mod parser;
mod reader;

pub use error::{Error, Location, ParseFailure, Result};
pub use lexer::{lex, Token, TokenKind};
pub use node::{Node, NodeKind, Run};
pub use parser::{parse_tokens, parse_tokens_with, Options, DEFAULT_MAX_DEPTH};
pub use reader::{YamlNodeType, YamlReader};

/// Parse YAML text into a node stream.
///
/// # Example
///
/// ```
/// use libyamlet::{parse, NodeKind};
///
/// let nodes = parse("a: b\n").unwrap();
/// assert_eq!(nodes[2].kind, NodeKind::MapStart);
/// assert_eq!(nodes[3].value.as_deref(), Some("a"));
/// ```
pub fn parse(input: &str) -> std::result::Result<Vec<Node>, ParseFailure> {
    parse_with_options(input, &Options::default())
}

/// Parse YAML text into a node stream with explicit parser options.
pub fn parse_with_options(
    input: &str,
    options: &Options,
) -> std::result::Result<Vec<Node>, ParseFailure> {
    // Phase 1: Convert source to tokens
    let tokens = lexer::lex(input)?;

    // Phase 2: Parse tokens into nodes
    parser::parse_tokens_with(&tokens, options)
}
