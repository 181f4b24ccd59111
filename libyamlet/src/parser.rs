//! Phase 2: Node Parser
//!
//! The node parser walks the token vector by recursive descent and appends
//! structural nodes to one output vector. Each parse function takes a
//! `min_indent` threshold: content belongs to the current scope only while
//! its line is indented past the threshold. When a line falls back to or
//! below it, the leaf scan reports `Dedent` without consuming anything, so
//! the scope closes and the caller decides whether its own scope goes on.
//!
//! Parse functions return the token index parsing resumes at.

use tracing::trace;

use crate::error::{Error, ParseFailure, Result};
use crate::lexer::{Token, TokenKind};
use crate::node::{Node, NodeKind, Run};

/// Frame limit used by [`Options::default`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parser configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Maximum number of nested parse frames before giving up.
    pub max_depth: usize,
}

impl Options {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parse a token vector with default options.
pub fn parse_tokens(tokens: &[Token<'_>]) -> std::result::Result<Vec<Node>, ParseFailure> {
    parse_tokens_with(tokens, &Options::default())
}

/// Parse a token vector into a node stream.
///
/// On failure the nodes emitted so far come back inside the error.
pub fn parse_tokens_with(
    tokens: &[Token<'_>],
    options: &Options,
) -> std::result::Result<Vec<Node>, ParseFailure> {
    let mut parser = Parser::new(tokens, options);
    match parser.parse_stream() {
        Ok(()) => Ok(parser.nodes),
        Err(error) => {
            trace!(%error, emitted = parser.nodes.len(), "parse failed");
            Err(ParseFailure {
                error,
                partial: parser.nodes,
            })
        }
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// How a scalar was introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    Literal,
    Folded,
}

/// Whether a block scalar keeps its final line break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chomp {
    Clip,
    Strip,
}

/// One leaf found by [`Parser::scan_leaf`].
///
/// `Scalar` leaves carry their materialized value. Marker leaves (`DocStart`,
/// `DocEnd`, `SeqStart` for a dash) cover exactly their token. `End` and
/// `Dedent` consume nothing: `next` is where the scan began.
#[derive(Debug)]
struct Leaf {
    kind: NodeKind,
    /// Token index the leaf's content begins at.
    first: usize,
    /// Token index parsing resumes at.
    next: usize,
    /// Column of the first content token.
    indent: usize,
    run: Run,
    value: Option<String>,
    style: Style,
}

impl Leaf {
    fn marker(kind: NodeKind, at: usize, token: &Token<'_>) -> Self {
        Self {
            kind,
            first: at,
            next: at + 1,
            indent: token.column,
            run: token.run(),
            value: None,
            style: Style::Plain,
        }
    }

    fn boundary(kind: NodeKind, at: usize, start: usize, token: &Token<'_>) -> Self {
        Self {
            kind,
            first: at,
            next: start,
            indent: token.column,
            run: Run::empty(token.start),
            value: None,
            style: Style::Plain,
        }
    }

    /// End of input, a dedent, or a document marker: nothing more for the
    /// current scope.
    fn closes_scope(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::End | NodeKind::Dedent | NodeKind::DocStart | NodeKind::DocEnd
        )
    }

    fn into_node(self) -> Node {
        Node::new(self.kind, self.run, self.value)
    }
}

/// One line of a block scalar body.
#[derive(Debug)]
enum BlockLine {
    Blank,
    Content(String),
}

// ============================================================================
// Parser
// ============================================================================

struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    /// Stand-in for reads past the last token.
    end: Token<'a>,
    nodes: Vec<Node>,
    depth: usize,
    max_depth: usize,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn new(tokens: &'t [Token<'a>], options: &Options) -> Self {
        let at = tokens.last().map_or(0, |t| t.end());
        Self {
            tokens,
            end: Token {
                kind: TokenKind::End,
                start: at,
                length: 0,
                column: 0,
                value: "",
            },
            nodes: Vec::new(),
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    fn token(&self, i: usize) -> &Token<'a> {
        self.tokens.get(i).unwrap_or(&self.end)
    }

    fn kind(&self, i: usize) -> TokenKind {
        self.token(i).kind
    }

    /// Byte offset where everything before token `i` ends.
    fn position(&self, i: usize) -> usize {
        match i.checked_sub(1) {
            Some(prev) => self.token(prev).end(),
            None => 0,
        }
    }

    fn emit(&mut self, node: Node) {
        trace!(depth = self.depth, node = %node, "emit");
        self.nodes.push(node);
    }

    fn enter(&mut self, at: usize) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::DepthExceeded {
                limit: self.max_depth,
                offset: self.token(at).start,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) -> Result<()> {
        self.depth = self.depth.checked_sub(1).ok_or(Error::StackUnderflow)?;
        Ok(())
    }

    /// Move from `here` to `next`, refusing to stand still.
    fn advance(&self, here: usize, next: usize) -> Result<usize> {
        if next <= here {
            return Err(Error::NoProgress {
                offset: self.token(here).start,
            });
        }
        Ok(next)
    }

    fn unexpected(&self, leaf: &Leaf, context: &'static str) -> Error {
        Error::UnexpectedNode {
            kind: leaf.kind,
            offset: leaf.run.start(),
            context,
        }
    }

    // ========================================================================
    // Structure
    // ========================================================================

    fn parse_stream(&mut self) -> Result<()> {
        self.enter(0)?;
        trace!(depth = self.depth, "parse stream");
        self.emit(Node::marker(NodeKind::StreamStart, 0));

        let mut here = 0;
        loop {
            let leaf = self.scan_leaf(here, -1)?;
            if leaf.kind == NodeKind::End {
                let at = self.token(leaf.first).start;
                self.emit(Node::marker(NodeKind::StreamEnd, at));
                break;
            }
            let next = self.parse_document(here)?;
            here = self.advance(here, next)?;
        }

        self.leave()
    }

    fn parse_document(&mut self, start: usize) -> Result<usize> {
        self.enter(start)?;
        trace!(depth = self.depth, start, "parse document");

        let leaf = self.scan_leaf(start, -1)?;
        let mut here = if leaf.kind == NodeKind::DocStart {
            let next = leaf.next;
            self.emit(leaf.into_node());
            next
        } else {
            self.emit(Node::marker(NodeKind::DocStart, leaf.run.start()));
            start
        };

        loop {
            let leaf = self.scan_leaf(here, -1)?;
            let next = match leaf.kind {
                NodeKind::End | NodeKind::DocStart => {
                    // The next `---` belongs to the next document.
                    self.emit(Node::marker(NodeKind::DocEnd, self.position(here)));
                    break;
                }
                NodeKind::DocEnd => {
                    let next = leaf.next;
                    self.emit(leaf.into_node());
                    here = next;
                    break;
                }
                NodeKind::Scalar => self.parse_scalar_or_mapping(leaf, -1)?,
                NodeKind::SeqStart => self.parse_sequence(here, -1, false)?,
                _ => return Err(self.unexpected(&leaf, "document")),
            };
            here = self.advance(here, next)?;
        }

        self.leave()?;
        Ok(here)
    }

    /// Parse a block sequence whose first dash is the next leaf after `start`.
    ///
    /// An `indentless` sequence shares its column with the mapping key that
    /// owns it, so a plain line at that column ends it instead of failing.
    fn parse_sequence(
        &mut self,
        start: usize,
        min_indent: isize,
        indentless: bool,
    ) -> Result<usize> {
        self.enter(start)?;
        trace!(depth = self.depth, start, min_indent, indentless, "parse sequence");

        let mut leaf = self.scan_leaf(start, min_indent)?;
        if leaf.kind != NodeKind::SeqStart {
            return Err(self.unexpected(&leaf, "sequence"));
        }
        self.emit(Node::marker(NodeKind::SeqStart, leaf.run.start()));

        let mut here = start;
        loop {
            match leaf.kind {
                NodeKind::SeqStart => {}
                NodeKind::Scalar if indentless => break,
                _ if leaf.closes_scope() => break,
                _ => return Err(self.unexpected(&leaf, "sequence entry")),
            }
            let item_indent = leaf.indent as isize;
            here = self.advance(here, leaf.next)?;

            let item = self.scan_leaf(here, item_indent)?;
            here = match item.kind {
                NodeKind::Scalar => self.parse_scalar_or_mapping(item, item_indent)?,
                NodeKind::SeqStart => self.parse_sequence(here, item_indent, false)?,
                _ if item.closes_scope() => {
                    // `-` with nothing after it is a null entry.
                    self.emit(Node::scalar(Run::empty(self.position(here)), None));
                    here
                }
                _ => return Err(self.unexpected(&item, "sequence entry")),
            };

            leaf = self.scan_leaf(here, min_indent)?;
        }

        self.emit(Node::marker(NodeKind::SeqEnd, self.position(here)));
        self.leave()?;
        Ok(here)
    }

    /// Parse a block mapping whose first key has already been scanned.
    fn parse_mapping(&mut self, first_key: Leaf, min_indent: isize) -> Result<usize> {
        self.enter(first_key.first)?;
        trace!(depth = self.depth, first = first_key.first, min_indent, "parse mapping");

        self.emit(Node::marker(NodeKind::MapStart, first_key.run.start()));
        let column = first_key.indent;

        let mut key = first_key;
        let mut here;
        loop {
            if key.indent as isize <= min_indent {
                return Err(Error::KeyNotIndented {
                    column: key.indent,
                    threshold: min_indent,
                    offset: key.run.start(),
                });
            }
            if key.indent != column {
                return Err(Error::Misaligned {
                    column: key.indent,
                    expected: column,
                    offset: key.run.start(),
                });
            }
            let value_indent = key.indent as isize;

            let colon = match self.find_colon(key.next) {
                Some(colon) => colon,
                None => {
                    let blocker = self.skip_blank(key.next);
                    return Err(Error::UnexpectedToken {
                        kind: self.kind(blocker),
                        offset: self.token(blocker).start,
                    });
                }
            };
            self.emit(key.into_node());
            here = colon + 1;

            let value = self.scan_leaf(here, value_indent)?;
            here = match value.kind {
                NodeKind::Scalar => self.parse_scalar_or_mapping(value, value_indent)?,
                NodeKind::SeqStart => self.parse_sequence(here, value_indent, false)?,
                _ if value.closes_scope() => self.parse_empty_value(here, value_indent)?,
                _ => return Err(self.unexpected(&value, "mapping value")),
            };

            let next_key = self.scan_leaf(here, min_indent)?;
            match next_key.kind {
                NodeKind::Scalar => key = next_key,
                _ if next_key.closes_scope() => break,
                _ => return Err(self.unexpected(&next_key, "mapping key")),
            }
        }

        self.emit(Node::marker(NodeKind::MapEnd, self.position(here)));
        self.leave()?;
        Ok(here)
    }

    /// A key with nothing indented under it: either a sequence at the key's
    /// own column or a null value.
    fn parse_empty_value(&mut self, here: usize, value_indent: isize) -> Result<usize> {
        let peek = self.scan_leaf(here, value_indent - 1)?;
        if peek.kind == NodeKind::SeqStart && peek.indent as isize == value_indent {
            return self.parse_sequence(here, value_indent - 1, true);
        }
        self.emit(Node::scalar(Run::empty(self.position(here)), None));
        Ok(here)
    }

    /// Emit a plain scalar, or start a mapping when a colon follows it.
    fn parse_scalar_or_mapping(&mut self, leaf: Leaf, min_indent: isize) -> Result<usize> {
        if leaf.style == Style::Plain && self.find_colon(leaf.next).is_some() {
            trace!(depth = self.depth, at = leaf.first, "found mapping");
            return self.parse_mapping(leaf, min_indent);
        }
        let next = leaf.next;
        self.emit(leaf.into_node());
        Ok(next)
    }

    // ========================================================================
    // Token scanning
    // ========================================================================

    /// Skip spaces, line breaks, and indentation from `i`.
    fn skip_blank(&self, mut i: usize) -> usize {
        while matches!(
            self.kind(i),
            TokenKind::Spaces | TokenKind::Line | TokenKind::Indent
        ) {
            i += 1;
        }
        i
    }

    /// The colon after a key, if one comes before any other content.
    fn find_colon(&self, from: usize) -> Option<usize> {
        let i = self.skip_blank(from);
        (self.kind(i) == TokenKind::Colon).then_some(i)
    }

    /// Find the next leaf at or after `start`.
    fn scan_leaf(&self, start: usize, min_indent: isize) -> Result<Leaf> {
        trace!(depth = self.depth, start, min_indent, "scan leaf");

        let mut i = start;
        loop {
            let token = self.token(i);
            match token.kind {
                TokenKind::Text => return Ok(self.scan_plain_scalar(i, min_indent)),
                kind if kind.is_indicator() => return self.scan_block_scalar(i, min_indent),
                TokenKind::End => return Ok(Leaf::boundary(NodeKind::End, i, start, token)),
                TokenKind::DocumentStart => return Ok(Leaf::marker(NodeKind::DocStart, i, token)),
                TokenKind::DocumentEnd => return Ok(Leaf::marker(NodeKind::DocEnd, i, token)),
                TokenKind::Dash => return Ok(Leaf::marker(NodeKind::SeqStart, i, token)),
                TokenKind::Spaces | TokenKind::Line => i += 1,
                TokenKind::Indent => {
                    let next = self.kind(i + 1);
                    let has_content = !matches!(
                        next,
                        TokenKind::Line
                            | TokenKind::End
                            | TokenKind::DocumentStart
                            | TokenKind::DocumentEnd
                    );
                    if has_content && token.length as isize <= min_indent {
                        let content = self.token(i + 1);
                        return Ok(Leaf::boundary(NodeKind::Dedent, i + 1, start, content));
                    }
                    i += 1;
                }
                kind => {
                    return Err(Error::UnexpectedToken {
                        kind,
                        offset: token.start,
                    })
                }
            }
        }
    }

    /// Scan a plain scalar starting at the text token `first`.
    ///
    /// The value reproduces the source literally: spaces collapse to one,
    /// line breaks stay, indentation is dropped. Trailing blanks are not
    /// part of the scalar.
    fn scan_plain_scalar(&self, first: usize, min_indent: isize) -> Leaf {
        let mut last = first;
        let mut at_line_start = false;
        let mut i = first + 1;
        loop {
            let token = self.token(i);
            match token.kind {
                TokenKind::End
                | TokenKind::DocumentStart
                | TokenKind::DocumentEnd
                | TokenKind::Colon => break,
                TokenKind::Dash if at_line_start => break,
                TokenKind::Spaces | TokenKind::Line => {}
                TokenKind::Indent => {
                    let next = self.kind(i + 1);
                    if !matches!(next, TokenKind::Line | TokenKind::End)
                        && token.length as isize <= min_indent
                    {
                        break;
                    }
                    at_line_start = true;
                    i += 1;
                    continue;
                }
                // Text, plus dashes and indicators in the middle of a line.
                _ => last = i,
            }
            at_line_start = false;
            i += 1;
        }

        let mut value = String::new();
        for token in &self.tokens[first..=last] {
            match token.kind {
                TokenKind::Spaces => value.push(' '),
                TokenKind::Line => value.push('\n'),
                TokenKind::Indent => {}
                _ => value.push_str(token.text()),
            }
        }

        let head = self.token(first);
        Leaf {
            kind: NodeKind::Scalar,
            first,
            next: last + 1,
            indent: head.column,
            run: Run::between(head.start, self.token(last).end()),
            value: Some(value),
            style: Style::Plain,
        }
    }

    /// Scan a literal or folded block scalar introduced by the indicator at
    /// `at`.
    fn scan_block_scalar(&self, at: usize, min_indent: isize) -> Result<Leaf> {
        let indicator = self.token(at);
        let (style, chomp) = match indicator.kind {
            TokenKind::BlockIndicator => (Style::Literal, Chomp::Clip),
            TokenKind::BlockIndicatorChomped => (Style::Literal, Chomp::Strip),
            TokenKind::FoldedIndicator => (Style::Folded, Chomp::Clip),
            _ => (Style::Folded, Chomp::Strip),
        };

        // Only spaces (and the comments the lexer dropped) may follow the
        // indicator on its own line.
        let mut i = at + 1;
        while self.kind(i) == TokenKind::Spaces {
            i += 1;
        }
        match self.kind(i) {
            TokenKind::Line | TokenKind::End => {}
            kind => {
                return Err(Error::UnexpectedToken {
                    kind,
                    offset: self.token(i).start,
                })
            }
        }

        let mut lines = Vec::new();
        let mut block_indent: Option<usize> = None;
        let mut next = at + 1;
        let mut last = at;
        let mut trailing_break = false;

        // `i` sits on a line break (or the end) at the top of every pass.
        while self.kind(i) == TokenKind::Line {
            let indent = self.token(i + 1);
            if indent.kind != TokenKind::Indent {
                break;
            }
            let content = i + 2;
            match self.kind(content) {
                TokenKind::Line => {
                    lines.push(BlockLine::Blank);
                    i = content;
                    continue;
                }
                TokenKind::End | TokenKind::DocumentStart | TokenKind::DocumentEnd => break,
                _ => {}
            }

            let width = indent.length;
            let base = match block_indent {
                Some(base) => base,
                None if width as isize <= min_indent => break,
                None => {
                    block_indent = Some(width);
                    width
                }
            };
            if width < base {
                break;
            }

            let mut j = content;
            let text = match style {
                Style::Folded => {
                    // Indentation and runs of spaces fold to one space before
                    // the next text; the first line starts bare.
                    let mut text = String::new();
                    let mut pending = width > 0 && last != at;
                    while !matches!(self.kind(j), TokenKind::Line | TokenKind::End) {
                        let token = self.token(j);
                        if token.kind == TokenKind::Spaces {
                            pending = true;
                        } else {
                            if pending {
                                text.push(' ');
                            }
                            text.push_str(token.text());
                            pending = false;
                        }
                        j += 1;
                    }
                    text
                }
                _ => {
                    let mut text = " ".repeat(width - base);
                    while !matches!(self.kind(j), TokenKind::Line | TokenKind::End) {
                        text.push_str(self.token(j).text());
                        j += 1;
                    }
                    text
                }
            };
            lines.push(BlockLine::Content(text));
            last = j - 1;
            next = j;
            trailing_break = self.kind(j) == TokenKind::Line;
            i = j;
        }

        let value = compose_block(chomp, lines, trailing_break);
        trace!(depth = self.depth, at, ?style, ?chomp, "block scalar");
        Ok(Leaf {
            kind: NodeKind::Scalar,
            first: at,
            next,
            indent: indicator.column,
            run: Run::between(indicator.start, self.token(last).end()),
            value: Some(value),
            style,
        })
    }
}

// ============================================================================
// Block scalar assembly
// ============================================================================

/// Join the body lines of a block scalar and apply chomping.
///
/// Every line break between lines stays a newline in both styles; trailing
/// blank lines are dropped before chomping.
fn compose_block(chomp: Chomp, mut lines: Vec<BlockLine>, trailing_break: bool) -> String {
    while matches!(lines.last(), Some(BlockLine::Blank)) {
        lines.pop();
    }
    if lines.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    for (n, line) in lines.iter().enumerate() {
        if n > 0 {
            out.push('\n');
        }
        if let BlockLine::Content(text) = line {
            out.push_str(text);
        }
    }

    if chomp == Chomp::Clip && trailing_break {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;

    fn parse(text: &str) -> Vec<Node> {
        let tokens = lex(text).unwrap();
        parse_tokens(&tokens).unwrap()
    }

    fn fail(text: &str) -> ParseFailure {
        let tokens = lex(text).unwrap();
        parse_tokens(&tokens).unwrap_err()
    }

    /// Event names with scalar values inlined, e.g. `text(a)` or `text(~)`.
    fn events(text: &str) -> Vec<String> {
        parse(text)
            .iter()
            .map(|node| match (&node.kind, &node.value) {
                (NodeKind::Scalar, Some(value)) => format!("text({})", value),
                (NodeKind::Scalar, None) => "text(~)".to_string(),
                (kind, _) => kind.name().to_string(),
            })
            .collect()
    }

    fn scalars(text: &str) -> Vec<Option<String>> {
        parse(text)
            .into_iter()
            .filter(|node| node.kind == NodeKind::Scalar)
            .map(|node| node.value)
            .collect()
    }

    fn assert_balanced(nodes: &[Node]) {
        let mut stack = Vec::new();
        for node in nodes {
            assert!(!node.kind.is_internal(), "internal node {:?}", node);
            if node.kind.is_start() {
                stack.push(node.kind);
            } else if let Some(opener) = node.kind.opener() {
                assert_eq!(stack.pop(), Some(opener), "unbalanced at {}", node);
            }
        }
        assert!(stack.is_empty());
        assert_eq!(nodes.first().map(|n| n.kind), Some(NodeKind::StreamStart));
        assert_eq!(nodes.last().map(|n| n.kind), Some(NodeKind::StreamEnd));
    }

    fn assert_monotonic(nodes: &[Node]) {
        for pair in nodes.windows(2) {
            assert!(
                pair[1].run.start() >= pair[0].run.end(),
                "{} overlaps {}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_simple_mapping() {
        assert_eq!(
            events("a: b\n"),
            vec!["str+", "doc+", "map+", "text(a)", "text(b)", "map-", "doc-", "str-"]
        );
    }

    #[test]
    fn test_simple_sequence() {
        assert_eq!(
            events("- a\n- b\n"),
            vec!["str+", "doc+", "seq+", "text(a)", "text(b)", "seq-", "doc-", "str-"]
        );
    }

    #[test]
    fn test_nested_mapping() {
        assert_eq!(
            events("a:\n  b: c\n"),
            vec![
                "str+", "doc+", "map+", "text(a)", "map+", "text(b)", "text(c)", "map-", "map-",
                "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_literal_block() {
        assert_eq!(
            scalars("a: |\n  line1\n  line2\n"),
            vec![Some("a".to_string()), Some("line1\nline2\n".to_string())]
        );
    }

    #[test]
    fn test_literal_block_chomped() {
        assert_eq!(
            scalars("a: |-\n  line1\n  line2\n"),
            vec![Some("a".to_string()), Some("line1\nline2".to_string())]
        );
    }

    #[test]
    fn test_multiple_documents() {
        assert_eq!(
            events("---\na: 1\n---\na: 2\n...\n"),
            vec![
                "str+", "doc+", "map+", "text(a)", "text(1)", "map-", "doc-", "doc+", "map+",
                "text(a)", "text(2)", "map-", "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_bare_scalar() {
        assert_eq!(events("hello"), vec!["str+", "doc+", "text(hello)", "doc-", "str-"]);
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(events(""), vec!["str+", "str-"]);
        assert_eq!(events("# only a comment\n"), vec!["str+", "str-"]);
    }

    #[test]
    fn test_explicit_empty_document() {
        assert_eq!(events("---\n...\n"), vec!["str+", "doc+", "doc-", "str-"]);
    }

    #[test]
    fn test_sequence_of_mappings() {
        assert_eq!(
            events("- a: 1\n  b: 2\n- c: 3\n"),
            vec![
                "str+", "doc+", "seq+", "map+", "text(a)", "text(1)", "text(b)", "text(2)", "map-",
                "map+", "text(c)", "text(3)", "map-", "seq-", "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_sequence_under_key() {
        assert_eq!(
            events("items:\n  - x\n  - y\nname: z\n"),
            vec![
                "str+", "doc+", "map+", "text(items)", "seq+", "text(x)", "text(y)", "seq-",
                "text(name)", "text(z)", "map-", "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_indentless_sequence_under_key() {
        assert_eq!(
            events("items:\n- x\n- y\nname: z\n"),
            vec![
                "str+", "doc+", "map+", "text(items)", "seq+", "text(x)", "text(y)", "seq-",
                "text(name)", "text(z)", "map-", "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_nested_sequences() {
        assert_eq!(
            events("- - a\n  - b\n- c\n"),
            vec![
                "str+", "doc+", "seq+", "seq+", "text(a)", "text(b)", "seq-", "text(c)", "seq-",
                "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_empty_sequence_entries() {
        assert_eq!(
            events("-\n- a\n-\n"),
            vec!["str+", "doc+", "seq+", "text(~)", "text(a)", "text(~)", "seq-", "doc-", "str-"]
        );
    }

    #[test]
    fn test_empty_mapping_values() {
        assert_eq!(
            events("a:\nb: c\nd:\n"),
            vec![
                "str+", "doc+", "map+", "text(a)", "text(~)", "text(b)", "text(c)", "text(d)",
                "text(~)", "map-", "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_dedent_closes_nested_scopes() {
        assert_eq!(
            events("a:\n  b:\n    c: d\ne: f\n"),
            vec![
                "str+", "doc+", "map+", "text(a)", "map+", "text(b)", "map+", "text(c)",
                "text(d)", "map-", "map-", "text(e)", "text(f)", "map-", "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_document_marker_closes_mapping() {
        assert_eq!(
            events("a: b\n---\n- c\n"),
            vec![
                "str+", "doc+", "map+", "text(a)", "text(b)", "map-", "doc-", "doc+", "seq+",
                "text(c)", "seq-", "doc-", "str-"
            ]
        );
    }

    #[test]
    fn test_colon_inside_key_text() {
        assert_eq!(
            scalars("url: http://x.org/a:b\n"),
            vec![Some("url".to_string()), Some("http://x.org/a:b".to_string())]
        );
    }

    #[test]
    fn test_plain_scalar_trims_trailing_comment() {
        assert_eq!(
            scalars("a: b c   # note\n"),
            vec![Some("a".to_string()), Some("b c".to_string())]
        );
    }

    #[test]
    fn test_plain_multiline_is_reproduced() {
        assert_eq!(
            scalars("a: one\n  two\n\n  three\nb: x\n"),
            vec![
                Some("a".to_string()),
                Some("one\ntwo\n\nthree".to_string()),
                Some("b".to_string()),
                Some("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_dash_inside_plain_scalar() {
        assert_eq!(scalars("a: x - y\n"), vec![Some("a".to_string()), Some("x - y".to_string())]);
    }

    #[test]
    fn test_literal_keeps_blank_lines_and_deeper_indent() {
        assert_eq!(
            scalars("a: |\n  one\n\n    two\n  three\n\n\nb: c\n")[1],
            Some("one\n\n  two\nthree\n".to_string())
        );
    }

    #[test]
    fn test_literal_without_final_break() {
        assert_eq!(scalars("a: |\n  x")[1], Some("x".to_string()));
    }

    #[test]
    fn test_folded_block() {
        assert_eq!(
            scalars("a: >\n  one\n  two\n")[1],
            Some("one\n two\n".to_string())
        );
        assert_eq!(
            scalars("a: >-\n  one\n  two\n")[1],
            Some("one\n two".to_string())
        );
    }

    #[test]
    fn test_folded_blank_lines_keep_breaks() {
        assert_eq!(
            scalars("a: >\n  one\n\n  two\n\n")[1],
            Some("one\n\n two\n".to_string())
        );
    }

    #[test]
    fn test_folded_collapses_indentation_and_spaces() {
        assert_eq!(
            scalars("a: >\n  one\n    code  here\n  two\n")[1],
            Some("one\n code here\n two\n".to_string())
        );
    }

    #[test]
    fn test_comment_line_in_literal_block_is_blank() {
        assert_eq!(
            scalars("a: |\n  x\n  # c\n  y\n")[1],
            Some("x\n\ny\n".to_string())
        );
    }

    #[test]
    fn test_block_scalar_in_sequence() {
        assert_eq!(
            events("- |\n  x\n- y\n"),
            vec!["str+", "doc+", "seq+", "text(x\n)", "text(y)", "seq-", "doc-", "str-"]
        );
    }

    #[test]
    fn test_empty_block_scalar() {
        assert_eq!(scalars("a: |\nb: c\n")[1], Some(String::new()));
    }

    #[test]
    fn test_block_scalar_text_on_indicator_line() {
        let failure = fail("a: | x\n");
        assert_eq!(
            failure.error,
            Error::UnexpectedToken {
                kind: TokenKind::Text,
                offset: 5
            }
        );
    }

    #[test]
    fn test_scalar_runs() {
        let text = "key: some value\n";
        let nodes = parse(text);
        let value = &nodes[4];
        assert_eq!(&text[value.run.range()], "some value");
        let key = &nodes[3];
        assert_eq!(&text[key.run.range()], "key");
        assert_eq!(nodes.last().unwrap().run, Run::empty(text.len()));
    }

    #[test]
    fn test_block_scalar_run() {
        let text = "a: |-\n  x\n  y\nb: c\n";
        let nodes = parse(text);
        assert_eq!(&text[nodes[4].run.range()], "|-\n  x\n  y");
    }

    #[test]
    fn test_explicit_markers_cover_their_tokens() {
        let nodes = parse("---\na\n...\n");
        assert_eq!(nodes[1].run, Run::new(0, 3));
        assert_eq!(nodes[3].run, Run::new(6, 3));
    }

    #[test]
    fn test_structural_properties() {
        let inputs = [
            "a: b\n",
            "- a\n- b\n",
            "a:\n  b: c\n",
            "a: |\n  line1\n  line2\n",
            "---\na: 1\n---\na: 2\n...\n",
            "top:\n  list:\n  - one\n  - two: 2\n    three: |\n      body\n  after: x\nlast:\n",
            "- - - deep\n    - deeper\n  - back\n- out\n",
            "a: >-\n  folded\n  text\n\nb:\n- 1\n-\n- 3\n",
        ];
        for input in inputs {
            let nodes = parse(input);
            assert_balanced(&nodes);
            assert_monotonic(&nodes);
            // Same input, same output.
            assert_eq!(nodes, parse(input));
        }
    }

    #[test]
    fn test_misaligned_key() {
        let failure = fail("a:\n  b: c\n d: e\n");
        assert_eq!(
            failure.error,
            Error::Misaligned {
                column: 1,
                expected: 2,
                offset: 11
            }
        );
        // Nodes up to the failure are kept for diagnostics.
        assert_eq!(failure.partial[0].kind, NodeKind::StreamStart);
        assert!(failure.partial.iter().any(|n| n.value.as_deref() == Some("c")));
    }

    #[test]
    fn test_deeper_dash_continues_sequence() {
        assert_eq!(
            events("- a\n  - b\n- c\n"),
            vec!["str+", "doc+", "seq+", "text(a)", "text(b)", "text(c)", "seq-", "doc-", "str-"]
        );
    }

    #[test]
    fn test_colon_without_key() {
        let failure = fail(": a\n");
        assert_eq!(
            failure.error,
            Error::UnexpectedToken {
                kind: TokenKind::Colon,
                offset: 0
            }
        );
    }

    #[test]
    fn test_plain_line_after_sequence() {
        let failure = fail("- a\nb\n");
        assert!(matches!(
            failure.error,
            Error::UnexpectedNode {
                kind: NodeKind::Scalar,
                context: "sequence entry",
                ..
            }
        ));
    }

    #[test]
    fn test_sequence_as_mapping_key() {
        let failure = fail("a: b\n- c\n");
        assert!(matches!(
            failure.error,
            Error::UnexpectedNode {
                kind: NodeKind::SeqStart,
                context: "mapping key",
                ..
            }
        ));
    }

    #[test]
    fn test_depth_limit() {
        let deep = "- ".repeat(40) + "x\n";
        let tokens = lex(&deep).unwrap();
        let options = Options::default().with_max_depth(16);
        let failure = parse_tokens_with(&tokens, &options).unwrap_err();
        assert!(matches!(failure.error, Error::DepthExceeded { limit: 16, .. }));

        let nodes = parse_tokens_with(&tokens, &Options::default()).unwrap();
        assert_balanced(&nodes);
    }

    #[test]
    fn test_leave_without_enter() {
        let tokens = lex("").unwrap();
        let mut parser = Parser::new(&tokens, &Options::default());
        assert_eq!(parser.leave(), Err(Error::StackUnderflow));
    }

    #[test]
    fn test_advance_requires_progress() {
        let tokens = lex("a").unwrap();
        let parser = Parser::new(&tokens, &Options::default());
        assert_eq!(parser.advance(1, 1), Err(Error::NoProgress { offset: 0 }));
        assert_eq!(parser.advance(1, 2), Ok(2));
    }

    #[test]
    fn test_tokens_without_end_sentinel() {
        let tokens = lex("a: b").unwrap();
        let nodes = parse_tokens(&tokens[..tokens.len() - 1]).unwrap();
        assert_eq!(nodes.len(), 8);
    }
}
