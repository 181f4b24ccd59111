//! Pull-style reader over a node stream.
//!
//! [`YamlReader`] hands out one node at a time under a public kind
//! enumeration, hiding the parser's internal kinds.

use crate::error::ParseFailure;
use crate::node::{Node, NodeKind};

/// Public node kinds, as seen through [`YamlReader`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum YamlNodeType {
    /// Before the first read, after the last, or an internal kind.
    #[default]
    None,
    StreamStart,
    StreamEnd,
    DocumentStart,
    DocumentEnd,
    MappingStart,
    MappingEnd,
    SequenceStart,
    SequenceEnd,
    Scalar,
}

impl From<NodeKind> for YamlNodeType {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::End | NodeKind::Dedent => YamlNodeType::None,
            NodeKind::StreamStart => YamlNodeType::StreamStart,
            NodeKind::StreamEnd => YamlNodeType::StreamEnd,
            NodeKind::DocStart => YamlNodeType::DocumentStart,
            NodeKind::DocEnd => YamlNodeType::DocumentEnd,
            NodeKind::MapStart => YamlNodeType::MappingStart,
            NodeKind::MapEnd => YamlNodeType::MappingEnd,
            NodeKind::SeqStart => YamlNodeType::SequenceStart,
            NodeKind::SeqEnd => YamlNodeType::SequenceEnd,
            NodeKind::Scalar => YamlNodeType::Scalar,
        }
    }
}

enum Source<'a> {
    Text(&'a str),
    Nodes(Vec<Node>),
}

/// Walks a node stream one node at a time.
///
/// ```
/// use libyamlet::{YamlNodeType, YamlReader};
///
/// let mut reader = YamlReader::new("a: b\n");
/// let mut scalars = Vec::new();
/// while reader.read().unwrap() {
///     if reader.node_type() == YamlNodeType::Scalar {
///         scalars.push(reader.value().unwrap().to_string());
///     }
/// }
/// assert_eq!(scalars, ["a", "b"]);
/// ```
pub struct YamlReader<'a> {
    source: Source<'a>,
    /// Index of the next node to examine.
    cursor: usize,
    current: Option<usize>,
}

impl<'a> YamlReader<'a> {
    /// A reader that parses `text` on the first [`read`](Self::read).
    pub fn new(text: &'a str) -> Self {
        Self {
            source: Source::Text(text),
            cursor: 0,
            current: None,
        }
    }

    /// A reader over an already parsed stream.
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self {
            source: Source::Nodes(nodes),
            cursor: 0,
            current: None,
        }
    }

    fn nodes(&mut self) -> Result<&[Node], ParseFailure> {
        if let Source::Text(text) = self.source {
            self.source = Source::Nodes(crate::parse(text)?);
        }
        match &self.source {
            Source::Nodes(nodes) => Ok(nodes.as_slice()),
            Source::Text(_) => Ok(&[]),
        }
    }

    /// Advance to the next public node. Returns `false` once the stream is
    /// exhausted.
    pub fn read(&mut self) -> Result<bool, ParseFailure> {
        let mut cursor = self.cursor;
        let found = {
            let nodes = self.nodes()?;
            loop {
                match nodes.get(cursor).map(|n| n.kind) {
                    Some(NodeKind::Dedent) => cursor += 1,
                    Some(NodeKind::End) | None => break None,
                    Some(_) => break Some(cursor),
                }
            }
        };
        self.current = found;
        self.cursor = found.map_or(cursor, |i| i + 1);
        Ok(found.is_some())
    }

    /// The current node, if positioned on one.
    pub fn node(&self) -> Option<&Node> {
        match (&self.source, self.current) {
            (Source::Nodes(nodes), Some(i)) => nodes.get(i),
            _ => None,
        }
    }

    pub fn node_type(&self) -> YamlNodeType {
        self.node()
            .map_or(YamlNodeType::None, |node| node.kind.into())
    }

    /// The current scalar value. `None` for markers and null scalars.
    pub fn value(&self) -> Option<&str> {
        self.node().and_then(|node| node.value.as_deref())
    }
}

impl Iterator for YamlReader<'_> {
    type Item = Result<Node, ParseFailure>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read() {
            Ok(true) => self.node().cloned().map(Ok),
            Ok(false) => None,
            Err(failure) => {
                // Report the failure once, then stop.
                self.source = Source::Nodes(Vec::new());
                Some(Err(failure))
            }
        }
    }
}
