//! Source runs and the structural nodes emitted by the parser.

use std::fmt;
use std::ops::Range;

/// A half-open span of the source text, in byte offsets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Run {
    start: usize,
    length: usize,
}

impl Run {
    /// Create a run covering `length` bytes from `start`.
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create a zero-length run marking a position.
    pub fn empty(at: usize) -> Self {
        Self::new(at, 0)
    }

    /// Create the run from `start` up to (not including) `end`.
    pub fn between(start: usize, end: usize) -> Self {
        Self::new(start, end.saturating_sub(start))
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The byte range this run covers, for slicing the source.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

impl From<Range<usize>> for Run {
    fn from(range: Range<usize>) -> Self {
        Self::between(range.start, range.end)
    }
}

/// Kind of a parsed node.
///
/// `End` and `Dedent` are internal: they flow between parse functions to
/// signal "no more input" and "indentation closed the current scope", and
/// never appear in a finished node stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    End,
    Dedent,
    StreamStart,
    StreamEnd,
    DocStart,
    DocEnd,
    MapStart,
    MapEnd,
    SeqStart,
    SeqEnd,
    Scalar,
}

impl NodeKind {
    /// Short event name, as used in diagnostics and `*.expect.yml` files.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::End => "end",
            NodeKind::Dedent => "dedent",
            NodeKind::StreamStart => "str+",
            NodeKind::StreamEnd => "str-",
            NodeKind::DocStart => "doc+",
            NodeKind::DocEnd => "doc-",
            NodeKind::MapStart => "map+",
            NodeKind::MapEnd => "map-",
            NodeKind::SeqStart => "seq+",
            NodeKind::SeqEnd => "seq-",
            NodeKind::Scalar => "text",
        }
    }

    /// Inverse of [`NodeKind::name`] for the public kinds.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "str+" => NodeKind::StreamStart,
            "str-" => NodeKind::StreamEnd,
            "doc+" => NodeKind::DocStart,
            "doc-" => NodeKind::DocEnd,
            "map+" => NodeKind::MapStart,
            "map-" => NodeKind::MapEnd,
            "seq+" => NodeKind::SeqStart,
            "seq-" => NodeKind::SeqEnd,
            "text" => NodeKind::Scalar,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns `true` for the kinds that never leave the parser.
    pub fn is_internal(self) -> bool {
        matches!(self, NodeKind::End | NodeKind::Dedent)
    }

    /// Returns `true` for the kinds that open a scope.
    pub fn is_start(self) -> bool {
        matches!(
            self,
            NodeKind::StreamStart | NodeKind::DocStart | NodeKind::MapStart | NodeKind::SeqStart
        )
    }

    /// The start kind a closing kind pairs with.
    pub fn opener(self) -> Option<NodeKind> {
        match self {
            NodeKind::StreamEnd => Some(NodeKind::StreamStart),
            NodeKind::DocEnd => Some(NodeKind::DocStart),
            NodeKind::MapEnd => Some(NodeKind::MapStart),
            NodeKind::SeqEnd => Some(NodeKind::SeqStart),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One structural or content event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub run: Run,
    /// Materialized scalar text. `None` for markers and null scalars.
    pub value: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, run: Run, value: Option<String>) -> Self {
        Self { kind, run, value }
    }

    /// A zero-length structural marker at `at`.
    pub fn marker(kind: NodeKind, at: usize) -> Self {
        Self::new(kind, Run::empty(at), None)
    }

    pub fn scalar(run: Run, value: Option<String>) -> Self {
        Self::new(NodeKind::Scalar, run, value)
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:>4} {:>3} =>",
            self.kind,
            self.run.start(),
            self.run.length()
        )?;
        match &self.value {
            Some(value) => write!(f, " {}", value.escape_debug()),
            None if self.kind == NodeKind::Scalar => f.write_str(" ~"),
            None => Ok(()),
        }
    }
}
