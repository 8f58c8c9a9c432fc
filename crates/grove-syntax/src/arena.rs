//! Index-based storage for the nodes of one syntax tree.
//!
//! Every parse produces a fresh [`SyntaxArena`]. Nodes refer to their parent
//! and children by [`NodeId`], so the whole graph has a single owner and a
//! reparse discards the previous arena in one drop.

use std::fmt;
use std::ops::Range;

use crate::node::Node;
use crate::position::{LineIndex, Position};

/// Index of a node within its [`SyntaxArena`].
///
/// Identifiers are only meaningful for the arena that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The root node of every arena.
    pub const ROOT: Self = Self(0);

    /// Returns the raw index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Description of a node handed to [`ArenaBuilder::push`] by a parse backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// Grammar node kind, or the literal text for anonymous nodes.
    pub kind: &'static str,
    /// Whether the node is named in the grammar.
    pub named: bool,
    /// Whether the node marks unparseable input.
    pub error: bool,
    /// Whether the node was inserted by error recovery and is zero-width.
    pub missing: bool,
    /// Field under which the node sits in its parent.
    pub field: Option<&'static str>,
    /// Byte range covered by the node.
    pub byte_range: Range<usize>,
}

impl NodeSpec {
    /// Creates a spec for an ordinary node.
    #[must_use]
    pub const fn new(kind: &'static str, named: bool, byte_range: Range<usize>) -> Self {
        Self {
            kind,
            named,
            error: false,
            missing: false,
            field: None,
            byte_range,
        }
    }

    /// Sets the parent field name.
    #[must_use]
    pub const fn with_field(mut self, field: Option<&'static str>) -> Self {
        self.field = field;
        self
    }

    /// Marks the node as an error node.
    #[must_use]
    pub const fn with_error(mut self, error: bool) -> Self {
        self.error = error;
        self
    }

    /// Marks the node as a missing node.
    #[must_use]
    pub const fn with_missing(mut self, missing: bool) -> Self {
        self.missing = missing;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: &'static str,
    pub(crate) named: bool,
    pub(crate) error: bool,
    pub(crate) missing: bool,
    pub(crate) field: Option<&'static str>,
    pub(crate) byte_range: Range<usize>,
    pub(crate) start: Position,
    pub(crate) end: Position,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

/// All nodes of one parsed tree, addressed by [`NodeId`].
///
/// The arena always has a root node; backends that push nothing get a
/// zero-width `ERROR` root.
#[derive(Debug, Clone)]
pub struct SyntaxArena {
    root: NodeData,
    rest: Vec<NodeData>,
}

impl SyntaxArena {
    /// Returns the number of nodes in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rest.len().saturating_add(1)
    }

    /// Always `false`: an arena holds at least its root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        match id.0.checked_sub(1) {
            None => Some(&self.root),
            Some(index) => self.rest.get(index),
        }
    }

    pub(crate) const fn root_data(&self) -> &NodeData {
        &self.root
    }

    /// Returns a view of the root node over `source`.
    pub(crate) const fn root<'t>(&'t self, source: &'t str) -> Node<'t> {
        Node::new(self, source, NodeId::ROOT, &self.root)
    }

    /// Returns a view of the node `id` over `source`.
    pub(crate) fn node<'t>(&'t self, id: NodeId, source: &'t str) -> Option<Node<'t>> {
        self.data(id).map(|data| Node::new(self, source, id, data))
    }
}

/// Incremental builder used by parse backends to populate an arena.
///
/// Nodes must be pushed in pre-order: a parent before its children and
/// siblings left to right.
#[derive(Debug)]
pub struct ArenaBuilder {
    nodes: Vec<NodeData>,
    lines: LineIndex,
    source_len: usize,
}

impl ArenaBuilder {
    /// Creates a builder for a tree over `source`.
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            nodes: Vec::new(),
            lines: LineIndex::new(source),
            source_len: source.len(),
        }
    }

    /// Adds a node under `parent` (or as the root when `parent` is `None`).
    ///
    /// Ranges are clamped to the source so that every node lies inside the
    /// document.
    pub fn push(&mut self, parent: Option<NodeId>, spec: NodeSpec) -> NodeId {
        let id = NodeId(self.nodes.len());
        let end = spec.byte_range.end.min(self.source_len);
        let start = spec.byte_range.start.min(end);

        if let Some(parent_data) = parent.and_then(|parent_id| self.nodes.get_mut(parent_id.0)) {
            debug_assert!(
                parent_data.byte_range.start <= start && end <= parent_data.byte_range.end,
                "child {start}..{end} escapes parent {:?}",
                parent_data.byte_range
            );
            parent_data.children.push(id);
        }

        self.nodes.push(NodeData {
            kind: spec.kind,
            named: spec.named,
            error: spec.error,
            missing: spec.missing,
            field: spec.field,
            byte_range: start..end,
            start: self.lines.position(start),
            end: self.lines.position(end),
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Returns the number of nodes pushed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether no node has been pushed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Completes the arena.
    #[must_use]
    pub fn finish(self) -> SyntaxArena {
        let mut nodes = self.nodes.into_iter();
        let root = nodes.next().unwrap_or_else(|| NodeData {
            kind: "ERROR",
            named: true,
            error: true,
            missing: false,
            field: None,
            byte_range: 0..0,
            start: Position::default(),
            end: Position::default(),
            parent: None,
            children: Vec::new(),
        });
        SyntaxArena {
            root,
            rest: nodes.collect(),
        }
    }
}
