//! Read-only views of syntax tree nodes.
//!
//! A [`Node`] borrows the tree it came from, so the borrow checker rules out
//! navigating through a node after the tree has been edited: copy the byte
//! range or text out of a node before calling [`SyntaxTree::edit`].
//!
//! [`SyntaxTree::edit`]: crate::SyntaxTree::edit

use std::fmt;
use std::ops::Range;
use std::ptr;

use crate::arena::{NodeData, NodeId, SyntaxArena};
use crate::position::Position;

/// A view of one node in a syntax tree.
#[derive(Clone, Copy)]
pub struct Node<'t> {
    arena: &'t SyntaxArena,
    source: &'t str,
    id: NodeId,
    data: &'t NodeData,
}

impl<'t> Node<'t> {
    pub(crate) const fn new(
        arena: &'t SyntaxArena,
        source: &'t str,
        id: NodeId,
        data: &'t NodeData,
    ) -> Self {
        Self {
            arena,
            source,
            id,
            data,
        }
    }

    /// Returns the arena identifier of this node.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node kind.
    ///
    /// Anonymous nodes report their literal text, e.g. `"+"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.data.kind
    }

    /// Returns whether the node is named in the grammar.
    #[must_use]
    pub const fn is_named(&self) -> bool {
        self.data.named
    }

    /// Returns whether the node is an `ERROR` node.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.data.error
    }

    /// Returns whether the node was inserted by error recovery.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.data.missing
    }

    /// Returns whether this node or any descendant is an error or missing node.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.descendants()
            .any(|node| node.is_error() || node.is_missing())
    }

    /// Returns the byte range covered by the node.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.data.byte_range.clone()
    }

    /// Returns the inclusive start byte.
    #[must_use]
    pub const fn start_byte(&self) -> usize {
        self.data.byte_range.start
    }

    /// Returns the exclusive end byte.
    #[must_use]
    pub const fn end_byte(&self) -> usize {
        self.data.byte_range.end
    }

    /// Returns the zero-based start position.
    #[must_use]
    pub const fn start_position(&self) -> Position {
        self.data.start
    }

    /// Returns the zero-based end position.
    #[must_use]
    pub const fn end_position(&self) -> Position {
        self.data.end
    }

    /// Returns the source text covered by the node.
    #[must_use]
    pub fn text(&self) -> &'t str {
        self.source
            .get(self.data.byte_range.clone())
            .unwrap_or_default()
    }

    /// Returns the field name under which this node sits in its parent.
    #[must_use]
    pub const fn field_name(&self) -> Option<&'static str> {
        self.data.field
    }

    /// Returns the parent node, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.data
            .parent
            .and_then(|parent| self.arena.node(parent, self.source))
    }

    /// Returns the number of children, named and anonymous.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.data.children.len()
    }

    /// Returns the child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<Self> {
        self.data
            .children
            .get(index)
            .and_then(|id| self.arena.node(*id, self.source))
    }

    /// Iterates over all children in order.
    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + use<'t> {
        let arena = self.arena;
        let source = self.source;
        let data = self.data;
        data.children
            .iter()
            .filter_map(move |id| arena.node(*id, source))
    }

    /// Iterates over the named children in order.
    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + use<'t> {
        self.children().filter(Node::is_named)
    }

    /// Returns the number of named children.
    #[must_use]
    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    /// Returns the first child stored under `field`, e.g. `left` or `right`.
    #[must_use]
    pub fn child_by_field_name(&self, field: &str) -> Option<Self> {
        self.children_by_field_name(field).next()
    }

    /// Iterates over every child stored under `field`.
    pub fn children_by_field_name<'f>(
        &self,
        field: &'f str,
    ) -> impl Iterator<Item = Node<'t>> + use<'t, 'f> {
        self.children()
            .filter(move |child| child.field_name() == Some(field))
    }

    /// Returns the next sibling, named or anonymous.
    #[must_use]
    pub fn next_sibling(&self) -> Option<Self> {
        let parent = self.parent()?;
        let position = self.position_in(&parent)?;
        parent.child(position.checked_add(1)?)
    }

    /// Returns the previous sibling, named or anonymous.
    #[must_use]
    pub fn prev_sibling(&self) -> Option<Self> {
        let parent = self.parent()?;
        let position = self.position_in(&parent)?;
        parent.child(position.checked_sub(1)?)
    }

    fn position_in(&self, parent: &Self) -> Option<usize> {
        parent.data.children.iter().position(|id| *id == self.id)
    }

    /// Iterates over this node and all of its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants { stack: vec![*self] }
    }

    /// Renders the named structure of the subtree as an S-expression.
    ///
    /// Anonymous nodes are omitted; fields prefix their child and missing
    /// nodes render as `(MISSING kind)`.
    #[must_use]
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![SexpStep::Open {
            node: *self,
            nested: false,
        }];
        while let Some(step) = stack.pop() {
            let (node, nested) = match step {
                SexpStep::Open { node, nested } => (node, nested),
                SexpStep::Close => {
                    out.push(')');
                    continue;
                }
            };
            if nested {
                out.push(' ');
                if let Some(field) = node.field_name() {
                    out.push_str(field);
                    out.push_str(": ");
                }
            }
            if node.is_missing() {
                out.push_str("(MISSING ");
                if node.is_named() {
                    out.push_str(node.kind());
                } else {
                    out.push('"');
                    out.push_str(node.kind());
                    out.push('"');
                }
                out.push(')');
                continue;
            }
            out.push('(');
            out.push_str(node.kind());
            stack.push(SexpStep::Close);
            stack.extend(
                node.children()
                    .rev()
                    .filter(|child| child.is_named() || child.is_missing())
                    .map(|child| SexpStep::Open {
                        node: child,
                        nested: true,
                    }),
            );
        }
        out
    }
}

/// Pending work while rendering an S-expression without recursion.
enum SexpStep<'t> {
    Open { node: Node<'t>, nested: bool },
    Close,
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.arena, other.arena) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("byte_range", &self.data.byte_range)
            .field("text", &self.text())
            .finish()
    }
}

impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sexp())
    }
}

/// Pre-order iterator over a subtree. See [`Node::descendants`].
#[derive(Debug, Clone)]
pub struct Descendants<'t> {
    stack: Vec<Node<'t>>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = Node<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().rev());
        Some(node)
    }
}
