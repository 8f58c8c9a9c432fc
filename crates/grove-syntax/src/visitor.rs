//! Hook-based traversal of syntax trees.
//!
//! A [`Visitor`] walks a subtree depth-first in pre-order. Two kinds of hook
//! can be registered, each either for one node kind or as a fallback for
//! every kind:
//!
//! - visit hooks (`on`, `on_kind`) observe a node;
//! - wrap hooks (`around`, `around_kind`) receive a [`Continuation`] and
//!   decide whether, and how often, the node's children are traversed.
//!
//! A kind-specific hook always takes precedence over the fallback of the
//! same kind of hook. How visit and wrap hooks combine on one node is set by
//! [`DispatchMode`].
//!
//! Hooks are `Fn` closures because wrap hooks re-enter the visitor; collect
//! results through a `RefCell` or `Cell`.
//!
//! ```
//! use std::cell::RefCell;
//! use grove_syntax::{Parser, SupportedLanguage, Visitor};
//!
//! let tree = Parser::new(SupportedLanguage::Math).parse("1 + x * 3\n")?;
//! let kinds = RefCell::new(Vec::new());
//! Visitor::new(tree.root_node())
//!     .on(|node| kinds.borrow_mut().push(node.kind()))
//!     .around_kind("product", |_, _| {})
//!     .visit();
//! assert_eq!(kinds.into_inner(), ["expression", "sum", "number", "+", "product"]);
//! # Ok::<(), grove_syntax::SyntaxError>(())
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::config::{DispatchMode, VisitorConfig};
use crate::node::Node;

type VisitHook<'a> = Box<dyn Fn(Node<'a>) + 'a>;
type WrapHook<'a> = Box<dyn Fn(Node<'a>, &Continuation<'_, 'a>) + 'a>;

/// A registry of traversal hooks over one subtree.
pub struct Visitor<'a> {
    root: Node<'a>,
    config: VisitorConfig,
    on_kind: HashMap<String, VisitHook<'a>>,
    on_any: Option<VisitHook<'a>>,
    around_kind: HashMap<String, WrapHook<'a>>,
    around_any: Option<WrapHook<'a>>,
}

impl<'a> Visitor<'a> {
    /// Creates a visitor over the subtree rooted at `root`.
    #[must_use]
    pub fn new(root: Node<'a>) -> Self {
        Self::with_config(root, VisitorConfig::default())
    }

    /// Creates a visitor with an explicit configuration.
    #[must_use]
    pub fn with_config(root: Node<'a>, config: VisitorConfig) -> Self {
        Self {
            root,
            config,
            on_kind: HashMap::new(),
            on_any: None,
            around_kind: HashMap::new(),
            around_any: None,
        }
    }

    /// Sets the visit hook for nodes without a kind-specific one.
    #[must_use]
    pub fn on(mut self, hook: impl Fn(Node<'a>) + 'a) -> Self {
        self.on_any = Some(Box::new(hook));
        self
    }

    /// Sets the visit hook for nodes of `kind`.
    #[must_use]
    pub fn on_kind(mut self, kind: impl Into<String>, hook: impl Fn(Node<'a>) + 'a) -> Self {
        self.on_kind.insert(kind.into(), Box::new(hook));
        self
    }

    /// Sets the wrap hook for nodes without a kind-specific one.
    #[must_use]
    pub fn around(mut self, hook: impl Fn(Node<'a>, &Continuation<'_, 'a>) + 'a) -> Self {
        self.around_any = Some(Box::new(hook));
        self
    }

    /// Sets the wrap hook for nodes of `kind`.
    #[must_use]
    pub fn around_kind(
        mut self,
        kind: impl Into<String>,
        hook: impl Fn(Node<'a>, &Continuation<'_, 'a>) + 'a,
    ) -> Self {
        self.around_kind.insert(kind.into(), Box::new(hook));
        self
    }

    /// Returns the root of the traversal.
    #[must_use]
    pub const fn root(&self) -> Node<'a> {
        self.root
    }

    /// Returns the dispatch mode.
    #[must_use]
    pub const fn dispatch(&self) -> DispatchMode {
        self.config.dispatch()
    }

    /// Traverses the subtree, running the registered hooks.
    ///
    /// Each call replays the same sequence of hook invocations.
    pub fn visit(&self) {
        self.visit_node(self.root);
    }

    fn visit_hook(&self, kind: &str) -> Option<&VisitHook<'a>> {
        self.on_kind.get(kind).or(self.on_any.as_ref())
    }

    fn wrap_hook(&self, kind: &str) -> Option<&WrapHook<'a>> {
        self.around_kind.get(kind).or(self.around_any.as_ref())
    }

    fn visit_node(&self, node: Node<'a>) {
        let wrap = self.wrap_hook(node.kind());
        if wrap.is_none() || self.dispatch() == DispatchMode::Independent {
            self.fire(node);
        }
        match wrap {
            Some(hook) => hook(
                node,
                &Continuation {
                    visitor: self,
                    node,
                },
            ),
            None => self.visit_children(node),
        }
    }

    fn visit_children(&self, node: Node<'a>) {
        for child in node.children() {
            self.visit_node(child);
        }
    }

    fn fire(&self, node: Node<'a>) {
        if let Some(hook) = self.visit_hook(node.kind()) {
            hook(node);
        }
    }
}

impl fmt::Debug for Visitor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut on_kinds: Vec<_> = self.on_kind.keys().collect();
        on_kinds.sort();
        let mut around_kinds: Vec<_> = self.around_kind.keys().collect();
        around_kinds.sort();
        f.debug_struct("Visitor")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("on_kind", &on_kinds)
            .field("on_any", &self.on_any.is_some())
            .field("around_kind", &around_kinds)
            .field("around_any", &self.around_any.is_some())
            .finish()
    }
}

/// Handle passed to wrap hooks for the node being wrapped.
pub struct Continuation<'v, 'a> {
    visitor: &'v Visitor<'a>,
    node: Node<'a>,
}

impl<'a> Continuation<'_, 'a> {
    /// Returns the wrapped node.
    #[must_use]
    pub const fn node(&self) -> Node<'a> {
        self.node
    }

    /// Traverses the wrapped node's children.
    ///
    /// May be called any number of times; not calling it skips the subtree.
    pub fn proceed(&self) {
        self.visitor.visit_children(self.node);
    }

    /// Runs the visit hook resolved for the wrapped node, if any.
    pub fn visit(&self) {
        self.visitor.fire(self.node);
    }
}

impl fmt::Debug for Continuation<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{Parser, SupportedLanguage, SyntaxTree};
    use rstest::{fixture, rstest};

    #[fixture]
    fn tree() -> SyntaxTree {
        Parser::new(SupportedLanguage::Math)
            .parse("1 + x * 3\n")
            .expect("math parses")
    }

    #[rstest]
    fn kind_hooks_take_precedence(tree: SyntaxTree) {
        let log = RefCell::new(Vec::new());
        Visitor::new(tree.root_node())
            .on(|node| log.borrow_mut().push(node.kind().to_owned()))
            .on_kind("sum", |_| log.borrow_mut().push("custom_sum".to_owned()))
            .visit();
        assert_eq!(
            log.into_inner(),
            ["expression", "custom_sum", "number", "+", "product", "variable", "*", "number"]
        );
    }

    #[rstest]
    fn proceed_can_run_more_than_once(tree: SyntaxTree) {
        let visits = RefCell::new(0_usize);
        Visitor::new(tree.root_node())
            .on_kind("variable", |_| *visits.borrow_mut() += 1)
            .around_kind("product", |_, cont| {
                cont.proceed();
                cont.proceed();
            })
            .visit();
        assert_eq!(visits.into_inner(), 2);
    }

    #[rstest]
    fn wrap_supersedes_leaves_visiting_to_the_wrap_hook(tree: SyntaxTree) {
        let log = RefCell::new(Vec::new());
        let config = VisitorConfig::new(DispatchMode::WrapSupersedes);
        Visitor::with_config(tree.root_node(), config)
            .on(|node| log.borrow_mut().push(node.kind()))
            .around_kind("sum", |_, cont| cont.proceed())
            .around_kind("product", |_, cont| {
                cont.visit();
                cont.proceed();
            })
            .visit();
        assert_eq!(
            log.into_inner(),
            ["expression", "number", "+", "product", "variable", "*", "number"]
        );
    }

    #[rstest]
    fn visiting_twice_repeats_the_sequence(tree: SyntaxTree) {
        let log = RefCell::new(Vec::new());
        let visitor = Visitor::new(tree.root_node()).on(|node| log.borrow_mut().push(node.kind()));
        visitor.visit();
        let first = log.take();
        visitor.visit();
        drop(visitor);
        assert_eq!(first, log.into_inner());
    }
}
