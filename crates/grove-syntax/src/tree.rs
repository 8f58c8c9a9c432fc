//! Parsed documents that can be queried and edited in place.

use std::fmt;
use std::ops::Range;

use tracing::{debug, warn};

use crate::arena::SyntaxArena;
use crate::config::{ParserConfig, QueryOptions};
use crate::document::Document;
use crate::error::SyntaxError;
use crate::grammar::ParseBackend;
use crate::language::SupportedLanguage;
use crate::node::Node;
use crate::query::{Query, QueryMatches};

const EDIT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::edit");
const CONTEXT_LIMIT: usize = 50;

/// A document together with its current syntax tree.
///
/// Parsing is error-tolerant, so a tree always exists; use
/// [`SyntaxTree::has_errors`] to check whether it contains `ERROR` or
/// `MISSING` nodes.
pub struct SyntaxTree {
    language: SupportedLanguage,
    document: Document,
    arena: SyntaxArena,
    backend: Box<dyn ParseBackend>,
    config: ParserConfig,
}

impl SyntaxTree {
    pub(crate) fn new(
        document: Document,
        arena: SyntaxArena,
        backend: Box<dyn ParseBackend>,
        config: ParserConfig,
    ) -> Self {
        Self {
            language: backend.language(),
            document,
            arena,
            backend,
            config,
        }
    }

    pub(crate) fn into_parts(self) -> (Document, Box<dyn ParseBackend>) {
        (self.document, self.backend)
    }

    /// Returns the language of the tree.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the document the tree was parsed from.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Returns the current source text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.document.as_str()
    }

    /// Returns the root node.
    #[must_use]
    pub fn root_node(&self) -> Node<'_> {
        self.arena.root(self.document.as_str())
    }

    /// Returns the number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Compiles `source` for this tree's language and runs it.
    ///
    /// # Errors
    ///
    /// Returns the compilation errors of [`Query::new`].
    pub fn query(&self, source: &str) -> Result<QueryMatches<'_>, SyntaxError> {
        self.query_with(source, &QueryOptions::default())
    }

    /// Compiles `source` and runs it within the limits of `options`.
    ///
    /// # Errors
    ///
    /// Returns the compilation errors of [`Query::new`].
    pub fn query_with(
        &self,
        source: &str,
        options: &QueryOptions,
    ) -> Result<QueryMatches<'_>, SyntaxError> {
        let query = Query::new(self.language.grammar(), source)?;
        query.matches_in(self, options)
    }

    /// Replaces the bytes in `range` with `replacement` and reparses.
    ///
    /// Nodes borrowed from the tree cannot outlive this call, so copy any
    /// ranges or text needed for the edit out of them first.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::OutOfBounds`] when `start > end` or
    /// `end > len`, and [`SyntaxError::NotCharBoundary`] when either end
    /// splits a character; the document is unchanged in both cases. Returns
    /// [`SyntaxError::Parse`] when the backend produces no tree, after
    /// restoring the previous text.
    pub fn edit(&mut self, range: Range<usize>, replacement: &str) -> Result<(), SyntaxError> {
        let removed = self.document.slice(range.clone())?.to_owned();
        let edit = self.document.replace(range, replacement)?;
        let hint = self.config.incremental().then_some(&edit);

        match self.backend.parse(self.document.as_str(), hint) {
            Ok(arena) => {
                self.arena = arena;
                debug!(
                    target: EDIT_TARGET,
                    language = %self.language,
                    start = edit.start_byte,
                    deleted = edit.deleted_len(),
                    inserted = edit.inserted_len(),
                    nodes = self.arena.len(),
                    "applied edit"
                );
                Ok(())
            }
            Err(err) => {
                if let Err(restore) = self
                    .document
                    .replace(edit.start_byte..edit.new_end_byte, &removed)
                {
                    warn!(
                        target: EDIT_TARGET,
                        error = %restore,
                        "failed to restore document after reparse error"
                    );
                }
                Err(err)
            }
        }
    }

    /// Removes the bytes in `range` and reparses.
    ///
    /// # Errors
    ///
    /// See [`SyntaxTree::edit`].
    pub fn delete(&mut self, range: Range<usize>) -> Result<(), SyntaxError> {
        self.edit(range, "")
    }

    /// Returns whether the tree contains any `ERROR` or `MISSING` node.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.root_node().has_error()
    }

    /// Describes every `ERROR` and `MISSING` node in pre-order.
    #[must_use]
    pub fn errors(&self) -> Vec<SyntaxErrorInfo> {
        self.root_node()
            .descendants()
            .filter(|node| node.is_error() || node.is_missing())
            .map(SyntaxErrorInfo::from_node)
            .collect()
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language)
            .field("document_len", &self.document.len())
            .field("nodes", &self.arena.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Information about a syntax error found during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// Byte range of the error in the source.
    pub byte_range: Range<usize>,
    /// Line number (one-based) where the error starts.
    pub line: u32,
    /// Column number (one-based) where the error starts.
    pub column: u32,
    /// A snippet of the problematic source text.
    pub context: String,
    /// Human-readable description of the error.
    pub message: String,
}

impl SyntaxErrorInfo {
    fn from_node(node: Node<'_>) -> Self {
        let text = node.text();
        let context = if text.len() > CONTEXT_LIMIT {
            let truncated: String = text.chars().take(CONTEXT_LIMIT.saturating_sub(3)).collect();
            format!("{truncated}...")
        } else {
            text.to_owned()
        };

        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_owned()
        };

        let (line, column) = node.start_position().to_one_based();

        Self {
            byte_range: node.byte_range(),
            line,
            column,
            context,
            message,
        }
    }
}
