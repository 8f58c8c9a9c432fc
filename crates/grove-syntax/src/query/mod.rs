//! Pattern queries over syntax trees.
//!
//! A [`Query`] is compiled once against a [`Grammar`] and can then run over
//! any tree of the same language. Every node is tried in pre-order and, for
//! each node, every pattern in declaration order; each successful
//! (node, pattern) pair yields one [`Match`].
//!
//! # Example
//!
//! ```
//! use grove_syntax::{Parser, SupportedLanguage};
//!
//! let tree = Parser::new(SupportedLanguage::Math).parse("1 + x * 3\n")?;
//! let matches = tree.query("(sum right: (product) @product)")?;
//! assert_eq!(matches.dig(0, "product")?.text(), "x * 3");
//! # Ok::<(), grove_syntax::SyntaxError>(())
//! ```

mod captures;
mod lexer;
mod matching;
pub(crate) mod parser;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::QueryOptions;
use crate::error::SyntaxError;
use crate::grammar::Grammar;
use crate::language::SupportedLanguage;
use crate::node::Node;
use crate::tree::SyntaxTree;

pub use captures::{Capture, Match, QueryMatches};

use self::parser::Pattern;

pub(crate) const QUERY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::query");

/// A compiled set of patterns.
#[derive(Debug, Clone)]
pub struct Query {
    language: SupportedLanguage,
    source: String,
    patterns: Vec<Pattern>,
}

impl Query {
    /// Compiles `source` against `grammar`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::QueryCompilation`] for malformed syntax,
    /// unknown node kinds, fields or predicates, predicates naming
    /// undeclared captures, and empty queries. Returns
    /// [`SyntaxError::DuplicateCaptureName`] when one pattern declares a
    /// capture name twice.
    pub fn new(grammar: &dyn Grammar, source: &str) -> Result<Self, SyntaxError> {
        let patterns = parser::compile(grammar, source)?;
        debug!(
            target: QUERY_TARGET,
            language = %grammar.language(),
            patterns = patterns.len(),
            "compiled query"
        );
        Ok(Self {
            language: grammar.language(),
            source: source.to_owned(),
            patterns,
        })
    }

    /// Compiles `source` against the grammar of `language`.
    ///
    /// # Errors
    ///
    /// See [`Query::new`].
    pub fn for_language(language: SupportedLanguage, source: &str) -> Result<Self, SyntaxError> {
        Self::new(language.grammar(), source)
    }

    /// Returns the language the query was compiled for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the query source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the number of top-level patterns.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Returns the byte offset at which pattern `index` starts.
    #[must_use]
    pub fn pattern_start(&self, index: usize) -> Option<usize> {
        self.patterns.get(index).map(|pattern| pattern.start)
    }

    /// Returns the capture names of pattern `index` in declaration order.
    #[must_use]
    pub fn capture_names(&self, index: usize) -> Option<&[String]> {
        self.patterns
            .get(index)
            .map(|pattern| pattern.capture_names.as_slice())
    }

    /// Runs the query over the whole of `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::LanguageMismatch`] when `tree` was parsed in a
    /// language other than the one the query was compiled for. Node kinds
    /// were validated against that grammar only.
    pub fn matches<'t>(&self, tree: &'t SyntaxTree) -> Result<QueryMatches<'t>, SyntaxError> {
        self.matches_in(tree, &QueryOptions::default())
    }

    /// Runs the query over `tree` within the limits of `options`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::LanguageMismatch`] as [`Query::matches`] does.
    pub fn matches_in<'t>(
        &self,
        tree: &'t SyntaxTree,
        options: &QueryOptions,
    ) -> Result<QueryMatches<'t>, SyntaxError> {
        if tree.language() != self.language {
            warn!(
                target: QUERY_TARGET,
                query_language = %self.language,
                tree_language = %tree.language(),
                "refusing to run query against a tree of another language"
            );
            return Err(SyntaxError::language_mismatch(self.language, tree.language()));
        }
        Ok(self.matches_with(tree.root_node(), options))
    }

    /// Runs the query over the subtree rooted at `root`.
    ///
    /// Nodes do not record their language, so the caller is responsible for
    /// passing a subtree of the query's language.
    #[must_use]
    pub fn matches_with<'t>(&self, root: Node<'t>, options: &QueryOptions) -> QueryMatches<'t> {
        let limit = options.match_limit().unwrap_or(usize::MAX);
        let mut matches = Vec::new();

        'nodes: for node in root.descendants() {
            if !options.admits(&node.byte_range()) {
                continue;
            }
            for (pattern_index, pattern) in self.patterns.iter().enumerate() {
                if matches.len() >= limit {
                    break 'nodes;
                }
                let Some(bindings) = matching::match_pattern(pattern, node) else {
                    continue;
                };
                let captures: IndexMap<String, Capture<'t>> = pattern
                    .capture_names
                    .iter()
                    .zip(bindings)
                    .filter_map(|(name, bound)| {
                        bound.map(|captured| (name.clone(), Capture::new(name.clone(), captured)))
                    })
                    .collect();
                matches.push(Match::new(pattern_index, node, captures));
            }
        }

        debug!(
            target: QUERY_TARGET,
            matches = matches.len(),
            limited = matches.len() >= limit,
            "query executed"
        );
        QueryMatches::new(matches)
    }
}
