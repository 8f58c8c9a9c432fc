//! Entry point for turning source text into syntax trees.
//!
//! A [`Parser`] pairs a language with a [`ParserConfig`]. It is cheap to
//! create; each parsed [`SyntaxTree`] owns its own parse backend, so trees
//! can be edited independently and moved across threads.

use std::str::FromStr;

use tracing::debug;

use crate::config::ParserConfig;
use crate::document::{Document, TextEdit};
use crate::error::SyntaxError;
use crate::grammar::{Grammar, PARSE_TARGET};
use crate::language::{LanguageParseError, SupportedLanguage};
use crate::tree::SyntaxTree;

/// Produces syntax trees for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parser {
    language: SupportedLanguage,
    config: ParserConfig,
}

impl Parser {
    /// Creates a parser for `language` with the default configuration.
    #[must_use]
    pub fn new(language: SupportedLanguage) -> Self {
        Self {
            language,
            config: ParserConfig::default(),
        }
    }

    /// Replaces the parser configuration.
    #[must_use]
    pub const fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the language this parser produces trees for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the parser configuration.
    #[must_use]
    pub const fn config(&self) -> ParserConfig {
        self.config
    }

    /// Returns the grammar used by this parser.
    #[must_use]
    pub fn grammar(&self) -> &'static dyn Grammar {
        self.language.grammar()
    }

    /// Parses `source` from scratch.
    ///
    /// Invalid syntax never fails the parse; it shows up as `ERROR` and
    /// `MISSING` nodes in the returned tree.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::ParserInit`] when the grammar cannot be loaded
    /// and [`SyntaxError::Parse`] when the engine produces no tree.
    pub fn parse(&self, source: &str) -> Result<SyntaxTree, SyntaxError> {
        let mut backend = self.grammar().backend()?;
        let arena = backend.parse(source, None)?;
        debug!(
            target: PARSE_TARGET,
            language = %self.language,
            source_bytes = source.len(),
            nodes = arena.len(),
            "parsed document"
        );
        Ok(SyntaxTree::new(
            Document::new(source),
            arena,
            backend,
            self.config,
        ))
    }

    /// Parses `source` as a new version of `previous`.
    ///
    /// The change between the two texts is derived from their common prefix
    /// and suffix and handed to the backend as an incremental hint. A tree
    /// of another language is discarded and `source` is parsed from
    /// scratch.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse`].
    pub fn reparse(&self, previous: SyntaxTree, source: &str) -> Result<SyntaxTree, SyntaxError> {
        if previous.language() != self.language {
            debug!(
                target: PARSE_TARGET,
                previous = %previous.language(),
                language = %self.language,
                "previous tree belongs to another language; parsing from scratch"
            );
            return self.parse(source);
        }

        let (document, mut backend) = previous.into_parts();
        let edit = TextEdit::between(document.as_str(), source);
        let hint = self.config.incremental().then_some(&edit);
        let arena = backend.parse(source, hint)?;
        debug!(
            target: PARSE_TARGET,
            language = %self.language,
            start = edit.start_byte,
            deleted = edit.deleted_len(),
            inserted = edit.inserted_len(),
            nodes = arena.len(),
            "reparsed document"
        );
        Ok(SyntaxTree::new(
            Document::new(source),
            arena,
            backend,
            self.config,
        ))
    }

    /// Parses `source`, reusing `previous` when one is given.
    ///
    /// # Errors
    ///
    /// See [`Parser::parse`].
    pub fn parse_with(
        &self,
        previous: Option<SyntaxTree>,
        source: &str,
    ) -> Result<SyntaxTree, SyntaxError> {
        match previous {
            Some(tree) => self.reparse(tree, source),
            None => self.parse(source),
        }
    }
}

impl FromStr for Parser {
    type Err = LanguageParseError;

    /// Creates a parser from a language name such as `"math"` or `"rust"`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        name.parse().map(Self::new)
    }
}
