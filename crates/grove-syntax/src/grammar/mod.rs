//! Grammar capabilities and parse backends.
//!
//! A [`Grammar`] answers the static questions query compilation asks (which
//! node kinds and fields exist) and creates [`ParseBackend`]s, which turn
//! source text into a [`SyntaxArena`]. Tree-sitter grammars and the built-in
//! math grammar both sit behind these two traits.

mod math;
mod tree_sitter_grammar;

use std::fmt;

use crate::arena::SyntaxArena;
use crate::document::TextEdit;
use crate::error::SyntaxError;
use crate::language::SupportedLanguage;

pub use math::MathGrammar;
pub use tree_sitter_grammar::TreeSitterGrammar;

pub(crate) const PARSE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::parse");

pub(crate) static MATH: MathGrammar = MathGrammar;
pub(crate) static RUST: TreeSitterGrammar = TreeSitterGrammar::rust();
pub(crate) static PYTHON: TreeSitterGrammar = TreeSitterGrammar::python();
pub(crate) static TYPESCRIPT: TreeSitterGrammar = TreeSitterGrammar::typescript();

/// Static knowledge about a language's syntax.
pub trait Grammar: fmt::Debug + Send + Sync {
    /// Returns the language this grammar parses.
    fn language(&self) -> SupportedLanguage;

    /// Returns whether `kind` names a node of the grammar.
    ///
    /// `named` distinguishes `(identifier)` from the literal `"+"`.
    fn has_node_kind(&self, kind: &str, named: bool) -> bool;

    /// Returns whether `field` is a field name of the grammar.
    fn has_field(&self, field: &str) -> bool;

    /// Creates a fresh parse backend.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::ParserInit`] when the underlying parser
    /// rejects the grammar.
    fn backend(&self) -> Result<Box<dyn ParseBackend>, SyntaxError>;
}

/// A stateful parser producing arenas.
///
/// Backends may keep the previous tree to speed up a reparse; the `edit`
/// hint describes how the source changed since the previous call.
pub trait ParseBackend: Send {
    /// Returns the language this backend parses.
    fn language(&self) -> SupportedLanguage;

    /// Parses `source` into a fresh arena.
    ///
    /// Syntax errors never fail the parse; they surface as `ERROR` and
    /// `MISSING` nodes.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::Parse`] when the engine produces no tree at
    /// all.
    fn parse(&mut self, source: &str, edit: Option<&TextEdit>)
    -> Result<SyntaxArena, SyntaxError>;
}
