//! Syntax trees, pattern queries, in-place edits and hook-based traversal on
//! top of an incremental parser.
//!
//! This crate provides:
//!
//! - **Parsing** via [`Parser`], producing error-tolerant [`SyntaxTree`]s in
//!   which invalid input shows up as `ERROR` and `MISSING` nodes
//! - **Pattern queries** via [`Query`], an S-expression pattern language with
//!   fields, wildcards, alternations, optional elements, captures and
//!   equality predicates
//! - **Editing** via [`SyntaxTree::edit`] and [`SyntaxTree::delete`], which
//!   splice the document and reparse incrementally
//! - **Traversal** via [`Visitor`], with per-kind visit and wrap hooks
//!
//! # Supported Languages
//!
//! - Math expressions (built-in grammar, `.math`)
//! - Rust (`.rs`)
//! - Python (`.py`, `.pyi`)
//! - TypeScript (`.ts`, `.tsx`, `.mts`, `.cts`)
//!
//! # Example: Querying
//!
//! ```
//! use grove_syntax::{Parser, SupportedLanguage};
//!
//! let tree = Parser::new(SupportedLanguage::Math).parse("1 + x * 3 + 2\n")?;
//! let matches = tree.query("(sum) @sum")?;
//!
//! assert_eq!(matches.len(), 2);
//! assert_eq!(matches.dig(0, "sum")?.text(), "1 + x * 3 + 2");
//! assert_eq!(matches.dig(1, "sum")?.text(), "1 + x * 3");
//! # Ok::<(), grove_syntax::SyntaxError>(())
//! ```
//!
//! # Example: Editing
//!
//! ```
//! use grove_syntax::{Parser, SupportedLanguage};
//!
//! let mut tree = Parser::new(SupportedLanguage::Math).parse("1 + x * 3 + 2\n")?;
//! let product = tree.query("(product) @p")?.dig(0, "p")?.byte_range();
//! tree.edit(product, "y")?;
//!
//! assert_eq!(tree.text(), "1 + y + 2\n");
//! assert!(!tree.has_errors());
//! # Ok::<(), grove_syntax::SyntaxError>(())
//! ```

mod arena;
mod config;
mod document;
mod error;
mod grammar;
mod language;
mod node;
mod parser;
mod position;
mod query;
mod tree;
mod visitor;

pub use arena::{ArenaBuilder, NodeId, NodeSpec, SyntaxArena};
pub use config::{DispatchMode, DispatchModeParseError, ParserConfig, QueryOptions, VisitorConfig};
pub use document::{Document, TextEdit};
pub use error::SyntaxError;
pub use grammar::{Grammar, MathGrammar, ParseBackend, TreeSitterGrammar};
pub use language::{LanguageParseError, SupportedLanguage};
pub use node::{Descendants, Node};
pub use parser::Parser;
pub use position::Position;
pub use query::{Capture, Match, Query, QueryMatches};
pub use tree::{SyntaxErrorInfo, SyntaxTree};
pub use visitor::{Continuation, Visitor};

#[cfg(test)]
mod tests;
