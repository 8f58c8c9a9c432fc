//! Error types for parsing, querying, and editing operations.
//!
//! Every fallible operation in `grove-syntax` reports a [`SyntaxError`].
//! Invalid source text is deliberately absent from this taxonomy: parsing
//! always yields a tree, with `ERROR` and `MISSING` nodes marking the
//! problems.

use thiserror::Error;

use crate::language::SupportedLanguage;

/// Errors from syntax tree operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyntaxError {
    /// An edit range lies outside the current document bounds.
    #[error("range {start}..{end} is out of bounds for document of length {len}")]
    OutOfBounds {
        /// Requested start offset.
        start: usize,
        /// Requested end offset.
        end: usize,
        /// Document length at the time of the request.
        len: usize,
    },

    /// An edit boundary falls inside a multi-byte UTF-8 character.
    #[error("byte offset {offset} is not on a UTF-8 character boundary")]
    NotCharBoundary {
        /// The offending offset.
        offset: usize,
    },

    /// A query pattern could not be compiled against the grammar.
    #[error("invalid query for {language} at offset {offset}: {message}")]
    QueryCompilation {
        /// The grammar the query was compiled against.
        language: SupportedLanguage,
        /// Byte offset in the query source where the problem was detected.
        offset: usize,
        /// Description of the compilation failure.
        message: String,
    },

    /// Two capture annotations in one pattern share a name.
    #[error("capture @{name} is declared more than once in the same pattern")]
    DuplicateCaptureName {
        /// The duplicated capture name.
        name: String,
    },

    /// A query compiled for one language was run on a tree of another.
    #[error("query for {query} cannot run on a {tree} tree")]
    LanguageMismatch {
        /// The language the query was compiled for.
        query: SupportedLanguage,
        /// The language of the tree.
        tree: SupportedLanguage,
    },

    /// A capture name was not bound in a match.
    #[error("no capture named @{name} in this match")]
    CaptureNotFound {
        /// The requested capture name.
        name: String,
    },

    /// A match index was outside the result list.
    #[error("no match at index {index} ({len} matches)")]
    MatchNotFound {
        /// The requested index.
        index: usize,
        /// Number of matches available.
        len: usize,
    },

    /// Failed to initialise the parser for a language.
    #[error("failed to initialise parser for {language}: {message}")]
    ParserInit {
        /// The language that failed to initialise.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// The parsing engine failed to produce a tree.
    #[error("failed to parse {language}: {message}")]
    Parse {
        /// The language that failed to parse.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },
}

impl SyntaxError {
    /// Creates an out-of-bounds error.
    #[must_use]
    pub const fn out_of_bounds(start: usize, end: usize, len: usize) -> Self {
        Self::OutOfBounds { start, end, len }
    }

    /// Creates a character boundary error.
    #[must_use]
    pub const fn not_char_boundary(offset: usize) -> Self {
        Self::NotCharBoundary { offset }
    }

    /// Creates a query compilation error.
    #[must_use]
    pub fn query_compilation(
        language: SupportedLanguage,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::QueryCompilation {
            language,
            offset,
            message: message.into(),
        }
    }

    /// Creates a language mismatch error.
    #[must_use]
    pub const fn language_mismatch(query: SupportedLanguage, tree: SupportedLanguage) -> Self {
        Self::LanguageMismatch { query, tree }
    }

    /// Creates a duplicate capture name error.
    #[must_use]
    pub fn duplicate_capture(name: impl Into<String>) -> Self {
        Self::DuplicateCaptureName { name: name.into() }
    }

    /// Creates a missing capture error.
    #[must_use]
    pub fn capture_not_found(name: impl Into<String>) -> Self {
        Self::CaptureNotFound { name: name.into() }
    }

    /// Creates a missing match error.
    #[must_use]
    pub const fn match_not_found(index: usize, len: usize) -> Self {
        Self::MatchNotFound { index, len }
    }

    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParserInit {
            language,
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[must_use]
    pub fn parse(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::Parse {
            language,
            message: message.into(),
        }
    }
}
