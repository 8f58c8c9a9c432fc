//! Language identifiers and grammar resolution.
//!
//! This module provides the [`SupportedLanguage`] enum for naming grammars and
//! resolving them to the [`Grammar`] capability used for parsing and query
//! compilation.
//!
//! Rust, Python and TypeScript come from tree-sitter grammar crates. `Math`
//! names the small arithmetic grammar built into this crate. It has no
//! external grammar to load, so it is always available and is the default.
//! Files with the `.math` extension are detected as this language.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::grammar::{Grammar, MATH, PYTHON, RUST, TYPESCRIPT};

/// Languages supported for parsing and querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupportedLanguage {
    /// Arithmetic expressions parsed by the built-in [`MathGrammar`]
    /// (`.math`).
    ///
    /// [`MathGrammar`]: crate::MathGrammar
    #[default]
    Math,
    /// Rust source files (`.rs`).
    Rust,
    /// Python source files (`.py`).
    Python,
    /// TypeScript source files (`.ts`, `.tsx`).
    TypeScript,
}

impl SupportedLanguage {
    /// Detects the language from a file extension.
    ///
    /// Matching ignores ASCII case. `math` selects the built-in arithmetic
    /// grammar. Returns `None` if the extension is not recognised.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        let normalised = ext.to_ascii_lowercase();
        match normalised.as_str() {
            "math" => Some(Self::Math),
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            _ => None,
        }
    }

    /// Detects the language from a file path by examining its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the grammar capability for this language.
    #[must_use]
    pub fn grammar(self) -> &'static dyn Grammar {
        match self {
            Self::Math => &MATH,
            Self::Rust => &RUST,
            Self::Python => &PYTHON,
            Self::TypeScript => &TYPESCRIPT,
        }
    }

    /// Returns the lower-case identifier for this language.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Rust => "rust",
            Self::Python => "python",
            Self::TypeScript => "typescript",
        }
    }

    /// Returns all supported languages.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Math, Self::Rust, Self::Python, Self::TypeScript]
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when parsing a language identifier fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language: '{0}'")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// Returns the input that failed to parse.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl FromStr for SupportedLanguage {
    type Err = LanguageParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "math" => Ok(Self::Math),
            "rust" | "rs" => Ok(Self::Rust),
            "python" | "py" => Ok(Self::Python),
            "typescript" | "ts" => Ok(Self::TypeScript),
            other => Err(LanguageParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("math", SupportedLanguage::Math)]
    #[case("rs", SupportedLanguage::Rust)]
    #[case("pyi", SupportedLanguage::Python)]
    #[case("TSX", SupportedLanguage::TypeScript)]
    fn from_extension_recognises_supported_languages(
        #[case] ext: &str,
        #[case] expected: SupportedLanguage,
    ) {
        assert_eq!(SupportedLanguage::from_extension(ext), Some(expected));
    }

    #[rstest]
    #[case("exprs/total.math", Some(SupportedLanguage::Math))]
    #[case("exprs/TOTAL.MATH", Some(SupportedLanguage::Math))]
    #[case("notes/maths.txt", None)]
    fn from_path_detects_math_files(
        #[case] path: &str,
        #[case] expected: Option<SupportedLanguage>,
    ) {
        assert_eq!(SupportedLanguage::from_path(Path::new(path)), expected);
    }

    #[test]
    fn math_is_the_default_language() {
        assert_eq!(SupportedLanguage::default(), SupportedLanguage::Math);
        assert_eq!(SupportedLanguage::default().grammar().language(), SupportedLanguage::Math);
    }

    #[test]
    fn from_path_returns_none_for_no_extension() {
        assert_eq!(SupportedLanguage::from_path(Path::new("Makefile")), None);
    }

    #[rstest]
    #[case("math", SupportedLanguage::Math)]
    #[case(" Python ", SupportedLanguage::Python)]
    #[case("TYPESCRIPT", SupportedLanguage::TypeScript)]
    fn from_str_parses_language_names(#[case] input: &str, #[case] expected: SupportedLanguage) {
        assert_eq!(SupportedLanguage::from_str(input), Ok(expected));
    }

    #[test]
    fn from_str_reports_the_rejected_input() {
        let err = "go".parse::<SupportedLanguage>().expect_err("go is unsupported");
        assert_eq!(err.input(), "go");
    }

    #[test]
    fn grammar_reports_its_own_language() {
        for language in SupportedLanguage::all() {
            assert_eq!(language.grammar().language(), *language);
        }
    }
}
