//! Match results and the captures they bind.

use std::ops::{Deref, Range};

use indexmap::IndexMap;

use crate::error::SyntaxError;
use crate::node::Node;

/// A node bound to a capture name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture<'t> {
    name: String,
    node: Node<'t>,
}

impl<'t> Capture<'t> {
    pub(crate) const fn new(name: String, node: Node<'t>) -> Self {
        Self { name, node }
    }

    /// Returns the capture name, without the `@`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the captured node.
    #[must_use]
    pub const fn node(&self) -> Node<'t> {
        self.node
    }

    /// Returns the source text of the captured node.
    #[must_use]
    pub fn text(&self) -> &'t str {
        self.node.text()
    }

    /// Returns the byte range of the captured node.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.node.byte_range()
    }
}

/// One successful application of a pattern.
#[derive(Debug, Clone)]
pub struct Match<'t> {
    pattern_index: usize,
    node: Node<'t>,
    captures: IndexMap<String, Capture<'t>>,
}

impl<'t> Match<'t> {
    pub(crate) const fn new(
        pattern_index: usize,
        node: Node<'t>,
        captures: IndexMap<String, Capture<'t>>,
    ) -> Self {
        Self {
            pattern_index,
            node,
            captures,
        }
    }

    /// Returns the index of the pattern that produced this match.
    #[must_use]
    pub const fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    /// Returns the node the pattern's outermost element matched.
    #[must_use]
    pub const fn node(&self) -> Node<'t> {
        self.node
    }

    /// Iterates over the bound captures in declaration order.
    pub fn captures(&self) -> impl ExactSizeIterator<Item = &Capture<'t>> {
        self.captures.values()
    }

    /// Returns the number of bound captures.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    /// Returns the capture named `name`, if it was bound.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Capture<'t>> {
        self.captures.get(name)
    }

    /// Returns the capture named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::CaptureNotFound`] when the pattern declares no
    /// such capture or the capture sat on an optional element that did not
    /// match.
    pub fn capture(&self, name: &str) -> Result<&Capture<'t>, SyntaxError> {
        self.get(name)
            .ok_or_else(|| SyntaxError::capture_not_found(name))
    }
}

/// The ordered matches of a query.
///
/// Matches are sorted by the pre-order position of their node, then by
/// pattern index.
#[derive(Debug, Clone, Default)]
pub struct QueryMatches<'t> {
    matches: Vec<Match<'t>>,
}

impl<'t> QueryMatches<'t> {
    pub(crate) const fn new(matches: Vec<Match<'t>>) -> Self {
        Self { matches }
    }

    /// Returns capture `name` of match `index`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::MatchNotFound`] when `index` is out of range and
    /// [`SyntaxError::CaptureNotFound`] when the match did not bind `name`.
    pub fn dig(&self, index: usize, name: &str) -> Result<&Capture<'t>, SyntaxError> {
        self.matches
            .get(index)
            .ok_or_else(|| SyntaxError::match_not_found(index, self.matches.len()))?
            .capture(name)
    }

    /// Consumes the result, returning the matches.
    #[must_use]
    pub fn into_vec(self) -> Vec<Match<'t>> {
        self.matches
    }
}

impl<'t> Deref for QueryMatches<'t> {
    type Target = [Match<'t>];

    fn deref(&self) -> &Self::Target {
        &self.matches
    }
}

impl<'t> IntoIterator for QueryMatches<'t> {
    type Item = Match<'t>;
    type IntoIter = std::vec::IntoIter<Match<'t>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

impl<'a, 't> IntoIterator for &'a QueryMatches<'t> {
    type Item = &'a Match<'t>;
    type IntoIter = std::slice::Iter<'a, Match<'t>>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use crate::{Parser, SupportedLanguage, SyntaxError, SyntaxTree};

    #[fixture]
    fn tree() -> SyntaxTree {
        Parser::new(SupportedLanguage::Math)
            .parse("1 + x * 3 + 2\n")
            .expect("math parses")
    }

    #[rstest]
    fn dig_reports_missing_match_and_capture(tree: SyntaxTree) {
        let matches = tree.query("(sum) @sum").expect("valid query");
        assert_eq!(
            matches.dig(0, "sum").map(|c| c.text()),
            Ok("1 + x * 3 + 2")
        );
        assert_eq!(
            matches.dig(5, "sum").map(|c| c.text()),
            Err(SyntaxError::match_not_found(5, 2))
        );
        assert_eq!(
            matches.dig(1, "product").map(|c| c.text()),
            Err(SyntaxError::capture_not_found("product"))
        );
    }

    #[rstest]
    fn captures_keep_declaration_order(tree: SyntaxTree) {
        let matches = tree
            .query("(sum left: (number) @number right: (product) @product) @whole")
            .expect("valid query");
        let names: Vec<_> = matches
            .first()
            .map(|m| m.captures().map(|c| c.name().to_owned()).collect())
            .unwrap_or_default();
        assert_eq!(names, ["number", "product", "whole"]);
    }
}
