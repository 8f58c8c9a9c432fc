//! Options for parsing, query execution and visitor dispatch.
//!
//! Every option struct deserialises with `serde`, with missing keys taking
//! their defaults, so callers can embed them in their own configuration
//! files.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Parser behaviour.
///
/// # Defaults
///
/// - `incremental`: `true`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    incremental: bool,
}

impl ParserConfig {
    /// Creates a parser configuration.
    #[must_use]
    pub const fn new(incremental: bool) -> Self {
        Self { incremental }
    }

    /// Returns whether edits are passed to the backend as reparse hints.
    #[must_use]
    pub const fn incremental(&self) -> bool {
        self.incremental
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { incremental: true }
    }
}

/// Limits applied while executing a query.
///
/// The default runs over the whole tree with no match limit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryOptions {
    byte_range: Option<Range<usize>>,
    match_limit: Option<usize>,
}

impl QueryOptions {
    /// Restricts matching to nodes intersecting `range`.
    #[must_use]
    pub const fn with_byte_range(mut self, range: Range<usize>) -> Self {
        self.byte_range = Some(range);
        self
    }

    /// Stops after `limit` matches.
    #[must_use]
    pub const fn with_match_limit(mut self, limit: usize) -> Self {
        self.match_limit = Some(limit);
        self
    }

    /// Returns the byte range restriction, if any.
    #[must_use]
    pub const fn byte_range(&self) -> Option<&Range<usize>> {
        self.byte_range.as_ref()
    }

    /// Returns the match limit, if any.
    #[must_use]
    pub const fn match_limit(&self) -> Option<usize> {
        self.match_limit
    }

    /// Returns whether a node spanning `node_range` is in scope.
    ///
    /// Zero-width nodes count as intersecting when they sit inside or on
    /// the edge of the range.
    pub(crate) fn admits(&self, node_range: &Range<usize>) -> bool {
        self.byte_range.as_ref().is_none_or(|range| {
            if node_range.start == node_range.end {
                range.start <= node_range.start && node_range.start <= range.end
            } else {
                node_range.start < range.end && range.start < node_range.end
            }
        })
    }
}

/// How visit hooks and wrap hooks combine for one node.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DispatchMode {
    /// The visit hook fires for every node; wrap hooks only control descent.
    #[default]
    Independent,
    /// A resolved wrap hook replaces the automatic visit hook call and must
    /// call [`Continuation::visit`](crate::Continuation::visit) itself.
    WrapSupersedes,
}

/// Errors encountered while parsing a [`DispatchMode`] from text.
pub type DispatchModeParseError = strum::ParseError;

/// Visitor behaviour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct VisitorConfig {
    dispatch: DispatchMode,
}

impl VisitorConfig {
    /// Creates a visitor configuration.
    #[must_use]
    pub const fn new(dispatch: DispatchMode) -> Self {
        Self { dispatch }
    }

    /// Returns the dispatch mode.
    #[must_use]
    pub const fn dispatch(&self) -> DispatchMode {
        self.dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("independent", DispatchMode::Independent)]
    #[case("wrap_supersedes", DispatchMode::WrapSupersedes)]
    #[case("WRAP_SUPERSEDES", DispatchMode::WrapSupersedes)]
    fn dispatch_mode_parses_from_text(#[case] input: &str, #[case] expected: DispatchMode) {
        assert_eq!(input.parse::<DispatchMode>(), Ok(expected));
    }

    #[test]
    fn missing_keys_take_defaults() {
        let parser: ParserConfig = serde_json::from_str("{}").expect("valid json");
        assert!(parser.incremental());

        let visitor: VisitorConfig =
            serde_json::from_str(r#"{"dispatch":"wrap_supersedes"}"#).expect("valid json");
        assert_eq!(visitor.dispatch(), DispatchMode::WrapSupersedes);

        let options: QueryOptions =
            serde_json::from_str(r#"{"match_limit":2}"#).expect("valid json");
        assert_eq!(options.match_limit(), Some(2));
        assert_eq!(options.byte_range(), None);
    }

    #[rstest]
    #[case(0..3, true)]
    #[case(4..4, true)]
    #[case(5..9, false)]
    #[case(1..1, false)]
    fn byte_range_admits_intersecting_nodes(#[case] node: Range<usize>, #[case] expected: bool) {
        let options = QueryOptions::default().with_byte_range(2..5);
        let admitted = options.admits(&node);
        assert_eq!(admitted, expected);
    }
}
