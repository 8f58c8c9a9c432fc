//! Compiler from query source text to [`Pattern`]s.
//!
//! The accepted language is a subset of Tree-sitter's query syntax:
//!
//! ```text
//! pattern   := [field ":"] atom ["?"] capture*
//! atom      := "(" kind child* ")" | "[" pattern+ "]" | "_" | string
//!            | "(" pattern predicate* ")"
//! child     := pattern | "!" field | predicate
//! predicate := "(" "#eq?" | "#not-eq?" capture (capture | string) ")"
//! ```
//!
//! Node kinds and field names are validated against the [`Grammar`] while
//! parsing, so an unknown kind is reported at its byte offset.

use super::lexer::{Token, TokenKind, lex};
use crate::error::SyntaxError;
use crate::grammar::Grammar;

/// What a node must be for a [`NodePattern`] to accept it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KindMatcher {
    /// `(kind)`: a named node of that kind.
    Named(String),
    /// `(_)`: any named node.
    AnyNamed,
    /// `_`: any node at all.
    Any,
    /// `"text"`: an anonymous node with that literal kind.
    Anonymous(String),
    /// `(ERROR)`.
    Error,
    /// `(MISSING)` or `(MISSING kind)`.
    Missing(Option<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodePattern {
    pub(crate) kind: KindMatcher,
    pub(crate) children: Vec<Element>,
    pub(crate) negated_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Node(NodePattern),
    Alternation(Vec<Element>),
}

/// One pattern position, with the decorations that apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) step: Step,
    pub(crate) field: Option<String>,
    pub(crate) optional: bool,
    /// Capture slots bound to the node matching this element.
    pub(crate) captures: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Operand {
    Text(String),
    Capture(usize),
}

/// A resolved `#eq?` or `#not-eq?` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Predicate {
    pub(crate) negated: bool,
    pub(crate) capture: usize,
    pub(crate) operand: Operand,
}

/// A compiled top-level pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    pub(crate) root: Element,
    /// Capture names in declaration order; indices are capture slots.
    pub(crate) capture_names: Vec<String>,
    pub(crate) predicates: Vec<Predicate>,
    /// Byte offset of the pattern in the query source.
    pub(crate) start: usize,
}

#[derive(Debug)]
struct CaptureRef {
    name: String,
    offset: usize,
}

#[derive(Debug)]
enum RawOperand {
    Text(String),
    Capture(CaptureRef),
}

#[derive(Debug)]
struct RawPredicate {
    negated: bool,
    capture: CaptureRef,
    operand: RawOperand,
}

/// Capture declarations and predicates collected while parsing one pattern.
#[derive(Debug, Default)]
struct PatternScope {
    names: Vec<String>,
    predicates: Vec<RawPredicate>,
}

impl PatternScope {
    fn declare(&mut self, name: &str) -> Result<usize, SyntaxError> {
        if self.names.iter().any(|existing| existing == name) {
            return Err(SyntaxError::duplicate_capture(name));
        }
        self.names.push(name.to_owned());
        Ok(self.names.len().saturating_sub(1))
    }

    fn slot(&self, capture: &CaptureRef) -> Option<usize> {
        self.names.iter().position(|name| *name == capture.name)
    }
}

/// Compiles `source` into its top-level patterns.
pub(crate) fn compile(grammar: &dyn Grammar, source: &str) -> Result<Vec<Pattern>, SyntaxError> {
    let mut parser = QueryParser::new(grammar, source);
    let mut patterns = Vec::new();
    while parser.peek_kind().is_some() {
        patterns.push(parser.parse_pattern()?);
    }
    if patterns.is_empty() {
        return Err(parser.error(0, "query contains no patterns"));
    }
    Ok(patterns)
}

/// Resolves `\n`, `\t` and `\<char>` escapes in a quoted literal.
fn unquote(literal: &str) -> String {
    let raw = literal
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(literal);
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some(escaped) => text.push(escaped),
            None => break,
        }
    }
    text
}

struct QueryParser<'q> {
    grammar: &'q dyn Grammar,
    source: &'q str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'q> QueryParser<'q> {
    fn new(grammar: &'q dyn Grammar, source: &'q str) -> Self {
        let tokens = lex(source)
            .into_iter()
            .filter(|token| !token.kind.is_trivia())
            .collect();
        Self {
            grammar,
            source,
            tokens,
            pos: 0,
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::query_compilation(self.grammar.language(), offset, message)
    }

    fn text(&self, token: &Token) -> &'q str {
        self.source.get(token.span.clone()).unwrap_or_default()
    }

    fn nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens
            .get(self.pos.saturating_add(n))
            .map(|token| token.kind)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.nth_kind(0)
    }

    /// Offset of the next token, or the end of the source.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.source.len(), |token| token.span.start)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos = self.pos.saturating_add(1);
        Some(token)
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek_kind() == Some(kind) {
            self.bump()
        } else {
            None
        }
    }

    fn at_predicate(&self) -> bool {
        self.peek_kind() == Some(TokenKind::ParenOpen)
            && self.nth_kind(1) == Some(TokenKind::Predicate)
    }

    /// Reports a token the grammar of queries has no place for.
    fn unexpected(&self, token: &Token, context: &str) -> SyntaxError {
        let text = self.text(token);
        if token.kind == TokenKind::Garbage && text.starts_with('"') {
            return self.error(token.span.start, "unterminated string");
        }
        self.error(token.span.start, format!("unexpected `{text}`{context}"))
    }

    fn parse_pattern(&mut self) -> Result<Pattern, SyntaxError> {
        let start = self.offset();
        let mut scope = PatternScope::default();
        let root = self.parse_element(&mut scope)?;

        if root.field.is_some() {
            return Err(self.error(start, "top-level patterns cannot have a field"));
        }
        if root.optional {
            return Err(self.error(start, "top-level patterns cannot be optional"));
        }

        let predicates = self.resolve_predicates(&scope)?;
        Ok(Pattern {
            root,
            capture_names: scope.names,
            predicates,
            start,
        })
    }

    fn resolve_predicates(&self, scope: &PatternScope) -> Result<Vec<Predicate>, SyntaxError> {
        let resolve = |capture: &CaptureRef| {
            scope.slot(capture).ok_or_else(|| {
                self.error(
                    capture.offset,
                    format!("predicate references undeclared capture @{}", capture.name),
                )
            })
        };
        scope
            .predicates
            .iter()
            .map(|raw| -> Result<Predicate, SyntaxError> {
                let operand = match &raw.operand {
                    RawOperand::Text(text) => Operand::Text(text.clone()),
                    RawOperand::Capture(other) => Operand::Capture(resolve(other)?),
                };
                Ok(Predicate {
                    negated: raw.negated,
                    capture: resolve(&raw.capture)?,
                    operand,
                })
            })
            .collect()
    }

    fn parse_element(&mut self, scope: &mut PatternScope) -> Result<Element, SyntaxError> {
        let field = self.parse_field_prefix()?;
        let mut element = self.parse_atom(scope)?;
        element.field = field;

        match self.peek_kind() {
            Some(TokenKind::Question) => {
                self.bump();
                element.optional = true;
            }
            Some(TokenKind::Star | TokenKind::Plus) => {
                let offset = self.offset();
                let quantifier = self.bump().map_or("", |token| self.text(&token));
                return Err(self.error(
                    offset,
                    format!("quantifier `{quantifier}` is not supported"),
                ));
            }
            _ => {}
        }

        while let Some(token) = self.eat(TokenKind::Capture) {
            let name = self.text(&token).get(1..).unwrap_or_default();
            if name.is_empty() {
                return Err(self.error(token.span.start, "expected a capture name after `@`"));
            }
            element.captures.push(scope.declare(name)?);
        }
        Ok(element)
    }

    /// Consumes `name:` when present and validates the field.
    fn parse_field_prefix(&mut self) -> Result<Option<String>, SyntaxError> {
        if self.peek_kind() != Some(TokenKind::Identifier)
            || self.nth_kind(1) != Some(TokenKind::Colon)
        {
            return Ok(None);
        }
        let Some(token) = self.bump() else {
            return Ok(None);
        };
        self.bump();
        let name = self.text(&token);
        if !self.grammar.has_field(name) {
            return Err(self.error(token.span.start, format!("unknown field `{name}`")));
        }
        Ok(Some(name.to_owned()))
    }

    fn parse_atom(&mut self, scope: &mut PatternScope) -> Result<Element, SyntaxError> {
        let start = self.offset();
        let Some(token) = self.bump() else {
            return Err(self.error(start, "unexpected end of query"));
        };
        let step = match token.kind {
            TokenKind::ParenOpen => match self.peek_kind() {
                Some(TokenKind::ParenOpen | TokenKind::BracketOpen | TokenKind::String) => {
                    return self.parse_group(start, scope);
                }
                Some(TokenKind::Predicate) => {
                    return Err(self.error(start, "predicates must follow a pattern"));
                }
                _ => Step::Node(self.parse_node(start, scope)?),
            },
            TokenKind::BracketOpen => Step::Alternation(self.parse_alternation(start, scope)?),
            TokenKind::String => {
                let text = unquote(self.text(&token));
                if !self.grammar.has_node_kind(&text, false) {
                    return Err(self.error(start, format!("unknown anonymous node \"{text}\"")));
                }
                Step::Node(leaf(KindMatcher::Anonymous(text)))
            }
            TokenKind::Identifier => {
                let name = self.text(&token);
                if name != "_" {
                    return Err(self.error(
                        start,
                        format!("node patterns must be parenthesised: `({name})`"),
                    ));
                }
                Step::Node(leaf(KindMatcher::Any))
            }
            _ => return Err(self.unexpected(&token, "")),
        };
        Ok(Element {
            step,
            field: None,
            optional: false,
            captures: Vec::new(),
        })
    }

    /// Parses `((pattern) predicate*)` after the opening parenthesis.
    fn parse_group(
        &mut self,
        open: usize,
        scope: &mut PatternScope,
    ) -> Result<Element, SyntaxError> {
        let mut inner = None;
        loop {
            match self.peek_kind() {
                Some(TokenKind::ParenClose) => {
                    self.bump();
                    break;
                }
                None => return Err(self.error(open, "unclosed `(`")),
                Some(_) if self.at_predicate() => {
                    let predicate = self.parse_predicate()?;
                    scope.predicates.push(predicate);
                }
                Some(_) => {
                    let offset = self.offset();
                    let element = self.parse_element(scope)?;
                    if inner.replace(element).is_some() {
                        return Err(self.error(offset, "sequence patterns are not supported"));
                    }
                }
            }
        }
        inner.ok_or_else(|| self.error(open, "empty group"))
    }

    /// Parses `kind child*)` after the opening parenthesis.
    fn parse_node(
        &mut self,
        open: usize,
        scope: &mut PatternScope,
    ) -> Result<NodePattern, SyntaxError> {
        let kind_offset = self.offset();
        let Some(token) = self.eat(TokenKind::Identifier) else {
            return Err(self.error(kind_offset, "expected a node kind"));
        };
        let kind = match self.text(&token) {
            "_" => KindMatcher::AnyNamed,
            "ERROR" => KindMatcher::Error,
            "MISSING" => KindMatcher::Missing(self.parse_missing_kind()?),
            other => {
                if !self.grammar.has_node_kind(other, true) {
                    return Err(self.error(kind_offset, format!("unknown node kind `{other}`")));
                }
                KindMatcher::Named(other.to_owned())
            }
        };

        let mut node = leaf(kind);
        loop {
            match self.peek_kind() {
                Some(TokenKind::ParenClose) => {
                    self.bump();
                    return Ok(node);
                }
                None => return Err(self.error(open, "unclosed `(`")),
                Some(TokenKind::Bang) => {
                    self.bump();
                    let offset = self.offset();
                    let field = self
                        .eat(TokenKind::Identifier)
                        .map_or("", |token| self.text(&token));
                    if !self.grammar.has_field(field) {
                        return Err(self.error(offset, format!("unknown field `{field}`")));
                    }
                    node.negated_fields.push(field.to_owned());
                }
                Some(_) if self.at_predicate() => {
                    let predicate = self.parse_predicate()?;
                    scope.predicates.push(predicate);
                }
                Some(_) => node.children.push(self.parse_element(scope)?),
            }
        }
    }

    fn parse_missing_kind(&mut self) -> Result<Option<String>, SyntaxError> {
        let offset = self.offset();
        let (kind, named) = match self.peek_kind() {
            Some(TokenKind::String) => match self.bump() {
                Some(token) => (unquote(self.text(&token)), false),
                None => return Ok(None),
            },
            Some(TokenKind::Identifier) => match self.bump() {
                Some(token) => (self.text(&token).to_owned(), true),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };
        if !self.grammar.has_node_kind(&kind, named) {
            return Err(self.error(offset, format!("unknown node kind `{kind}`")));
        }
        Ok(Some(kind))
    }

    fn parse_alternation(
        &mut self,
        open: usize,
        scope: &mut PatternScope,
    ) -> Result<Vec<Element>, SyntaxError> {
        let mut branches = Vec::new();
        loop {
            match self.peek_kind() {
                Some(TokenKind::BracketClose) => {
                    self.bump();
                    break;
                }
                None => return Err(self.error(open, "unclosed `[`")),
                Some(_) => branches.push(self.parse_element(scope)?),
            }
        }
        if branches.is_empty() {
            return Err(self.error(open, "empty alternation"));
        }
        Ok(branches)
    }

    /// Parses `(#name arguments)`; the caller has checked `at_predicate`.
    fn parse_predicate(&mut self) -> Result<RawPredicate, SyntaxError> {
        let open = self.offset();
        self.bump();
        let name_offset = self.offset();
        let name = self
            .bump()
            .map_or("", |token| self.text(&token))
            .get(1..)
            .unwrap_or_default();
        let negated = match name {
            "eq?" => false,
            "not-eq?" => true,
            other => {
                return Err(self.error(name_offset, format!("unknown predicate `#{other}`")));
            }
        };

        let mut arguments = Vec::new();
        loop {
            let Some(token) = self.bump() else {
                return Err(self.error(open, "unclosed predicate"));
            };
            match token.kind {
                TokenKind::ParenClose => break,
                TokenKind::Capture => {
                    let capture = self.text(&token).get(1..).unwrap_or_default();
                    if capture.is_empty() {
                        return Err(
                            self.error(token.span.start, "expected a capture name after `@`")
                        );
                    }
                    arguments.push(RawOperand::Capture(CaptureRef {
                        name: capture.to_owned(),
                        offset: token.span.start,
                    }));
                }
                TokenKind::String => arguments.push(RawOperand::Text(unquote(self.text(&token)))),
                _ => return Err(self.unexpected(&token, " in predicate")),
            }
        }

        let mut arguments = arguments.into_iter();
        match (arguments.next(), arguments.next(), arguments.next()) {
            (Some(RawOperand::Capture(capture)), Some(operand), None) => Ok(RawPredicate {
                negated,
                capture,
                operand,
            }),
            _ => Err(self.error(
                open,
                format!("`#{name}` takes a capture followed by a capture or string"),
            )),
        }
    }
}

const fn leaf(kind: KindMatcher) -> NodePattern {
    NodePattern {
        kind,
        children: Vec::new(),
        negated_fields: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::SupportedLanguage;
    use rstest::rstest;

    fn math(source: &str) -> Result<Vec<Pattern>, SyntaxError> {
        compile(SupportedLanguage::Math.grammar(), source)
    }

    fn offset_of(err: &SyntaxError) -> Option<usize> {
        match err {
            SyntaxError::QueryCompilation { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    #[test]
    fn captures_are_numbered_in_declaration_order() {
        let patterns = math("(sum left: (number) @n right: (_) @r) @s").expect("valid query");
        let [pattern] = patterns.as_slice() else {
            panic!("expected one pattern, got {}", patterns.len());
        };
        assert_eq!(pattern.capture_names, ["n", "r", "s"]);
        assert_eq!(pattern.root.captures, [2]);
    }

    #[test]
    fn comments_and_multiple_patterns() {
        let patterns = math("; sums\n(sum)\n; products\n(product) @p\n").expect("valid query");
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns.get(1).map(|p| p.start), Some(24));
    }

    #[test]
    fn grouped_predicates_attach_to_the_pattern() {
        let patterns =
            math(r#"((variable) @v (#not-eq? @v "y"))"#).expect("valid query");
        let predicates = patterns.first().map(|p| p.predicates.clone());
        assert_eq!(
            predicates,
            Some(vec![Predicate {
                negated: true,
                capture: 0,
                operand: Operand::Text("y".to_owned()),
            }])
        );
    }

    #[test]
    fn alternation_and_optional_children() {
        let patterns = math(r#"(sum left: [(number) (variable)] @l "+" (product)? @p)"#)
            .expect("valid query");
        let Some(Step::Node(node)) = patterns.first().map(|p| p.root.step.clone()) else {
            panic!("expected a node pattern");
        };
        assert_eq!(node.children.len(), 3);
        assert!(node.children.get(2).is_some_and(|child| child.optional));
        assert!(matches!(
            node.children.first().map(|child| &child.step),
            Some(Step::Alternation(branches)) if branches.len() == 2
        ));
    }

    #[rstest]
    #[case("(summ)", 1)]
    #[case("(sum lft: (number))", 5)]
    #[case("(sum !middle)", 6)]
    #[case(r#"(sum "%")"#, 5)]
    #[case("(sum", 0)]
    #[case("(sum (number)*)", 13)]
    #[case("(sum) @", 6)]
    #[case(r#"((sum) @s (#match? @s "1"))"#, 11)]
    #[case(r#"((sum) @s (#eq? @t "1"))"#, 16)]
    #[case("sum", 0)]
    #[case("; nothing here\n", 0)]
    #[case(r#"(sum "+)"#, 5)]
    #[case("(sum) $$", 6)]
    fn reports_compilation_errors_at_offset(#[case] source: &str, #[case] offset: usize) {
        let err = math(source).expect_err("invalid query");
        assert_eq!(offset_of(&err), Some(offset), "{err}");
    }

    #[rstest]
    #[case(r#"(sum "+)"#, "unterminated string")]
    #[case("(sum) %$", "unexpected `%$`")]
    #[case(r#"((sum) @s (#eq? @s %))"#, "unexpected `%` in predicate")]
    fn malformed_tokens_are_reported_once(#[case] source: &str, #[case] message: &str) {
        let err = math(source).expect_err("invalid query");
        assert!(
            matches!(&err, SyntaxError::QueryCompilation { message: actual, .. } if actual == message),
            "{err}"
        );
    }

    #[test]
    fn escapes_in_strings_are_resolved() {
        let patterns = math(r#"((number) @n (#eq? @n "a\"b\tc"))"#).expect("valid query");
        let operand = patterns
            .first()
            .and_then(|pattern| pattern.predicates.first())
            .map(|predicate| predicate.operand.clone());
        assert_eq!(operand, Some(Operand::Text("a\"b\tc".to_owned())));
    }

    #[test]
    fn duplicate_capture_names_are_rejected() {
        let err = math("(sum (number) @x (product) @x)").expect_err("duplicate capture");
        assert_eq!(err, SyntaxError::duplicate_capture("x"));
    }

    #[test]
    fn the_same_name_may_appear_in_different_patterns() {
        let patterns = math("(sum) @x (product) @x").expect("valid query");
        assert_eq!(patterns.len(), 2);
    }
}
