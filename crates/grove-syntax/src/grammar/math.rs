//! Built-in grammar for arithmetic expressions.
//!
//! The grammar covers numbers, variables, the four binary operators and
//! parentheses:
//!
//! ```text
//! expression := operand (op operand)*
//! operand    := number | variable | "(" expression ")"
//! ```
//!
//! `*` and `/` bind tighter than `+` and `-`, and all operators associate to
//! the left. Parsing never fails: absent operands become zero-width `MISSING`
//! numbers, unclosed parentheses get a `MISSING ")"`, unknown characters and
//! trailing tokens are wrapped in `ERROR` nodes.
//!
//! Parentheses nest at most [`MathGrammar::MAX_NESTING`] deep. Input past
//! that depth is kept in a single `ERROR` node and the open parentheses are
//! closed with `MISSING ")"`.

use std::mem;
use std::ops::Range;

use logos::Logos;
use tracing::{debug, trace};

use super::{Grammar, PARSE_TARGET, ParseBackend};
use crate::arena::{ArenaBuilder, NodeId, NodeSpec, SyntaxArena};
use crate::document::TextEdit;
use crate::error::SyntaxError;
use crate::language::SupportedLanguage;

const NAMED_KINDS: &[&str] = &[
    "expression",
    "sum",
    "difference",
    "product",
    "quotient",
    "parenthesized_expression",
    "number",
    "variable",
    "ERROR",
];
const ANONYMOUS_KINDS: &[&str] = &["+", "-", "*", "/", "(", ")"];
const FIELDS: &[&str] = &["left", "right"];

/// The arithmetic expression grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathGrammar;

impl MathGrammar {
    /// Deepest parenthesis nesting parsed structurally.
    pub const MAX_NESTING: usize = 256;
}

impl Grammar for MathGrammar {
    fn language(&self) -> SupportedLanguage {
        SupportedLanguage::Math
    }

    fn has_node_kind(&self, kind: &str, named: bool) -> bool {
        let kinds = if named { NAMED_KINDS } else { ANONYMOUS_KINDS };
        kinds.contains(&kind)
    }

    fn has_field(&self, field: &str) -> bool {
        FIELDS.contains(&field)
    }

    fn backend(&self) -> Result<Box<dyn ParseBackend>, SyntaxError> {
        Ok(Box::new(MathBackend))
    }
}

#[derive(Debug)]
struct MathBackend;

impl ParseBackend for MathBackend {
    fn language(&self) -> SupportedLanguage {
        SupportedLanguage::Math
    }

    fn parse(
        &mut self,
        source: &str,
        edit: Option<&TextEdit>,
    ) -> Result<SyntaxArena, SyntaxError> {
        if let Some(hint) = edit {
            trace!(
                target: PARSE_TARGET,
                start = hint.start_byte,
                "math grammar reparses from scratch"
            );
        }
        let root = ExpressionParser::new(source).parse_root();
        Ok(lower(source, root))
    }
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum TokenKind {
    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Variable,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    /// Coalesced characters outside the grammar.
    Unknown,
}

impl TokenKind {
    /// Operator text, node kind and binding power of a binary operator.
    const fn operator(self) -> Option<(&'static str, &'static str, u8)> {
        match self {
            Self::Plus => Some(("+", "sum", 1)),
            Self::Minus => Some(("-", "difference", 1)),
            Self::Star => Some(("*", "product", 2)),
            Self::Slash => Some(("/", "quotient", 2)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    range: Range<usize>,
}

fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut unknown: Option<Range<usize>> = None;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(kind) => {
                if let Some(range) = unknown.take() {
                    tokens.push(Token {
                        kind: TokenKind::Unknown,
                        range,
                    });
                }
                tokens.push(Token { kind, range: span });
            }
            Err(()) => {
                unknown = Some(unknown.map_or(span.clone(), |pending| pending.start..span.end));
            }
        }
    }
    if let Some(range) = unknown {
        tokens.push(Token {
            kind: TokenKind::Unknown,
            range,
        });
    }
    tokens
}

/// Owned intermediate tree, lowered into the arena once complete.
#[derive(Debug)]
struct Syntax {
    spec: NodeSpec,
    children: Vec<Syntax>,
}

impl Syntax {
    const fn leaf(spec: NodeSpec) -> Self {
        Self {
            spec,
            children: Vec::new(),
        }
    }

    fn branch(kind: &'static str, children: Vec<Self>) -> Self {
        let start = children.first().map_or(0, |child| child.spec.byte_range.start);
        let end = children
            .iter()
            .map(|child| child.spec.byte_range.end)
            .max()
            .unwrap_or(start);
        Self {
            spec: NodeSpec::new(kind, true, start..end),
            children,
        }
    }

    const fn missing(kind: &'static str, named: bool, at: usize) -> Self {
        Self::leaf(NodeSpec::new(kind, named, at..at).with_missing(true))
    }

    const fn with_field(mut self, field: &'static str) -> Self {
        self.spec.field = Some(field);
        self
    }

    const fn end(&self) -> usize {
        self.spec.byte_range.end
    }
}

impl Drop for Syntax {
    fn drop(&mut self) {
        let mut pending = mem::take(&mut self.children);
        while let Some(mut child) = pending.pop() {
            pending.append(&mut child.children);
        }
    }
}

struct ExpressionParser {
    tokens: Vec<Token>,
    pos: usize,
    last_end: usize,
    source_len: usize,
    depth: usize,
}

impl ExpressionParser {
    fn new(source: &str) -> Self {
        Self {
            tokens: tokenize(source),
            pos: 0,
            last_end: 0,
            source_len: source.len(),
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned()?;
        self.pos = self.pos.saturating_add(1);
        self.last_end = token.range.end;
        Some(token)
    }

    fn parse_root(mut self) -> Syntax {
        let mut children = vec![self.parse_expression(1)];

        let mut leftovers = Vec::new();
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::CloseParen {
                let range = token.range.clone();
                self.bump();
                leftovers.push(Syntax::leaf(NodeSpec::new(")", false, range)));
            } else {
                leftovers.push(self.parse_expression(1));
            }
        }
        if !leftovers.is_empty() {
            let mut error = Syntax::branch("ERROR", leftovers);
            error.spec.error = true;
            children.push(error);
        }

        Syntax {
            spec: NodeSpec::new("expression", true, 0..self.source_len),
            children,
        }
    }

    fn parse_expression(&mut self, min_power: u8) -> Syntax {
        let mut left = self.parse_operand();

        while let Some((text, kind, power)) = self.peek_operator() {
            if power < min_power {
                break;
            }
            let Some(operator) = self.bump() else {
                break;
            };
            let right = self.parse_expression(power.saturating_add(1));
            left = Syntax::branch(
                kind,
                vec![
                    left.with_field("left"),
                    Syntax::leaf(NodeSpec::new(text, false, operator.range)),
                    right.with_field("right"),
                ],
            );
        }
        left
    }

    fn peek_operator(&self) -> Option<(&'static str, &'static str, u8)> {
        self.peek()?.kind.operator()
    }

    fn parse_operand(&mut self) -> Syntax {
        let Some(kind) = self.peek().map(|token| token.kind) else {
            return Syntax::missing("number", true, self.last_end);
        };
        match kind {
            TokenKind::Number | TokenKind::Variable => {
                let name = if kind == TokenKind::Number {
                    "number"
                } else {
                    "variable"
                };
                match self.bump() {
                    Some(token) => Syntax::leaf(NodeSpec::new(name, true, token.range)),
                    None => Syntax::missing(name, true, self.last_end),
                }
            }
            TokenKind::OpenParen if self.depth >= MathGrammar::MAX_NESTING => {
                self.parse_too_deep()
            }
            TokenKind::OpenParen => self.parse_parenthesized(),
            TokenKind::Unknown => self.parse_unknown(),
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::CloseParen => Syntax::missing("number", true, self.last_end),
        }
    }

    fn parse_parenthesized(&mut self) -> Syntax {
        let Some(open) = self.bump() else {
            return Syntax::missing("number", true, self.last_end);
        };
        self.depth = self.depth.saturating_add(1);
        let inner = self.parse_expression(1);
        self.depth = self.depth.saturating_sub(1);
        let close = if self.peek().is_some_and(|t| t.kind == TokenKind::CloseParen) {
            self.bump()
                .map(|token| Syntax::leaf(NodeSpec::new(")", false, token.range)))
        } else {
            None
        };
        let close = close.unwrap_or_else(|| Syntax::missing(")", false, inner.end()));
        Syntax::branch(
            "parenthesized_expression",
            vec![
                Syntax::leaf(NodeSpec::new("(", false, open.range)),
                inner,
                close,
            ],
        )
    }

    fn parse_unknown(&mut self) -> Syntax {
        let start = self.peek().map_or(self.last_end, |token| token.range.start);
        self.bump();
        Syntax::leaf(NodeSpec::new("ERROR", true, start..self.last_end).with_error(true))
    }

    /// Wraps every remaining token in one `ERROR` leaf.
    fn parse_too_deep(&mut self) -> Syntax {
        let start = self.peek().map_or(self.last_end, |token| token.range.start);
        while self.bump().is_some() {}
        debug!(
            target: PARSE_TARGET,
            depth = self.depth,
            start,
            "parenthesis nesting limit reached"
        );
        Syntax::leaf(NodeSpec::new("ERROR", true, start..self.last_end).with_error(true))
    }
}

/// Pushes the owned tree into an arena in pre-order.
fn lower(source: &str, root: Syntax) -> SyntaxArena {
    let mut builder = ArenaBuilder::new(source);
    let mut stack: Vec<(Option<NodeId>, Syntax)> = vec![(None, root)];
    while let Some((parent, mut syntax)) = stack.pop() {
        let id = builder.push(parent, syntax.spec.clone());
        let children = mem::take(&mut syntax.children);
        stack.extend(children.into_iter().rev().map(|child| (Some(id), child)));
    }
    builder.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn sexp(source: &str) -> String {
        let arena = MathBackend.parse(source, None).expect("math never fails");
        arena.root(source).to_sexp()
    }

    #[rstest]
    #[case("1", "(expression (number))")]
    #[case(
        "1 - 2 - 3",
        "(expression (difference left: (difference left: (number) right: (number)) right: (number)))"
    )]
    #[case(
        "a / (b + 1)",
        "(expression (quotient left: (variable) right: (parenthesized_expression (sum left: (variable) right: (number)))))"
    )]
    #[case("3.25 * x_1", "(expression (product left: (number) right: (variable)))")]
    fn parses_well_formed_expressions(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(sexp(source), expected);
    }

    #[rstest]
    #[case("", "(expression (MISSING number))")]
    #[case("1 +", "(expression (sum left: (number) right: (MISSING number)))")]
    #[case(
        "(1",
        "(expression (parenthesized_expression (number) (MISSING \")\")))"
    )]
    #[case("1 2", "(expression (number) (ERROR (number)))")]
    #[case("1 + $", "(expression (sum left: (number) right: (ERROR)))")]
    #[case("1 )", "(expression (number) (ERROR))")]
    fn recovers_from_malformed_input(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(sexp(source), expected);
    }

    #[test]
    fn missing_operand_is_zero_width_after_operator() {
        let source = "1 +  + 2";
        let arena = MathBackend.parse(source, None).expect("math never fails");
        let missing = arena
            .root(source)
            .descendants()
            .find(|node| node.is_missing())
            .expect("missing operand");
        assert_eq!(missing.byte_range(), 3..3);
    }

    fn count_kind(source: &str, kind: &str) -> usize {
        let arena = MathBackend.parse(source, None).expect("math never fails");
        arena
            .root(source)
            .descendants()
            .filter(|node| node.kind() == kind)
            .count()
    }

    #[test]
    fn unbalanced_parentheses_stop_at_the_nesting_limit() {
        let source = "(".repeat(100_000);
        let arena = MathBackend.parse(&source, None).expect("math never fails");
        let root = arena.root(&source);

        let nested = root
            .descendants()
            .filter(|node| node.kind() == "parenthesized_expression")
            .count();
        let unclosed = root
            .descendants()
            .filter(|node| node.is_missing() && node.kind() == ")")
            .count();
        let errors: Vec<_> = root
            .descendants()
            .filter(|node| node.is_error())
            .map(|node| node.byte_range())
            .collect();

        assert_eq!(nested, MathGrammar::MAX_NESTING);
        assert_eq!(unclosed, MathGrammar::MAX_NESTING);
        assert_eq!(errors, [MathGrammar::MAX_NESTING..100_000]);
        assert!(root.to_sexp().starts_with("(expression (parenthesized_expression"));
    }

    #[test]
    fn nesting_up_to_the_limit_parses_cleanly() {
        let depth = MathGrammar::MAX_NESTING;
        let source = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(count_kind(&source, "parenthesized_expression"), depth);
        assert_eq!(count_kind(&source, "ERROR"), 0);
    }

    #[test]
    fn long_operator_chains_parse_without_recursion() {
        let source = format!("{}1", "1 + ".repeat(50_000));
        assert_eq!(count_kind(&source, "sum"), 50_000);
        assert_eq!(count_kind(&source, "number"), 50_001);
        let rendered = sexp(&source);
        assert!(rendered.ends_with("right: (number)))"), "{}", rendered.len());
    }

    #[test]
    fn root_spans_the_whole_source() {
        let source = "  x\n";
        let arena = MathBackend.parse(source, None).expect("math never fails");
        assert_eq!(arena.root(source).byte_range(), 0..4);
    }

    #[rstest]
    #[case("sum", true, true)]
    #[case("+", false, true)]
    #[case("+", true, false)]
    #[case("identifier", true, false)]
    fn knows_its_node_kinds(#[case] kind: &str, #[case] named: bool, #[case] expected: bool) {
        assert_eq!(MathGrammar.has_node_kind(kind, named), expected);
    }
}
