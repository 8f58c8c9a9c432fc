//! Tokenizer for query source text.
//!
//! Consecutive characters that start no token are coalesced into a single
//! [`TokenKind::Garbage`] token, so the parser reports malformed input once
//! at its first offset.

use std::ops::Range;

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token(":")]
    Colon,

    #[token("!")]
    Bang,

    #[token("?")]
    Question,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    /// `@name`; the name may be empty, which the parser rejects.
    #[regex(r"@[A-Za-z0-9_.\-]*")]
    Capture,

    /// `#name?` or `#name!`.
    #[regex(r"#[A-Za-z0-9_?!\-]*")]
    Predicate,

    /// Node kinds, field names and the `_` wildcard.
    #[regex(r"[A-Za-z0-9_]+")]
    Identifier,

    #[regex(r#""(?:[^"\\]|\\.)*""#)]
    String,

    #[regex(r"[ \t\r\n\f]+")]
    Whitespace,

    #[regex(r";[^\n]*", allow_greedy = true)]
    Comment,

    /// Coalesced unrecognized characters, including an unterminated `"`.
    Garbage,
}

impl TokenKind {
    pub(crate) const fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment)
    }
}

/// A token kind with its byte span in the query source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) span: Range<usize>,
}

/// Tokenizes `source`, trivia included.
pub(crate) fn lex(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    let mut garbage: Option<Range<usize>> = None;

    loop {
        match lexer.next() {
            Some(Ok(kind)) => {
                if let Some(span) = garbage.take() {
                    tokens.push(Token {
                        kind: TokenKind::Garbage,
                        span,
                    });
                }
                tokens.push(Token {
                    kind,
                    span: lexer.span(),
                });
            }
            Some(Err(())) => {
                let span = lexer.span();
                garbage = Some(garbage.map_or(span.clone(), |pending| pending.start..span.end));
            }
            None => {
                if let Some(span) = garbage.take() {
                    tokens.push(Token {
                        kind: TokenKind::Garbage,
                        span,
                    });
                }
                break;
            }
        }
    }

    tokens
}
