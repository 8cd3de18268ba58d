//! Token cursor with bounded look ahead.
use crate::error::SyntaxError;

use super::{Lexer, Token, TokenKind};

/// Fully scanned token sequence of one compilation unit,
/// with a forward-only read cursor.
///
/// Tokens already consumed are never revisited. Look ahead
/// is a plain index into the remaining tokens.
pub struct TokenStream {
    tokens: Vec<Token>,
    /// Index of the next token to be consumed.
    cursor: usize,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    /// Scan the given source into a stream.
    pub fn from_source(source_code: &str) -> Self {
        Self::new(Lexer::new(source_code).tokenize())
    }

    /// Indicates whether every token has been consumed.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Most recently consumed token.
    pub fn previous_token(&self) -> Option<&Token> {
        self.cursor.checked_sub(1).and_then(|index| self.tokens.get(index))
    }

    /// Return the current token without advancing the cursor.
    ///
    /// Returns `None` at the end of the stream.
    #[inline]
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Return the current token kind without advancing the cursor.
    #[inline]
    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Tests whether the current token is of the given kind.
    #[inline]
    pub fn check(&self, token_kind: TokenKind) -> bool {
        self.peek_kind() == Some(token_kind)
    }

    /// Consumes the current token regardless of kind.
    ///
    /// Returns `None` when the cursor is at the end of the token stream.
    pub fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    /// Consumes the current token if it matches the given token kind.
    ///
    /// Returns true when matched. Returns false when token kinds
    /// do not match, or the token stream is at the end.
    pub fn match_token(&mut self, token_kind: TokenKind) -> bool {
        let is_match = self.check(token_kind);
        if is_match {
            self.cursor += 1;
        }
        is_match
    }

    /// Return the current token and advance the cursor.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] if the token kind doesn't match, or
    /// the stream is at the end. The cursor is not advanced on error.
    pub fn consume(&mut self, token_kind: TokenKind) -> Result<Token, SyntaxError> {
        if self.check(token_kind) {
            self.next_token().ok_or_else(|| self.unexpected(token_kind))
        } else {
            Err(self.unexpected(token_kind))
        }
    }

    /// Consume the current token if it matches any of the given kinds.
    pub fn consume_any(&mut self, token_kinds: &[TokenKind]) -> Result<Token, SyntaxError> {
        match self.peek_kind() {
            Some(kind) if token_kinds.contains(&kind) => {
                self.next_token().ok_or_else(|| self.unexpected(kind))
            }
            _ => {
                let names = token_kinds
                    .iter()
                    .map(|kind| kind.to_string())
                    .collect::<Vec<_>>();
                Err(self.unexpected(format!("one of {}", names.join(", "))))
            }
        }
    }

    /// Build an error pointing at the current token.
    ///
    /// At the end of the stream the error refers to the
    /// position of the last token.
    #[cold]
    pub fn unexpected(&self, expected: impl ToString) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError {
                line: token.line,
                column: token.start_column,
                found: Some(token.lexeme.clone()),
                expected: expected.to_string(),
            },
            None => {
                let (line, column) = self
                    .tokens
                    .last()
                    .map(|token| (token.line, token.end_column))
                    .unwrap_or((1, 1));
                SyntaxError {
                    line,
                    column,
                    found: None,
                    expected: expected.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lex::{Keyword, Punct};

    #[test]
    fn test_consume_and_lookahead() {
        let mut stream = TokenStream::from_source("foo.bar();");

        assert_eq!(stream.peek_kind(), Some(TokenKind::Ident));
        assert!(stream.previous_token().is_none());

        let foo = stream.consume(TokenKind::Ident).unwrap();
        assert_eq!(foo.lexeme, "foo");
        assert_eq!(stream.previous_token().map(|t| t.lexeme.as_str()), Some("foo"));

        assert!(!stream.match_token(TokenKind::Ident));
        assert!(stream.match_token(TokenKind::Symbol(Punct::Dot)));
        assert_eq!(stream.peek().map(|t| t.lexeme.as_str()), Some("bar"));
    }

    #[test]
    fn test_mismatch_does_not_advance() {
        let mut stream = TokenStream::from_source("let x");

        let err = stream.consume(TokenKind::Keyword(Keyword::Do)).unwrap_err();
        assert_eq!(err.found.as_deref(), Some("let"));
        assert_eq!(err.expected, "'do'");
        assert!(stream.check(TokenKind::Keyword(Keyword::Let)));

        let token = stream
            .consume_any(&[TokenKind::Keyword(Keyword::Do), TokenKind::Keyword(Keyword::Let)])
            .unwrap();
        assert_eq!(token.kind, TokenKind::Keyword(Keyword::Let));
    }

    #[test]
    fn test_error_at_end_of_stream() {
        let mut stream = TokenStream::from_source("class\n  Foo");
        stream.next_token();
        stream.next_token();
        assert!(stream.at_end());

        let err = stream.consume(TokenKind::Symbol(Punct::LeftBrace)).unwrap_err();
        assert_eq!(err.found, None);
        assert_eq!(err.line, 2);
        assert_eq!(err.to_string(), "[line 2] error at end of file: expected '{'");
    }
}
