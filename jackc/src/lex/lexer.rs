//! Lexical analysis
use log::warn;
use smol_str::SmolStr;

use super::{
    cursor::Cursor,
    tokens::{Keyword, Literal, Punct, Span, Token, TokenKind},
};

/// Scanner that turns Jack source text into tokens.
///
/// Whitespace and comments are stripped. Characters that can't start
/// any token are skipped with a warning, so scanning never fails.
pub struct Lexer<'a> {
    /// Character scanner
    cursor: Cursor<'a>,
    /// Keep reference to the source so token lexemes
    /// can be sliced from it.
    original: &'a str,
    /// Start absolute byte position of the current token
    /// in the source.
    start_pos: usize,
    start_line: u32,
    start_column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        let mut cursor = Cursor::new(source_code);

        // Initial state of the cursor is a non-existant EOF char,
        // but the lexer expects the current character to be the
        // start of the remaining source.
        //
        // Prime the cursor for the first iteration.
        cursor.next();

        Self {
            start_pos: cursor.offset(),
            start_line: cursor.line(),
            start_column: cursor.column(),
            cursor,
            original: source_code,
        }
    }

    /// Scan the whole source into a token sequence.
    ///
    /// The sequence has no end-of-file sentinel.
    pub fn tokenize(self) -> Vec<Token> {
        self.collect()
    }

    /// Scan the source characters and construct the next token.
    ///
    /// Returns `None` at the end of the source.
    ///
    /// Each iteration starts with the cursor pointing at the start
    /// of the remaining source, and leaves it at the character
    /// following the token it built.
    pub fn next_token(&mut self) -> Option<Token> {
        loop {
            if self.cursor.at_end() {
                return None;
            }

            match self.cursor.current() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.cursor.next();
                    continue;
                }
                '/' if self.cursor.peek() == '/' => {
                    self.erase_line_comment();
                    continue;
                }
                '/' if self.cursor.peek() == '*' => {
                    self.erase_block_comment();
                    continue;
                }
                _ => {}
            }

            self.start_token();

            let token = match self.cursor.current() {
                '"' => self.consume_string(),
                c if is_digit(c) => self.consume_number(),
                c if is_letter(c) => self.consume_ident(),
                c => match Punct::parse(c) {
                    Some(punct) => self.make_token(TokenKind::Symbol(punct), None),
                    None => {
                        warn!(
                            "skipping unrecognized character {:?} at {}:{}",
                            c, self.start_line, self.start_column
                        );
                        self.cursor.next();
                        continue;
                    }
                },
            };

            return Some(token);
        }
    }

    /// Primes the lexer to consume the next token.
    fn start_token(&mut self) {
        self.start_pos = self.cursor.offset();
        self.start_line = self.cursor.line();
        self.start_column = self.cursor.column();
    }

    /// Span from the position stored by [`Lexer::start_token`] up to
    /// and including the current character.
    fn make_span(&self) -> Span {
        let start = self.start_pos;
        let end = self.cursor.peek_offset();
        debug_assert!(end >= start);

        Span {
            index: start as u32,
            size: (end - start) as u32,
        }
    }

    fn fragment(&self) -> &'a str {
        self.make_span().fragment(self.original)
    }

    /// Build a token ending at the current character, then
    /// move the cursor to the start of the next token.
    fn make_token(&mut self, kind: TokenKind, literal: Option<Literal>) -> Token {
        let span = self.make_span();
        let token = Token {
            kind,
            lexeme: SmolStr::from(span.fragment(self.original)),
            span,
            literal,
            line: self.start_line,
            start_column: self.start_column,
            end_column: self.cursor.column(),
        };

        self.cursor.next();
        debug_assert_eq!(self.cursor.offset(), token.span.end() as usize);

        token
    }
}

/// Specialised tokens.
impl<'a> Lexer<'a> {
    /// Erase comment line up to, but not including, the trailing newline.
    fn erase_line_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');

        while !self.cursor.at_end() && self.cursor.current() != '\n' {
            self.cursor.next();
        }
    }

    /// Erase a `/* ... */` or `/** ... */` comment, including the terminator.
    fn erase_block_comment(&mut self) {
        debug_assert_eq!(self.cursor.current(), '/');
        let (line, column) = (self.cursor.line(), self.cursor.column());

        // Opening `/*`
        self.cursor.next();
        self.cursor.next();

        loop {
            if self.cursor.at_end() {
                warn!("unterminated block comment starting at {line}:{column}");
                return;
            }

            if self.cursor.current() == '*' && self.cursor.peek() == '/' {
                self.cursor.next();
                self.cursor.next();
                return;
            }

            self.cursor.next();
        }
    }

    /// Make an identifier or keyword token.
    fn consume_ident(&mut self) -> Token {
        debug_assert!(is_letter(self.cursor.current()));

        while is_letter_or_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        let token_kind = match Keyword::parse(self.fragment()) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Ident,
        };

        self.make_token(token_kind, None)
    }

    /// Make an integer literal token.
    ///
    /// Digit runs too large for a 16-bit word have no decoded value.
    fn consume_number(&mut self) -> Token {
        debug_assert!(is_digit(self.cursor.current()));

        while is_digit(self.cursor.peek()) {
            self.cursor.next();
        }

        let value = self.fragment().parse::<u16>().ok().map(Literal::Int);
        self.make_token(TokenKind::Integer, value)
    }

    /// Make a string literal token.
    ///
    /// The literal ends at the closing quote. A newline or the
    /// end of the source terminates an unclosed literal early.
    fn consume_string(&mut self) -> Token {
        debug_assert_eq!(self.cursor.current(), '"');

        while !matches!(self.cursor.peek_char(), Some('"' | '\n') | None) {
            self.cursor.next();
        }

        let closed = self.cursor.peek_char() == Some('"');
        if closed {
            self.cursor.next();
        } else {
            warn!(
                "unterminated string literal at {}:{}",
                self.start_line, self.start_column
            );
        }

        // Strip the surrounding quotes.
        let fragment = self.fragment();
        let end = if closed { fragment.len() - 1 } else { fragment.len() };
        let value = SmolStr::from(&fragment[1..end]);

        self.make_token(TokenKind::String, Some(Literal::Str(value)))
    }
}

#[allow(clippy::manual_is_ascii_check)] // consistency with other functions
fn is_digit(c: char) -> bool {
    matches!(c, '0'..='9')
}

fn is_letter(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '_')
}

fn is_letter_or_digit(c: char) -> bool {
    is_letter(c) || is_digit(c)
}

/// Implement `Lexer` as an iterator for consuming
/// tokens lazily.
impl<'a> Iterator for Lexer<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|token| token.kind).collect()
    }

    fn lexemes(source: &str) -> Vec<String> {
        Lexer::new(source).map(|token| token.lexeme.to_string()).collect()
    }

    #[test]
    fn test_empty_source() {
        assert!(Lexer::new("").tokenize().is_empty());
        assert!(Lexer::new("  \t\r\n\n ").tokenize().is_empty());
    }

    #[test]
    #[rustfmt::skip]
    fn test_statement_tokens() {
        use TokenKind as TK;

        assert_eq!(
            kinds("let x[i] = -1;"),
            vec![
                TK::Keyword(Keyword::Let),
                TK::Ident,
                TK::Symbol(Punct::LeftBracket),
                TK::Ident,
                TK::Symbol(Punct::RightBracket),
                TK::Symbol(Punct::Eq),
                TK::Symbol(Punct::Minus),
                TK::Integer,
                TK::Symbol(Punct::Semicolon),
            ]
        );
        assert_eq!(lexemes("let x[i] = -1;"), ["let", "x", "[", "i", "]", "=", "-", "1", ";"]);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("class classy _this this9 this"),
            vec![
                TokenKind::Keyword(Keyword::Class),
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Keyword(Keyword::This),
            ]
        );
    }

    #[test]
    fn test_comments_are_stripped() {
        let source = "
            /** Documentation
             *  comment. */
            class Foo { // trailing comment
                /* block */ field int x; /**/
            }
        ";
        assert_eq!(
            lexemes(source),
            ["class", "Foo", "{", "field", "int", "x", ";", "}"]
        );
    }

    #[test]
    fn test_division_is_not_a_comment() {
        assert_eq!(lexemes("a/b / c"), ["a", "/", "b", "/", "c"]);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert_eq!(lexemes("x /* never closed"), ["x"]);
    }

    #[test]
    fn test_integer_literal() {
        let tokens = Lexer::new("0 32767 65536").tokenize();
        assert_eq!(tokens[0].literal, Some(Literal::Int(0)));
        assert_eq!(tokens[1].literal, Some(Literal::Int(32767)));
        assert_eq!(tokens[2].literal, None);
        assert_eq!(tokens[2].lexeme, "65536");
    }

    #[test]
    fn test_string_literal() {
        let tokens = Lexer::new(r#"do Output.printString("Hello, world // not a comment");"#).tokenize();
        let string = &tokens[5];
        assert_eq!(string.kind, TokenKind::String);
        assert_eq!(string.lexeme, r#""Hello, world // not a comment""#);
        assert_eq!(
            string.literal,
            Some(Literal::Str("Hello, world // not a comment".into()))
        );
        assert_eq!(tokens[6].kind, TokenKind::Symbol(Punct::RightParen));
    }

    #[test]
    fn test_empty_and_unterminated_string() {
        let tokens = Lexer::new("\"\" \"open\nx").tokenize();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].literal, Some(Literal::Str("".into())));
        assert_eq!(tokens[1].literal, Some(Literal::Str("open".into())));
        assert_eq!(tokens[2].lexeme, "x");
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_unknown_characters_are_skipped() {
        assert_eq!(lexemes("a # b @ $c"), ["a", "b", "c"]);
    }

    #[test]
    fn test_nul_is_not_end_of_source() {
        assert_eq!(lexemes("a // b \0 c\nd"), ["a", "d"]);
        assert_eq!(lexemes("a \0 b"), ["a", "b"]);

        let tokens = Lexer::new("\"x\0y\" z").tokenize();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].literal, Some(Literal::Str("x\0y".into())));
        assert_eq!(tokens[1].lexeme, "z");
    }

    #[test]
    fn test_token_positions() {
        let tokens = Lexer::new("class Main {\n  function void main() {}\n}").tokenize();

        let main = &tokens[1];
        assert_eq!((main.line, main.start_column, main.end_column), (1, 7, 10));

        let function = &tokens[3];
        assert_eq!(function.lexeme, "function");
        assert_eq!((function.line, function.start_column, function.end_column), (2, 3, 10));

        let close = tokens.last().unwrap();
        assert_eq!(close.lexeme, "}");
        assert_eq!((close.line, close.start_column), (3, 1));
    }
}
