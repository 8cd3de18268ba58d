//! Scanner
mod cursor;
mod lexer;
mod token_stream;
mod tokens;
mod xml;

pub use self::{
    lexer::Lexer,
    token_stream::TokenStream,
    tokens::{Keyword, Literal, Punct, Span, Token, TokenKind},
    xml::tokens_to_xml,
};
