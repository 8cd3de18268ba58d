//! Analyzer output: token sequence as XML.
use std::fmt::Write;

use super::{Literal, Token, TokenKind};

/// Render tokens as the analyzer's `<tokens>` XML document.
///
/// Each token becomes one line tagged with its category. Integer and
/// string constants show their decoded value, without quotes.
pub fn tokens_to_xml(tokens: &[Token]) -> String {
    let mut xml = String::from("<tokens>\n");

    for token in tokens {
        let tag = token.kind.category();
        let text = match (&token.kind, &token.literal) {
            (TokenKind::Integer, Some(Literal::Int(value))) => value.to_string(),
            (TokenKind::String, Some(Literal::Str(value))) => escape(value),
            _ => escape(&token.lexeme),
        };
        // Writing into a String can't fail.
        let _ = writeln!(xml, "<{tag}>{text}</{tag}>");
    }

    xml.push_str("</tokens>\n");
    xml
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '&' => escaped.push_str("&amp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lex::Lexer;

    #[test]
    fn test_tokens_to_xml() {
        let tokens = Lexer::new("if (x < 10) { do Output.printString(\"a&b\"); }").tokenize();
        let xml = tokens_to_xml(&tokens);
        let lines = xml.lines().collect::<Vec<_>>();

        assert_eq!(lines.first(), Some(&"<tokens>"));
        assert_eq!(lines.last(), Some(&"</tokens>"));
        assert_eq!(lines[1], "<keyword>if</keyword>");
        assert_eq!(lines[2], "<symbol>(</symbol>");
        assert_eq!(lines[3], "<identifier>x</identifier>");
        assert_eq!(lines[4], "<symbol>&lt;</symbol>");
        assert_eq!(lines[5], "<integerConstant>10</integerConstant>");
        assert!(lines.contains(&"<stringConstant>a&amp;b</stringConstant>"));
        assert_eq!(lines.len(), tokens.len() + 2);
    }
}
