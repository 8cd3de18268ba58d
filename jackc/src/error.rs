//! Result and errors.
use std::{
    fmt::{self, Display, Formatter},
    io,
    string::FromUtf8Error,
};

use smol_str::SmolStr;

use crate::compile::SymbolError;

pub type JackResult<T> = std::result::Result<T, JackError>;

#[derive(Debug)]
pub enum JackError {
    /// Parser encountered a token it did not expect.
    Syntax(SyntaxError),
    /// Declaration clashes with a name already in the same scope.
    Symbol { err: SymbolError, line: u32 },
    /// Identifier used as a variable is declared in neither scope.
    Undefined { name: SmolStr, line: u32 },
    /// Integer literal, string length or character code does not
    /// fit in a VM constant.
    IntegerRange { lexeme: SmolStr, line: u32 },
    /// Call passes more arguments than a VM `call` can carry.
    TooManyArguments { name: SmolStr, line: u32 },
    /// Blocks and expression terms nested deeper than the configured limit.
    NestingTooDeep { line: u32, limit: usize },
    Io(io::Error),
    Utf8(FromUtf8Error),
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(err) => Display::fmt(err, f),
            Self::Symbol { err, line } => write!(f, "[line {line}] {err}"),
            Self::Undefined { name, line } => {
                write!(f, "[line {line}] error at '{name}': undefined variable")
            }
            Self::IntegerRange { lexeme, line } => write!(
                f,
                "[line {line}] error at '{lexeme}': constant out of range 0..={}",
                crate::constants::MAX_CONSTANT
            ),
            Self::TooManyArguments { name, line } => {
                write!(f, "[line {line}] error at '{name}': too many arguments")
            }
            Self::NestingTooDeep { line, limit } => {
                write!(f, "[line {line}] nesting exceeds limit of {limit}")
            }
            Self::Io(err) => write!(f, "{err}"),
            Self::Utf8(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for JackError {}

impl From<SyntaxError> for JackError {
    fn from(err: SyntaxError) -> Self {
        JackError::Syntax(err)
    }
}

impl From<io::Error> for JackError {
    fn from(err: io::Error) -> Self {
        JackError::Io(err)
    }
}

impl From<FromUtf8Error> for JackError {
    fn from(err: FromUtf8Error) -> Self {
        JackError::Utf8(err)
    }
}

/// Error returned when an unexpected token is encountered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub line: u32,
    pub column: u32,
    /// Lexeme of the offending token, `None` at end-of-file.
    pub found: Option<SmolStr>,
    /// Description of what the parser was looking for.
    pub expected: String,
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.found {
            Some(lexeme) => write!(
                f,
                "[line {}] error at '{}': expected {}",
                self.line, lexeme, self.expected
            ),
            None => write!(
                f,
                "[line {}] error at end of file: expected {}",
                self.line, self.expected
            ),
        }
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_syntax_error_diagnostic() {
        let err = SyntaxError {
            line: 7,
            column: 12,
            found: Some("}".into()),
            expected: "';'".to_owned(),
        };
        assert_eq!(err.to_string(), "[line 7] error at '}': expected ';'");

        let err = SyntaxError {
            line: 3,
            column: 1,
            found: None,
            expected: "'}'".to_owned(),
        };
        assert_eq!(err.to_string(), "[line 3] error at end of file: expected '}'");
    }
}
