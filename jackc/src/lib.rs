//! Compiler for the Jack language, targeting the Hack stack virtual machine.
pub mod compile;
pub mod constants;
mod error;
pub mod lex;

pub use self::compile::{compile, compile_str, CompileConf, CompileStats};

pub mod prelude {
    pub use super::{
        compile::{
            compile, compile_str, CompilationEngine, CompileConf, CompileStats, Kind, Segment,
            SymbolError, SymbolTable, VmWriter,
        },
        error::{JackError, JackResult, SyntaxError},
        lex::{tokens_to_xml, Lexer, Token, TokenKind, TokenStream},
    };
}
