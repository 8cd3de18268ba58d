//! Single pass compiler from Jack classes to VM code.
mod engine;
mod symbol;
mod vm;

use std::io;

use log::debug;
use smol_str::SmolStr;

use crate::{constants::DEFAULT_MAX_DEPTH, error::JackResult, lex::TokenStream};

pub use self::{
    engine::{CompilationEngine, SubroutineKind},
    symbol::{Kind, Symbol, SymbolError, SymbolTable},
    vm::{Command, Instruction, Segment, VmWriter},
};

/// Compiler configuration parameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default))]
pub struct CompileConf {
    /// Limit on how deeply statement blocks and expression terms may nest.
    pub max_depth: usize,
}

impl Default for CompileConf {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Summary of a successfully compiled unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileStats {
    pub class_name: SmolStr,
    /// Number of subroutine declarations in the class.
    pub subroutines: usize,
    /// Number of VM instructions written.
    pub instructions: usize,
}

/// Compile the source text of one class, writing VM text into the sink.
///
/// Instructions are written as they are generated, so on error the
/// sink holds the output produced up to the failure point.
pub fn compile<W: io::Write>(source: &str, sink: W, conf: &CompileConf) -> JackResult<CompileStats> {
    let tokens = TokenStream::from_source(source);
    let engine = CompilationEngine::new(tokens, VmWriter::new(sink), conf);
    let stats = engine.compile_class()?;

    debug!(
        "compiled class {}: {} subroutines, {} instructions",
        stats.class_name, stats.subroutines, stats.instructions
    );

    Ok(stats)
}

/// Compile the source text of one class into a VM text string,
/// using the default configuration.
pub fn compile_str(source: &str) -> JackResult<String> {
    let mut buf = Vec::new();
    compile(source, &mut buf, &CompileConf::default())?;
    Ok(String::from_utf8(buf)?)
}
