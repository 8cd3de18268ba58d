//! Constant values of the Hack virtual machine and the Jack runtime.

/// Largest value a `push constant` instruction can carry.
///
/// The VM word is 16 bits, but constants are limited to the
/// positive half. Negative numbers are built with `neg`.
pub const MAX_CONSTANT: u16 = 0x7FFF; // 32767

/// Default limit on how deeply statement blocks and expression
/// terms may nest before compilation of a unit is aborted.
///
/// Reaching the limit must stay within a 2 MiB thread stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// File extension of Jack source files.
pub const SOURCE_EXTENSION: &str = "jack";

/// File extension of generated VM files.
pub const OUTPUT_EXTENSION: &str = "vm";

// ----------------------------------------------------------------------------
// Operating system routines called by generated code.

pub const MEMORY_ALLOC: &str = "Memory.alloc";
pub const MATH_MULTIPLY: &str = "Math.multiply";
pub const MATH_DIVIDE: &str = "Math.divide";
pub const STRING_NEW: &str = "String.new";
pub const STRING_APPEND_CHAR: &str = "String.appendChar";
