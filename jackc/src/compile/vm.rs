//! VM instructions and the text writer.
use std::{fmt, io};

use log::trace;

/// Addressable memory segments of the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Constant => write!(f, "constant"),
            Self::Argument => write!(f, "argument"),
            Self::Local    => write!(f, "local"),
            Self::Static   => write!(f, "static"),
            Self::This     => write!(f, "this"),
            Self::That     => write!(f, "that"),
            Self::Pointer  => write!(f, "pointer"),
            Self::Temp     => write!(f, "temp"),
        }
    }
}

/// Native arithmetic and logic commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Command {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Sub => write!(f, "sub"),
            Self::Neg => write!(f, "neg"),
            Self::Eq  => write!(f, "eq"),
            Self::Gt  => write!(f, "gt"),
            Self::Lt  => write!(f, "lt"),
            Self::And => write!(f, "and"),
            Self::Or  => write!(f, "or"),
            Self::Not => write!(f, "not"),
        }
    }
}

/// One stack machine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction<'a> {
    Push(Segment, u16),
    Pop(Segment, u16),
    Arithmetic(Command),
    Label(&'a str),
    Goto(&'a str),
    IfGoto(&'a str),
    /// Callee name and number of arguments pushed by the caller.
    Call(&'a str, u16),
    /// Function name and number of local variables.
    Function(&'a str, u16),
    Return,
}

/// Outputs instruction as VM text.
impl<'a> fmt::Display for Instruction<'a> {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Push(segment, index)  => write!(f, "push {segment} {index}"),
            Self::Pop(segment, index)   => write!(f, "pop {segment} {index}"),
            Self::Arithmetic(command)   => write!(f, "{command}"),
            Self::Label(name)           => write!(f, "label {name}"),
            Self::Goto(name)            => write!(f, "goto {name}"),
            Self::IfGoto(name)          => write!(f, "if-goto {name}"),
            Self::Call(name, n_args)    => write!(f, "call {name} {n_args}"),
            Self::Function(name, n_locals) => write!(f, "function {name} {n_locals}"),
            Self::Return                => write!(f, "return"),
        }
    }
}

/// Renders instructions into an output sink, one per line.
///
/// The writer holds no state besides the sink and a counter. The sink's
/// lifecycle (creating, truncating, closing a file) belongs to the caller.
pub struct VmWriter<W: io::Write> {
    out: W,
    count: usize,
}

impl<W: io::Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, count: 0 }
    }

    pub fn emit(&mut self, instruction: Instruction) -> io::Result<()> {
        trace!("{instruction}");
        writeln!(self.out, "{instruction}")?;
        self.count += 1;
        Ok(())
    }

    #[inline]
    pub fn write_push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        self.emit(Instruction::Push(segment, index))
    }

    #[inline]
    pub fn write_pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        self.emit(Instruction::Pop(segment, index))
    }

    #[inline]
    pub fn write_arithmetic(&mut self, command: Command) -> io::Result<()> {
        self.emit(Instruction::Arithmetic(command))
    }

    #[inline]
    pub fn write_label(&mut self, name: &str) -> io::Result<()> {
        self.emit(Instruction::Label(name))
    }

    #[inline]
    pub fn write_goto(&mut self, name: &str) -> io::Result<()> {
        self.emit(Instruction::Goto(name))
    }

    #[inline]
    pub fn write_if(&mut self, name: &str) -> io::Result<()> {
        self.emit(Instruction::IfGoto(name))
    }

    #[inline]
    pub fn write_call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        self.emit(Instruction::Call(name, n_args))
    }

    #[inline]
    pub fn write_function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        self.emit(Instruction::Function(name, n_locals))
    }

    #[inline]
    pub fn write_return(&mut self) -> io::Result<()> {
        self.emit(Instruction::Return)
    }

    /// Number of instructions written so far.
    pub fn instruction_count(&self) -> usize {
        self.count
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instruction_text() {
        let mut writer = VmWriter::new(Vec::new());
        writer.write_function("Main.main", 2).unwrap();
        writer.write_push(Segment::Constant, 7).unwrap();
        writer.write_pop(Segment::Local, 1).unwrap();
        writer.write_push(Segment::That, 0).unwrap();
        writer.write_arithmetic(Command::Not).unwrap();
        writer.write_label("main$WHILE_EXP_0").unwrap();
        writer.write_if("main$WHILE_END_0").unwrap();
        writer.write_goto("main$WHILE_EXP_0").unwrap();
        writer.write_call("Math.multiply", 2).unwrap();
        writer.write_return().unwrap();

        assert_eq!(writer.instruction_count(), 10);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(
            text,
            "function Main.main 2\n\
             push constant 7\n\
             pop local 1\n\
             push that 0\n\
             not\n\
             label main$WHILE_EXP_0\n\
             if-goto main$WHILE_END_0\n\
             goto main$WHILE_EXP_0\n\
             call Math.multiply 2\n\
             return\n"
        );
    }

    #[test]
    fn test_segment_names() {
        let names = [
            Segment::Constant,
            Segment::Argument,
            Segment::Local,
            Segment::Static,
            Segment::This,
            Segment::That,
            Segment::Pointer,
            Segment::Temp,
        ]
        .map(|segment| segment.to_string());

        assert_eq!(
            names,
            ["constant", "argument", "local", "static", "this", "that", "pointer", "temp"]
        );
    }
}
