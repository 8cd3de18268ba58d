//! Recursive descent parser that emits VM code while recognizing.
use std::io;

use log::debug;
use smol_str::SmolStr;

use crate::{
    constants::*,
    error::{JackError, JackResult},
    lex::{Keyword, Literal, Punct, Token, TokenKind, TokenStream},
};

use super::{
    symbol::{Kind, SymbolTable},
    vm::{Command, Segment, VmWriter},
    CompileConf, CompileStats,
};

use Keyword as K;
use TokenKind as T;

/// Kind of subroutine being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

/// Per-subroutine compilation state.
///
/// One context is reused for every subroutine of a class,
/// and reset at the start of each declaration.
struct SubroutineContext<'c> {
    class_name: &'c str,
    name: SmolStr,
    kind: SubroutineKind,
    /// Size of an instance, in words.
    n_fields: u16,
    symbols: SymbolTable<'c>,
    if_count: u32,
    while_count: u32,
}

impl<'c> SubroutineContext<'c> {
    fn new(class_name: &'c str, class_symbols: &'c SymbolTable<'c>) -> Self {
        Self {
            class_name,
            name: SmolStr::default(),
            kind: SubroutineKind::Function,
            n_fields: class_symbols.var_count(Kind::Field),
            symbols: SymbolTable::subroutine_scope(class_symbols),
            if_count: 0,
            while_count: 0,
        }
    }

    /// Prepare for a new subroutine declaration.
    fn reset(&mut self, kind: SubroutineKind, name: SmolStr) {
        self.kind = kind;
        self.name = name;
        self.symbols.reset();
        self.if_count = 0;
        self.while_count = 0;
    }

    /// Reserve the next `if` label number.
    fn next_if(&mut self) -> u32 {
        let n = self.if_count;
        self.if_count += 1;
        n
    }

    /// Reserve the next `while` label number.
    fn next_while(&mut self) -> u32 {
        let n = self.while_count;
        self.while_count += 1;
        n
    }

    /// Branch target name, qualified by the subroutine name.
    fn label(&self, tag: &str, n: u32) -> String {
        format!("{}${}_{}", self.name, tag, n)
    }
}

/// Compiles the tokens of one class into VM instructions.
///
/// The grammar is recognized top-down with at most two tokens of
/// look ahead. Instructions are written to the sink as soon as the
/// construct producing them is recognized, and the first syntax
/// error aborts the unit.
pub struct CompilationEngine<'a, W: io::Write> {
    tokens: TokenStream,
    writer: VmWriter<W>,
    conf: &'a CompileConf,
    /// Current nesting level of expression terms.
    depth: usize,
}

impl<'a, W: io::Write> CompilationEngine<'a, W> {
    pub fn new(tokens: TokenStream, writer: VmWriter<W>, conf: &'a CompileConf) -> Self {
        Self {
            tokens,
            writer,
            conf,
            depth: 0,
        }
    }

    /// Compile the class, consuming the engine.
    ///
    /// `class := 'class' IDENTIFIER '{' classVarDec* subroutineDec* '}'`
    pub fn compile_class(mut self) -> JackResult<CompileStats> {
        self.tokens.consume(T::Keyword(K::Class))?;
        let class_name = self.tokens.consume(T::Ident)?.lexeme;
        self.tokens.consume(T::Symbol(Punct::LeftBrace))?;

        let mut class_symbols = SymbolTable::class_scope();
        while matches!(
            self.tokens.peek_kind(),
            Some(T::Keyword(K::Static | K::Field))
        ) {
            self.compile_class_var_dec(&mut class_symbols)?;
        }

        debug!(
            "class {class_name}: {} fields, {} statics",
            class_symbols.var_count(Kind::Field),
            class_symbols.var_count(Kind::Static)
        );

        let mut subroutines = 0;
        {
            let mut ctx = SubroutineContext::new(&class_name, &class_symbols);
            while matches!(
                self.tokens.peek_kind(),
                Some(T::Keyword(K::Constructor | K::Function | K::Method))
            ) {
                self.compile_subroutine(&mut ctx)?;
                subroutines += 1;
            }
        }

        self.tokens.consume(T::Symbol(Punct::RightBrace))?;

        if !self.tokens.at_end() {
            return Err(self.tokens.unexpected("end of file after class").into());
        }

        self.writer.flush()?;

        Ok(CompileStats {
            class_name,
            subroutines,
            instructions: self.writer.instruction_count(),
        })
    }
}

/// Declarations.
impl<'a, W: io::Write> CompilationEngine<'a, W> {
    /// `classVarDec := ('static'|'field') type IDENTIFIER (',' IDENTIFIER)* ';'`
    fn compile_class_var_dec(&mut self, symbols: &mut SymbolTable) -> JackResult<()> {
        let kind = match self
            .tokens
            .consume_any(&[T::Keyword(K::Static), T::Keyword(K::Field)])?
            .kind
        {
            T::Keyword(K::Static) => Kind::Static,
            _ => Kind::Field,
        };
        self.compile_var_names(symbols, kind)
    }

    /// `varDec := 'var' type IDENTIFIER (',' IDENTIFIER)* ';'`
    fn compile_var_dec(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        self.tokens.consume(T::Keyword(K::Var))?;
        self.compile_var_names(&mut ctx.symbols, Kind::Local)
    }

    /// Shared tail of variable declarations: a type followed
    /// by a comma separated list of names.
    fn compile_var_names(&mut self, symbols: &mut SymbolTable, kind: Kind) -> JackResult<()> {
        let ty = self.compile_type()?;

        loop {
            let name = self.tokens.consume(T::Ident)?;
            define(symbols, &name, ty.clone(), kind)?;

            if !self.tokens.match_token(T::Symbol(Punct::Comma)) {
                break;
            }
        }

        self.tokens.consume(T::Symbol(Punct::Semicolon))?;
        Ok(())
    }

    /// `type := 'int'|'char'|'boolean'|IDENTIFIER`
    fn compile_type(&mut self) -> JackResult<SmolStr> {
        let token = self.tokens.consume_any(&[
            T::Keyword(K::Int),
            T::Keyword(K::Char),
            T::Keyword(K::Boolean),
            T::Ident,
        ])?;
        Ok(token.lexeme)
    }

    /// `subroutineDec := ('constructor'|'function'|'method') ('void'|type)
    ///                   IDENTIFIER '(' parameterList ')' subroutineBody`
    fn compile_subroutine(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        let kind = match self
            .tokens
            .consume_any(&[
                T::Keyword(K::Constructor),
                T::Keyword(K::Function),
                T::Keyword(K::Method),
            ])?
            .kind
        {
            T::Keyword(K::Constructor) => SubroutineKind::Constructor,
            T::Keyword(K::Method) => SubroutineKind::Method,
            _ => SubroutineKind::Function,
        };

        if !self.tokens.match_token(T::Keyword(K::Void)) {
            self.compile_type()?;
        }

        let name = self.tokens.consume(T::Ident)?;
        ctx.reset(kind, name.lexeme.clone());

        // The receiver is the first implicit argument of a method.
        if kind == SubroutineKind::Method {
            ctx.symbols
                .define("this", ctx.class_name, Kind::Argument)
                .map_err(|err| JackError::Symbol {
                    err,
                    line: name.line,
                })?;
        }

        self.tokens.consume(T::Symbol(Punct::LeftParen))?;
        self.compile_parameter_list(ctx)?;
        self.tokens.consume(T::Symbol(Punct::RightParen))?;

        self.compile_subroutine_body(ctx)
    }

    /// `parameterList := ((type IDENTIFIER) (',' type IDENTIFIER)*)?`
    fn compile_parameter_list(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        if self.tokens.check(T::Symbol(Punct::RightParen)) {
            return Ok(());
        }

        loop {
            let ty = self.compile_type()?;
            let name = self.tokens.consume(T::Ident)?;
            define(&mut ctx.symbols, &name, ty, Kind::Argument)?;

            if !self.tokens.match_token(T::Symbol(Punct::Comma)) {
                return Ok(());
            }
        }
    }

    /// `subroutineBody := '{' varDec* statements '}'`
    fn compile_subroutine_body(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        self.tokens.consume(T::Symbol(Punct::LeftBrace))?;

        while self.tokens.check(T::Keyword(K::Var)) {
            self.compile_var_dec(ctx)?;
        }

        let n_locals = ctx.symbols.var_count(Kind::Local);
        let function_name = format!("{}.{}", ctx.class_name, ctx.name);
        debug!("{:?} {function_name}: {n_locals} locals", ctx.kind);
        self.writer.write_function(&function_name, n_locals)?;

        match ctx.kind {
            SubroutineKind::Constructor => {
                // Allocate the object and anchor `this` at its base address.
                self.writer.write_push(Segment::Constant, ctx.n_fields)?;
                self.writer.write_call(MEMORY_ALLOC, 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Method => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements(ctx)?;
        self.tokens.consume(T::Symbol(Punct::RightBrace))?;

        Ok(())
    }
}

/// Statements.
impl<'a, W: io::Write> CompilationEngine<'a, W> {
    /// `statements := statement*`
    fn compile_statements(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        loop {
            match self.tokens.peek_kind() {
                Some(T::Keyword(K::Let)) => self.compile_let(ctx)?,
                Some(T::Keyword(K::If)) => self.compile_if(ctx)?,
                Some(T::Keyword(K::While)) => self.compile_while(ctx)?,
                Some(T::Keyword(K::Do)) => self.compile_do(ctx)?,
                Some(T::Keyword(K::Return)) => self.compile_return(ctx)?,
                _ => return Ok(()),
            }
        }
    }

    /// `letStatement := 'let' IDENTIFIER ('[' expression ']')? '=' expression ';'`
    fn compile_let(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        self.tokens.consume(T::Keyword(K::Let))?;
        let name = self.tokens.consume(T::Ident)?;
        let (segment, index) = resolve_variable(ctx, &name)?;

        if self.tokens.match_token(T::Symbol(Punct::LeftBracket)) {
            // Target address is base + index.
            self.writer.write_push(segment, index)?;
            self.compile_expression(ctx)?;
            self.tokens.consume(T::Symbol(Punct::RightBracket))?;
            self.writer.write_arithmetic(Command::Add)?;

            self.tokens.consume(T::Symbol(Punct::Eq))?;
            self.compile_expression(ctx)?;

            // The right-hand side may itself index an array and clobber
            // THAT, so the address is only bound once the value is ready.
            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.tokens.consume(T::Symbol(Punct::Eq))?;
            self.compile_expression(ctx)?;
            self.writer.write_pop(segment, index)?;
        }

        self.tokens.consume(T::Symbol(Punct::Semicolon))?;
        Ok(())
    }

    /// `ifStatement := 'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    fn compile_if(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        let n = ctx.next_if();
        let if_true = ctx.label("IF_TRUE", n);
        let if_false = ctx.label("IF_FALSE", n);
        let if_end = ctx.label("IF_END", n);

        self.tokens.consume(T::Keyword(K::If))?;
        self.tokens.consume(T::Symbol(Punct::LeftParen))?;
        self.compile_expression(ctx)?;
        self.tokens.consume(T::Symbol(Punct::RightParen))?;

        self.writer.write_if(&if_true)?;
        self.writer.write_goto(&if_false)?;
        self.writer.write_label(&if_true)?;

        self.compile_block(ctx)?;

        self.writer.write_goto(&if_end)?;
        self.writer.write_label(&if_false)?;

        if self.tokens.match_token(T::Keyword(K::Else)) {
            self.compile_block(ctx)?;
        }

        self.writer.write_label(&if_end)?;
        Ok(())
    }

    /// `whileStatement := 'while' '(' expression ')' '{' statements '}'`
    fn compile_while(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        let n = ctx.next_while();
        let while_exp = ctx.label("WHILE_EXP", n);
        let while_end = ctx.label("WHILE_END", n);

        self.tokens.consume(T::Keyword(K::While))?;
        self.writer.write_label(&while_exp)?;

        self.tokens.consume(T::Symbol(Punct::LeftParen))?;
        self.compile_expression(ctx)?;
        self.tokens.consume(T::Symbol(Punct::RightParen))?;

        self.writer.write_arithmetic(Command::Not)?;
        self.writer.write_if(&while_end)?;

        self.compile_block(ctx)?;

        self.writer.write_goto(&while_exp)?;
        self.writer.write_label(&while_end)?;
        Ok(())
    }

    /// `'{' statements '}'`
    fn compile_block(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        self.tokens.consume(T::Symbol(Punct::LeftBrace))?;

        self.enter_nested()?;
        let result = self.compile_statements(ctx);
        self.depth -= 1;
        result?;

        self.tokens.consume(T::Symbol(Punct::RightBrace))?;
        Ok(())
    }

    /// `doStatement := 'do' subroutineCall ';'`
    fn compile_do(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        self.tokens.consume(T::Keyword(K::Do))?;
        let name = self.tokens.consume(T::Ident)?;
        self.compile_subroutine_call(ctx, name)?;
        self.tokens.consume(T::Symbol(Punct::Semicolon))?;

        // Discard the return value.
        self.writer.write_pop(Segment::Temp, 0)?;
        Ok(())
    }

    /// `returnStatement := 'return' expression? ';'`
    fn compile_return(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        self.tokens.consume(T::Keyword(K::Return))?;

        if self.tokens.check(T::Symbol(Punct::Semicolon)) {
            // Void subroutines still return a value.
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression(ctx)?;
        }

        self.tokens.consume(T::Symbol(Punct::Semicolon))?;
        self.writer.write_return()?;
        Ok(())
    }
}

/// Expressions.
impl<'a, W: io::Write> CompilationEngine<'a, W> {
    /// `expression := term (binaryOp term)*`
    ///
    /// Operators are applied strictly left to right. There are
    /// no precedence levels.
    fn compile_expression(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        self.compile_term(ctx)?;

        while let Some(T::Symbol(op)) = self.tokens.peek_kind() {
            if !op.is_binary_op() {
                break;
            }
            self.tokens.next_token();
            self.compile_term(ctx)?;
            self.compile_binary_op(op)?;
        }

        Ok(())
    }

    fn compile_binary_op(&mut self, op: Punct) -> JackResult<()> {
        match op {
            Punct::Plus => self.writer.write_arithmetic(Command::Add)?,
            Punct::Minus => self.writer.write_arithmetic(Command::Sub)?,
            Punct::Star => self.writer.write_call(MATH_MULTIPLY, 2)?,
            Punct::Slash => self.writer.write_call(MATH_DIVIDE, 2)?,
            Punct::Amp => self.writer.write_arithmetic(Command::And)?,
            Punct::Pipe => self.writer.write_arithmetic(Command::Or)?,
            Punct::Less => self.writer.write_arithmetic(Command::Lt)?,
            Punct::Greater => self.writer.write_arithmetic(Command::Gt)?,
            Punct::Eq => self.writer.write_arithmetic(Command::Eq)?,
            _ => unreachable!("not a binary operator: {op}"),
        }
        Ok(())
    }

    /// Compile one term, guarding the nesting depth.
    fn compile_term(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        self.enter_nested()?;
        let result = self.compile_term_inner(ctx);
        self.depth -= 1;
        result
    }

    /// Count one more level of nesting, shared by statement
    /// blocks and expression terms.
    ///
    /// Every successful call must be paired with a decrement of `depth`.
    fn enter_nested(&mut self) -> JackResult<()> {
        if self.depth >= self.conf.max_depth {
            let line = self
                .tokens
                .peek()
                .or_else(|| self.tokens.previous_token())
                .map(|token| token.line)
                .unwrap_or(1);
            return Err(JackError::NestingTooDeep {
                line,
                limit: self.conf.max_depth,
            });
        }

        self.depth += 1;
        Ok(())
    }

    /// ```text
    /// term := integerLiteral | stringLiteral | keywordConstant
    ///       | IDENTIFIER | IDENTIFIER '[' expression ']' | subroutineCall
    ///       | '(' expression ')' | unaryOp term
    /// ```
    fn compile_term_inner(&mut self, ctx: &mut SubroutineContext) -> JackResult<()> {
        let token = match self.tokens.peek() {
            Some(token) => token.clone(),
            None => return Err(self.tokens.unexpected("expression").into()),
        };

        match token.kind {
            T::Integer => {
                self.tokens.next_token();
                let value = match token.literal {
                    Some(Literal::Int(value)) if value <= MAX_CONSTANT => value,
                    _ => {
                        return Err(JackError::IntegerRange {
                            lexeme: token.lexeme,
                            line: token.line,
                        })
                    }
                };
                self.writer.write_push(Segment::Constant, value)?;
            }
            T::String => {
                self.tokens.next_token();
                self.compile_string(&token)?;
            }
            T::Keyword(K::True) => {
                self.tokens.next_token();
                self.writer.write_push(Segment::Constant, 0)?;
                self.writer.write_arithmetic(Command::Not)?;
            }
            T::Keyword(K::False | K::Null) => {
                self.tokens.next_token();
                self.writer.write_push(Segment::Constant, 0)?;
            }
            T::Keyword(K::This) => {
                self.tokens.next_token();
                self.writer.write_push(Segment::Pointer, 0)?;
            }
            T::Ident => {
                self.tokens.next_token();
                match self.tokens.peek_kind() {
                    Some(T::Symbol(Punct::LeftBracket)) => {
                        let (segment, index) = resolve_variable(ctx, &token)?;
                        self.writer.write_push(segment, index)?;
                        self.tokens.next_token();
                        self.compile_expression(ctx)?;
                        self.tokens.consume(T::Symbol(Punct::RightBracket))?;
                        self.writer.write_arithmetic(Command::Add)?;
                        self.writer.write_pop(Segment::Pointer, 1)?;
                        self.writer.write_push(Segment::That, 0)?;
                    }
                    Some(T::Symbol(Punct::LeftParen | Punct::Dot)) => {
                        self.compile_subroutine_call(ctx, token)?;
                    }
                    _ => {
                        let (segment, index) = resolve_variable(ctx, &token)?;
                        self.writer.write_push(segment, index)?;
                    }
                }
            }
            T::Symbol(Punct::LeftParen) => {
                self.tokens.next_token();
                self.compile_expression(ctx)?;
                self.tokens.consume(T::Symbol(Punct::RightParen))?;
            }
            T::Symbol(Punct::Minus) => {
                self.tokens.next_token();
                self.compile_term(ctx)?;
                self.writer.write_arithmetic(Command::Neg)?;
            }
            T::Symbol(Punct::Tilde) => {
                self.tokens.next_token();
                self.compile_term(ctx)?;
                self.writer.write_arithmetic(Command::Not)?;
            }
            _ => return Err(self.tokens.unexpected("expression").into()),
        }

        Ok(())
    }

    /// String constants are built at runtime with the OS
    /// `String.new` constructor, one `appendChar` per character.
    fn compile_string(&mut self, token: &Token) -> JackResult<()> {
        let text = match &token.literal {
            Some(Literal::Str(text)) => text.as_str(),
            _ => "",
        };

        let len = constant(text.chars().count(), token)?;
        self.writer.write_push(Segment::Constant, len)?;
        self.writer.write_call(STRING_NEW, 1)?;

        for c in text.chars() {
            self.writer.write_push(Segment::Constant, constant(c as usize, token)?)?;
            self.writer.write_call(STRING_APPEND_CHAR, 2)?;
        }

        Ok(())
    }

    /// Compile a call, with the leading identifier already consumed.
    ///
    /// ```text
    /// subroutineCall := IDENTIFIER '(' expressionList ')'
    ///                 | IDENTIFIER '.' IDENTIFIER '(' expressionList ')'
    /// ```
    fn compile_subroutine_call(&mut self, ctx: &mut SubroutineContext, name: Token) -> JackResult<()> {
        if self.tokens.match_token(T::Symbol(Punct::LeftParen)) {
            // Method on the current object.
            self.writer.write_push(Segment::Pointer, 0)?;
            let n_args = self.compile_expression_list(ctx, &name, 1)?;
            self.tokens.consume(T::Symbol(Punct::RightParen))?;

            let callee = format!("{}.{}", ctx.class_name, name.lexeme);
            self.writer.write_call(&callee, n_args)?;
            return Ok(());
        }

        if !self.tokens.match_token(T::Symbol(Punct::Dot)) {
            return Err(self.tokens.unexpected("'(' or '.'").into());
        }
        let subroutine = self.tokens.consume(T::Ident)?;
        self.tokens.consume(T::Symbol(Punct::LeftParen))?;

        // A qualifier in the symbol table is an object variable,
        // otherwise it names a class.
        let receiver = ctx
            .symbols
            .lookup(&name.lexeme)
            .map(|symbol| (symbol.segment(), symbol.index, symbol.ty.clone()));

        let (callee, n_args) = match receiver {
            Some((segment, index, ty)) => {
                self.writer.write_push(segment, index)?;
                let n_args = self.compile_expression_list(ctx, &subroutine, 1)?;
                (format!("{}.{}", ty, subroutine.lexeme), n_args)
            }
            None => {
                let n_args = self.compile_expression_list(ctx, &subroutine, 0)?;
                (format!("{}.{}", name.lexeme, subroutine.lexeme), n_args)
            }
        };

        self.tokens.consume(T::Symbol(Punct::RightParen))?;
        self.writer.write_call(&callee, n_args)?;
        Ok(())
    }

    /// `expressionList := (expression (',' expression)*)?`
    ///
    /// Returns the argument count of the call, which is the number of
    /// expressions compiled plus the `implicit` receiver arguments.
    fn compile_expression_list(
        &mut self,
        ctx: &mut SubroutineContext,
        callee: &Token,
        implicit: u16,
    ) -> JackResult<u16> {
        let mut count = implicit;
        if self.tokens.check(T::Symbol(Punct::RightParen)) {
            return Ok(count);
        }

        loop {
            self.compile_expression(ctx)?;
            count = count
                .checked_add(1)
                .ok_or_else(|| JackError::TooManyArguments {
                    name: callee.lexeme.clone(),
                    line: callee.line,
                })?;

            if !self.tokens.match_token(T::Symbol(Punct::Comma)) {
                return Ok(count);
            }
        }
    }
}

fn define(symbols: &mut SymbolTable, name: &Token, ty: impl Into<SmolStr>, kind: Kind) -> JackResult<u16> {
    symbols
        .define(name.lexeme.clone(), ty, kind)
        .map_err(|err| JackError::Symbol { err, line: name.line })
}

/// Resolve an identifier that must be a variable.
fn resolve_variable(ctx: &SubroutineContext, name: &Token) -> JackResult<(Segment, u16)> {
    ctx.symbols
        .lookup(&name.lexeme)
        .map(|symbol| (symbol.segment(), symbol.index))
        .ok_or_else(|| JackError::Undefined {
            name: name.lexeme.clone(),
            line: name.line,
        })
}

/// Convert a length or character code into a VM constant.
fn constant(value: usize, token: &Token) -> JackResult<u16> {
    u16::try_from(value)
        .ok()
        .filter(|value| *value <= MAX_CONSTANT)
        .ok_or_else(|| JackError::IntegerRange {
            lexeme: token.lexeme.clone(),
            line: token.line,
        })
}
