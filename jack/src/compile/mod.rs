//! Single pass parser and code generator.
//!
//! Each grammar production is a method on [`Compiler`] that consumes its
//! tokens and appends stack machine instructions as it goes. There is no
//! syntax tree in between.
mod expr;
mod stmts;
mod symbol;
pub mod vm;

pub use self::symbol::{Storage, Symbol, SymbolTable};

use self::{
    expr::MAX_CONSTANT,
    vm::{Instr, Label, QualName, Segment},
};
use crate::{
    error::{operand, JackError, JackResult},
    token_stream::TokenStream,
    tokens::{Keyword, TokenKind},
};
use smol_str::SmolStr;

/// Compiles one class into stack machine code.
pub struct Compiler {
    input: TokenStream,
    symbols: SymbolTable,
    /// Resulting generated code.
    code: Vec<Instr>,
    class_name: SmolStr,
    /// Next label id. Shared by every subroutine of the class
    /// so labels never collide.
    label_counter: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl Compiler {
    pub fn new(input: TokenStream, symbols: SymbolTable) -> Self {
        Self {
            input,
            symbols,
            code: vec![],
            class_name: SmolStr::default(),
            label_counter: 0,
        }
    }

    /// Generated instructions.
    #[inline]
    pub fn code(&self) -> &[Instr] {
        &self.code
    }

    /// Generated instructions as text, one per line.
    pub fn output(&self) -> String {
        vm::render(&self.code)
    }

    /// Name of the class compiled by the last call to [`Compiler::compile_class`].
    #[inline]
    pub fn class_name(&self) -> &str {
        self.class_name.as_str()
    }

    #[inline]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    #[inline]
    fn emit(&mut self, instr: Instr) {
        self.code.push(instr)
    }

    /// Reserve a label id and return both of its arms.
    fn label_pair(&mut self) -> (Label, Label) {
        let id = self.label_counter;
        self.label_counter += 1;

        let label = |arm| Label {
            class: self.class_name.clone(),
            id,
            arm,
        };
        (label(1), label(2))
    }

    /// Run a production and return the code it generated, without
    /// appending it to the output.
    fn capture(&mut self, production: impl FnOnce(&mut Self) -> JackResult<()>) -> JackResult<Vec<Instr>> {
        let outer = std::mem::take(&mut self.code);
        let result = production(self);
        let inner = std::mem::replace(&mut self.code, outer);
        result.map(|_| inner)
    }

    /// Syntax error pointing at the current token.
    #[inline(never)]
    #[cold]
    fn unexpected(&self, expected: &str) -> JackError {
        match self.input.current() {
            Ok(token) => JackError::syntax(token.line, expected, token.lexeme.clone()),
            Err(err) => err,
        }
    }
}

/// Declarations
impl Compiler {
    /// Compile the class that makes up the whole compilation unit.
    ///
    /// ```text
    /// class Name { classVarDec* subroutineDec* }
    /// ```
    pub fn compile_class(&mut self) -> JackResult<()> {
        self.symbols.reset_class_scope();
        self.code.clear();
        self.label_counter = 0;

        self.input.consume_keyword(Keyword::Class)?;
        self.class_name = self.input.consume_ident()?.lexeme;
        self.input.consume_symbol('{')?;

        while self.input.at_keyword(Keyword::Static) || self.input.at_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }
        log::debug!(
            "class {}: {} fields, {} statics",
            self.class_name,
            self.symbols.count_fields(),
            self.symbols.count_statics()
        );

        while let Some(kind) = self.subroutine_kind() {
            self.compile_subroutine(kind)?;
        }

        self.input.consume_symbol('}')?;

        // One file holds exactly one class.
        if self.input.has_more() {
            return Err(self.unexpected("end of source"));
        }

        log::debug!("class {}: {} instructions", self.class_name, self.code.len());
        Ok(())
    }

    /// ```text
    /// (static | field) type name (, name)* ;
    /// ```
    fn compile_class_var_dec(&mut self) -> JackResult<()> {
        let storage = if self.input.match_keyword(Keyword::Static) {
            Storage::Static
        } else {
            self.input.consume_keyword(Keyword::Field)?;
            Storage::Field
        };
        let ty = self.compile_type(false)?;

        loop {
            let name = self.input.consume_ident()?;
            self.symbols.declare_class_member(&name.lexeme, &ty, storage)?;
            if !self.input.match_symbol(',') {
                break;
            }
        }

        self.input.consume_symbol(';')
    }

    /// Kind of subroutine declared by the current token, if any.
    fn subroutine_kind(&self) -> Option<SubroutineKind> {
        match self.input.current_kind() {
            Ok(TokenKind::Keyword(Keyword::Constructor)) => Some(SubroutineKind::Constructor),
            Ok(TokenKind::Keyword(Keyword::Function)) => Some(SubroutineKind::Function),
            Ok(TokenKind::Keyword(Keyword::Method)) => Some(SubroutineKind::Method),
            _ => None,
        }
    }

    /// ```text
    /// (constructor | function | method) (void | type) name ( parameterList ) {
    ///     varDec*
    ///     statements
    /// }
    /// ```
    fn compile_subroutine(&mut self, kind: SubroutineKind) -> JackResult<()> {
        self.symbols.reset_subroutine_scope();
        self.input.advance()?;

        // The receiver is passed as the hidden first argument.
        if kind == SubroutineKind::Method {
            self.symbols
                .declare_subroutine_var("this", &self.class_name, Storage::Argument)?;
        }

        let _return_type = self.compile_type(true)?;
        let name = self.input.consume_ident()?.lexeme;

        self.input.consume_symbol('(')?;
        self.compile_parameter_list()?;
        self.input.consume_symbol(')')?;

        self.input.consume_symbol('{')?;
        while self.input.at_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        // Frame size is only known once every local is declared.
        let locals = operand("locals", self.symbols.count_locals(), u16::MAX)?;
        log::debug!(
            "{:?} {}.{}: {} args, {} locals",
            kind,
            self.class_name,
            name,
            self.symbols.count_args(),
            locals
        );
        self.emit(Instr::Function(QualName::new(self.class_name.clone(), name), locals));

        match kind {
            SubroutineKind::Constructor => {
                let fields = operand("fields", self.symbols.count_fields(), MAX_CONSTANT)?;
                self.emit(Instr::Push(Segment::Constant, fields));
                self.emit(Instr::Call(QualName::new("Memory", "alloc"), 1));
                self.emit(Instr::Pop(Segment::Pointer, 0));
            }
            SubroutineKind::Method => {
                self.emit(Instr::Push(Segment::Argument, 0));
                self.emit(Instr::Pop(Segment::Pointer, 0));
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;
        self.input.consume_symbol('}')
    }

    /// ```text
    /// ((type name) (, type name)*)?
    /// ```
    fn compile_parameter_list(&mut self) -> JackResult<()> {
        if self.input.at_symbol(')') {
            return Ok(());
        }

        loop {
            let ty = self.compile_type(false)?;
            let name = self.input.consume_ident()?;
            self.symbols
                .declare_subroutine_var(&name.lexeme, &ty, Storage::Argument)?;
            if !self.input.match_symbol(',') {
                return Ok(());
            }
        }
    }

    /// ```text
    /// var type name (, name)* ;
    /// ```
    fn compile_var_dec(&mut self) -> JackResult<()> {
        self.input.consume_keyword(Keyword::Var)?;
        let ty = self.compile_type(false)?;

        loop {
            let name = self.input.consume_ident()?;
            self.symbols
                .declare_subroutine_var(&name.lexeme, &ty, Storage::Local)?;
            if !self.input.match_symbol(',') {
                break;
            }
        }

        self.input.consume_symbol(';')
    }

    /// Primitive type or class name, optionally `void`.
    fn compile_type(&mut self, allow_void: bool) -> JackResult<SmolStr> {
        use Keyword as K;

        let token = self.input.current()?;
        match token.kind {
            TokenKind::Keyword(K::Int | K::Char | K::Boolean) | TokenKind::Ident => {}
            TokenKind::Keyword(K::Void) if allow_void => {}
            _ => return Err(self.unexpected("type")),
        }

        self.input.next_token().map(|token| token.lexeme)
    }
}
