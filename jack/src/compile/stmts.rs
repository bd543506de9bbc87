//! Statements.
use super::{
    vm::{ArithOp, Instr, Segment},
    Compiler,
};
use crate::{
    error::{JackError, JackResult},
    tokens::{Keyword, TokenKind},
};

impl Compiler {
    /// Statements up to, but not including, the closing brace.
    pub(super) fn compile_statements(&mut self) -> JackResult<()> {
        while !self.input.at_symbol('}') {
            self.compile_statement()?;
        }
        Ok(())
    }

    /// ```text
    /// { statements }
    /// ```
    fn compile_block(&mut self) -> JackResult<()> {
        self.input.consume_symbol('{')?;
        self.compile_statements()?;
        self.input.consume_symbol('}')
    }

    fn compile_statement(&mut self) -> JackResult<()> {
        use Keyword as K;

        match self.input.current_kind()? {
            TokenKind::Keyword(K::Let) => self.compile_let(),
            TokenKind::Keyword(K::If) => self.compile_if(),
            TokenKind::Keyword(K::While) => self.compile_while(),
            TokenKind::Keyword(K::Do) => self.compile_do(),
            TokenKind::Keyword(K::Return) => self.compile_return(),
            _ => {
                let token = self.input.current()?;
                Err(JackError::UnexpectedStatement {
                    line: token.line,
                    found: token.lexeme.clone(),
                })
            }
        }
    }

    /// ```text
    /// let name ([ expression ])? = expression ;
    /// ```
    ///
    /// Array stores park the value in `temp 0` while the element address
    /// is computed into `pointer 1`.
    ///
    /// A plain index is evaluated after the value, right behind the
    /// array base. An index that calls a subroutine is evaluated before
    /// the value, since the callee may overwrite `temp 0`.
    fn compile_let(&mut self) -> JackResult<()> {
        self.input.consume_keyword(Keyword::Let)?;
        let name = self.input.consume_ident()?;

        let index = if self.input.match_symbol('[') {
            let code = self.capture(Self::compile_expression)?;
            self.input.consume_symbol(']')?;
            Some(ArrayIndex::new(code))
        } else {
            None
        };

        if let Some(ArrayIndex::Early(code)) = &index {
            self.code.extend_from_slice(code);
        }

        self.input.consume_symbol('=')?;
        self.compile_expression()?;
        self.input.consume_symbol(';')?;

        let (storage, slot) = self.symbols.resolve_storage(&name.lexeme)?;
        let index_code = match index {
            None => {
                self.emit(Instr::Pop(storage.segment(), slot));
                return Ok(());
            }
            Some(ArrayIndex::Late(code)) => code,
            Some(ArrayIndex::Early(_)) => vec![],
        };

        self.emit(Instr::Pop(Segment::Temp, 0));
        self.emit(Instr::Push(storage.segment(), slot));
        self.code.extend(index_code);
        self.emit(Instr::Arith(ArithOp::Add));
        self.emit(Instr::Pop(Segment::Pointer, 1));
        self.emit(Instr::Push(Segment::Temp, 0));
        self.emit(Instr::Pop(Segment::That, 0));

        Ok(())
    }

    /// ```text
    /// if ( expression ) { statements } (else { statements })?
    /// ```
    fn compile_if(&mut self) -> JackResult<()> {
        self.input.consume_keyword(Keyword::If)?;
        let (else_label, end_label) = self.label_pair();

        self.input.consume_symbol('(')?;
        self.compile_expression()?;
        self.input.consume_symbol(')')?;

        self.emit(Instr::Arith(ArithOp::Not));
        self.emit(Instr::IfGoto(else_label.clone()));
        self.compile_block()?;
        self.emit(Instr::Goto(end_label.clone()));

        self.emit(Instr::Label(else_label));
        if self.input.match_keyword(Keyword::Else) {
            self.compile_block()?;
        }
        self.emit(Instr::Label(end_label));

        Ok(())
    }

    /// ```text
    /// while ( expression ) { statements }
    /// ```
    fn compile_while(&mut self) -> JackResult<()> {
        self.input.consume_keyword(Keyword::While)?;
        let (top_label, exit_label) = self.label_pair();

        self.emit(Instr::Label(top_label.clone()));
        self.input.consume_symbol('(')?;
        self.compile_expression()?;
        self.input.consume_symbol(')')?;

        self.emit(Instr::Arith(ArithOp::Not));
        self.emit(Instr::IfGoto(exit_label.clone()));
        self.compile_block()?;
        self.emit(Instr::Goto(top_label));
        self.emit(Instr::Label(exit_label));

        Ok(())
    }

    /// ```text
    /// do subroutineCall ;
    /// ```
    fn compile_do(&mut self) -> JackResult<()> {
        self.input.consume_keyword(Keyword::Do)?;
        let name = self.input.consume_ident()?;
        self.compile_call(&name)?;
        self.input.consume_symbol(';')?;

        // Every subroutine returns a value, which nobody reads here.
        self.emit(Instr::Pop(Segment::Temp, 0));

        Ok(())
    }

    /// ```text
    /// return expression? ;
    /// ```
    fn compile_return(&mut self) -> JackResult<()> {
        self.input.consume_keyword(Keyword::Return)?;

        if self.input.match_symbol(';') {
            self.emit(Instr::Push(Segment::Constant, 0));
        } else {
            self.compile_expression()?;
            self.input.consume_symbol(';')?;
        }
        self.emit(Instr::Return);

        Ok(())
    }
}

/// Compiled index of an array store, and where it goes in the output.
enum ArrayIndex {
    /// Emitted before the value.
    Early(Vec<Instr>),
    /// Emitted after the value and the array base.
    Late(Vec<Instr>),
}

impl ArrayIndex {
    fn new(code: Vec<Instr>) -> Self {
        if code.iter().any(|instr| matches!(instr, Instr::Call(..))) {
            Self::Early(code)
        } else {
            Self::Late(code)
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{compile_str, error::JackError};

    /// Wrap statements in a function body and compile, returning
    /// only the instructions after the `function` line.
    fn body(decls: &str, stmts: &str) -> Result<String, JackError> {
        let source = format!("class T {{ {decls} function void f() {{ {stmts} }} }}");
        compile_str(&source).map(|out| out.lines().skip(1).map(|l| format!("{l}\n")).collect())
    }

    #[test]
    fn test_let_field() {
        let out = body("field int x; static int s;", "let x = 3; let s = x; return;").unwrap();
        let expected = concat!(
            "push constant 3\n",
            "pop this 0\n",
            "push this 0\n",
            "pop static 0\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_let_array_element() {
        let out = body("field Array arr;", "let arr[2] = 10; return;").unwrap();
        let expected = concat!(
            "push constant 10\n",
            "pop temp 0\n",
            "push this 0\n",
            "push constant 2\n",
            "add\n",
            "pop pointer 1\n",
            "push temp 0\n",
            "pop that 0\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_let_array_index_with_call() {
        // The call must not run while the value sits in temp 0.
        let out = body("field Array a;", "let a[g()] = 10; return;").unwrap();
        let expected = concat!(
            "push pointer 0\n",
            "call T.g 1\n",
            "push constant 10\n",
            "pop temp 0\n",
            "push this 0\n",
            "add\n",
            "pop pointer 1\n",
            "push temp 0\n",
            "pop that 0\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_let_array_index_with_multiply() {
        let out = body("field Array a; static int i;", "let a[i * 2] = i; return;").unwrap();
        let expected = concat!(
            "push static 0\n",
            "push constant 2\n",
            "call Math.multiply 2\n",
            "push static 0\n",
            "pop temp 0\n",
            "push this 0\n",
            "add\n",
            "pop pointer 1\n",
            "push temp 0\n",
            "pop that 0\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_let_array_value_with_call() {
        // Calls in the value finish before temp 0 is written.
        let out = body("field Array a; static int i;", "let a[i + 1] = Math.abs(i); return;").unwrap();
        let expected = concat!(
            "push static 0\n",
            "call Math.abs 1\n",
            "pop temp 0\n",
            "push this 0\n",
            "push static 0\n",
            "push constant 1\n",
            "add\n",
            "add\n",
            "pop pointer 1\n",
            "push temp 0\n",
            "pop that 0\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_let_array_index_with_string() {
        let out = body("field Array a;", "let a[\"x\"] = 1; return;").unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            &lines[..6],
            [
                "push constant 1",
                "call String.new 1",
                "push constant 120",
                "call String.appendChar 2",
                "push constant 1",
                "pop temp 0",
            ]
        );
    }

    #[test]
    fn test_if_without_else() {
        let out = body("field int x;", "if (false) { let x = 1; } return;").unwrap();
        let expected = concat!(
            "push constant 0\n",
            "not\n",
            "if-goto T0L1\n",
            "push constant 1\n",
            "pop this 0\n",
            "goto T0L2\n",
            "label T0L1\n",
            "label T0L2\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_if_else() {
        let out = body("static int x;", "if (true) { let x = 1; } else { let x = 2; } return;").unwrap();
        let expected = concat!(
            "push constant 1\n",
            "neg\n",
            "not\n",
            "if-goto T0L1\n",
            "push constant 1\n",
            "pop static 0\n",
            "goto T0L2\n",
            "label T0L1\n",
            "push constant 2\n",
            "pop static 0\n",
            "label T0L2\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_while() {
        let out = body("static int i;", "while (i < 3) { let i = i + 1; } return;").unwrap();
        let expected = concat!(
            "label T0L1\n",
            "push static 0\n",
            "push constant 3\n",
            "lt\n",
            "not\n",
            "if-goto T0L2\n",
            "push static 0\n",
            "push constant 1\n",
            "add\n",
            "pop static 0\n",
            "goto T0L1\n",
            "label T0L2\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_nested_control_flow_labels() {
        let out = body(
            "static int i;",
            "while (true) { if (i) { } else { while (false) { } } } if (i) { } return;",
        )
        .unwrap();

        let labels: Vec<&str> = out.lines().filter(|l| l.starts_with("label ")).collect();
        assert_eq!(
            labels,
            [
                "label T0L1",
                "label T1L1",
                "label T2L1",
                "label T2L2",
                "label T1L2",
                "label T0L2",
                "label T3L1",
                "label T3L2",
            ]
        );
    }

    #[test]
    fn test_do_static_call() {
        let out = body("", "do Output.printInt(5); return;").unwrap();
        let expected = concat!(
            "push constant 5\n",
            "call Output.printInt 1\n",
            "pop temp 0\n",
            "push constant 0\n",
            "return\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_return_expression() {
        let out = body("", "return 7;").unwrap();
        assert_eq!(out, "push constant 7\nreturn\n");
    }

    #[test]
    fn test_unexpected_statement() {
        assert_eq!(
            body("", "return; var int x;"),
            Err(JackError::UnexpectedStatement {
                line: 1,
                found: "var".into()
            })
        );
        assert!(matches!(
            body("", "x = 1;"),
            Err(JackError::UnexpectedStatement { .. })
        ));
    }

    #[test]
    fn test_undefined_variable_is_fatal() {
        assert_eq!(
            body("", "let nope = 1; return;"),
            Err(JackError::UndefinedSymbol("nope".into()))
        );
    }

    #[test]
    fn test_do_requires_call() {
        assert!(matches!(body("static int x;", "do x; return;"), Err(JackError::Syntax { .. })));
    }

    #[test]
    fn test_missing_semicolon() {
        assert!(matches!(body("", "return 1 }"), Err(JackError::Syntax { .. })));
    }
}
