//! Expressions and terms.
use super::{
    vm::{ArithOp, Instr, QualName, Segment},
    Compiler,
};
use crate::{
    error::{operand, JackError, JackResult},
    tokens::{Keyword, Token, TokenKind},
};

/// Largest value a `push constant` can carry.
pub const MAX_CONSTANT: u16 = 0x7FFF; // 32767

impl Compiler {
    /// ```text
    /// term (op term)*
    /// ```
    ///
    /// All binary operators share one precedence level and
    /// associate to the left. Use parentheses to group.
    pub(super) fn compile_expression(&mut self) -> JackResult<()> {
        self.compile_term()?;

        while let Some(op) = self.input.current().ok().and_then(binary_op) {
            self.input.advance()?;
            self.compile_term()?;
            self.emit(op);
        }

        Ok(())
    }

    fn compile_term(&mut self) -> JackResult<()> {
        use Keyword as K;

        let token = self.input.next_token()?;
        match token.kind {
            TokenKind::Integer => {
                let value = parse_constant(&token)?;
                self.emit(Instr::Push(Segment::Constant, value));
            }
            TokenKind::String => self.compile_string(&token)?,
            TokenKind::Keyword(K::True) => {
                self.emit(Instr::Push(Segment::Constant, 1));
                self.emit(Instr::Arith(ArithOp::Neg));
            }
            TokenKind::Keyword(K::False | K::Null) => {
                self.emit(Instr::Push(Segment::Constant, 0));
            }
            TokenKind::Keyword(K::This) => {
                self.emit(Instr::Push(Segment::Pointer, 0));
            }
            TokenKind::Symbol if token.is_symbol('(') => {
                self.compile_expression()?;
                self.input.consume_symbol(')')?;
            }
            TokenKind::Symbol if token.is_symbol('-') => {
                self.compile_term()?;
                self.emit(Instr::Arith(ArithOp::Neg));
            }
            TokenKind::Symbol if token.is_symbol('~') => {
                self.compile_term()?;
                self.emit(Instr::Arith(ArithOp::Not));
            }
            TokenKind::Ident => self.compile_ident_term(&token)?,
            _ => return Err(JackError::syntax(token.line, "term", token.lexeme)),
        }

        Ok(())
    }

    /// Term starting with an identifier, told apart by the token after it.
    ///
    /// ```text
    /// name [ expression ]
    /// name . name ( expressionList )
    /// name ( expressionList )
    /// name
    /// ```
    fn compile_ident_term(&mut self, name: &Token) -> JackResult<()> {
        if self.input.match_symbol('[') {
            let (storage, index) = self.symbols.resolve_storage(&name.lexeme)?;
            self.emit(Instr::Push(storage.segment(), index));
            self.compile_expression()?;
            self.input.consume_symbol(']')?;

            self.emit(Instr::Arith(ArithOp::Add));
            self.emit(Instr::Pop(Segment::Pointer, 1));
            self.emit(Instr::Push(Segment::That, 0));
        } else if self.input.at_symbol('.') || self.input.at_symbol('(') {
            self.compile_call(name)?;
        } else {
            let (storage, index) = self.symbols.resolve_storage(&name.lexeme)?;
            self.emit(Instr::Push(storage.segment(), index));
        }

        Ok(())
    }

    /// Subroutine call, after its leading identifier.
    ///
    /// `name.sub(...)` is a method call when `name` is a variable in scope,
    /// dispatched on the variable's declared class with the variable as
    /// receiver. Otherwise `name` is taken to be a class and the call is
    /// a function or constructor call without a receiver.
    ///
    /// `sub(...)` is a method call on the current object.
    pub(super) fn compile_call(&mut self, name: &Token) -> JackResult<()> {
        if self.input.match_symbol('.') {
            let sub_name = self.input.consume_ident()?.lexeme;

            let (class, receiver) = match self.symbols.lookup(&name.lexeme) {
                Some(symbol) => (symbol.ty.clone(), Some((symbol.storage, symbol.index))),
                None => (name.lexeme.clone(), None),
            };
            if let Some((storage, index)) = receiver {
                self.emit(Instr::Push(storage.segment(), index));
            }

            let arg_count = self.compile_argument_list()? + usize::from(receiver.is_some());
            let arg_count = operand("arguments", arg_count, u16::MAX)?;
            self.emit(Instr::Call(QualName::new(class, sub_name), arg_count));
        } else if self.input.at_symbol('(') {
            self.emit(Instr::Push(Segment::Pointer, 0));

            let arg_count = operand("arguments", self.compile_argument_list()? + 1, u16::MAX)?;
            let callee = QualName::new(self.class_name.clone(), name.lexeme.clone());
            self.emit(Instr::Call(callee, arg_count));
        } else {
            return Err(self.unexpected("'.' or '('"));
        }

        Ok(())
    }

    /// ```text
    /// ( (expression (, expression)*)? )
    /// ```
    ///
    /// Returns the number of arguments compiled. The count is local to
    /// this call, so calls nested inside arguments keep their own.
    fn compile_argument_list(&mut self) -> JackResult<usize> {
        self.input.consume_symbol('(')?;
        if self.input.match_symbol(')') {
            return Ok(0);
        }

        let mut count = 0;
        loop {
            self.compile_expression()?;
            count += 1;
            if !self.input.match_symbol(',') {
                break;
            }
        }
        self.input.consume_symbol(')')?;

        Ok(count)
    }

    /// Build a string object one character at a time.
    fn compile_string(&mut self, token: &Token) -> JackResult<()> {
        let value = token.string_value();

        let len = operand("characters in string constant", value.chars().count(), MAX_CONSTANT)?;
        self.emit(Instr::Push(Segment::Constant, len));
        self.emit(Instr::Call(QualName::new("String", "new"), 1));

        for c in value.chars() {
            let code = u16::try_from(u32::from(c))
                .ok()
                .filter(|code| *code <= MAX_CONSTANT)
                .ok_or_else(|| JackError::syntax(token.line, "character in the 16-bit range", c.to_string()))?;
            self.emit(Instr::Push(Segment::Constant, code));
            self.emit(Instr::Call(QualName::new("String", "appendChar"), 2));
        }

        Ok(())
    }
}

/// Instruction for a binary operator token.
#[rustfmt::skip]
fn binary_op(token: &Token) -> Option<Instr> {
    if token.kind != TokenKind::Symbol {
        return None;
    }

    match token.lexeme.as_str() {
        "+" => Some(Instr::Arith(ArithOp::Add)),
        "-" => Some(Instr::Arith(ArithOp::Sub)),
        "*" => Some(Instr::Call(QualName::new("Math", "multiply"), 2)),
        "/" => Some(Instr::Call(QualName::new("Math", "divide"), 2)),
        "&" => Some(Instr::Arith(ArithOp::And)),
        "|" => Some(Instr::Arith(ArithOp::Or)),
        "<" => Some(Instr::Arith(ArithOp::Lt)),
        ">" => Some(Instr::Arith(ArithOp::Gt)),
        "=" => Some(Instr::Arith(ArithOp::Eq)),
        _   => None,
    }
}

fn parse_constant(token: &Token) -> JackResult<u16> {
    token
        .lexeme
        .parse::<u16>()
        .ok()
        .filter(|value| *value <= MAX_CONSTANT)
        .ok_or_else(|| JackError::IntegerRange {
            line: token.line,
            lexeme: token.lexeme.clone(),
        })
}

#[cfg(test)]
mod test {
    use crate::{compile_str, error::JackError};

    /// Compile `return <expr>;` inside a method of class `T` and return
    /// the code between the `this` binding and the `return`.
    fn expr(decls: &str, locals: &str, expr: &str) -> Result<Vec<String>, JackError> {
        let source = format!("class T {{ {decls} method int f(int a, T b) {{ {locals} return {expr}; }} }}");
        let out = compile_str(&source)?;
        let lines: Vec<String> = out.lines().map(str::to_owned).collect();
        Ok(lines[3..lines.len() - 1].to_vec())
    }

    #[test]
    fn test_flat_left_to_right() {
        // 1 + 2 * 3 is (1 + 2) * 3
        assert_eq!(
            expr("", "", "1 + 2 * 3").unwrap(),
            ["push constant 1", "push constant 2", "add", "push constant 3", "call Math.multiply 2"]
        );
    }

    #[test]
    fn test_all_operators() {
        let out = expr("", "", "a - a / a & a | a < a > a = a").unwrap();
        let ops: Vec<&str> = out.iter().map(String::as_str).filter(|l| *l != "push argument 1").collect();
        assert_eq!(ops, ["sub", "call Math.divide 2", "and", "or", "lt", "gt", "eq"]);
    }

    #[test]
    fn test_parentheses_group() {
        assert_eq!(
            expr("", "", "1 + (2 * 3)").unwrap(),
            ["push constant 1", "push constant 2", "push constant 3", "call Math.multiply 2", "add"]
        );
    }

    #[test]
    fn test_unary() {
        assert_eq!(expr("", "", "-a").unwrap(), ["push argument 1", "neg"]);
        assert_eq!(expr("", "", "~(a = 1)").unwrap(), ["push argument 1", "push constant 1", "eq", "not"]);
        assert_eq!(expr("", "", "--1").unwrap(), ["push constant 1", "neg", "neg"]);
    }

    #[test]
    fn test_keyword_constants() {
        assert_eq!(expr("", "", "true").unwrap(), ["push constant 1", "neg"]);
        assert_eq!(expr("", "", "false").unwrap(), ["push constant 0"]);
        assert_eq!(expr("", "", "null").unwrap(), ["push constant 0"]);
        assert_eq!(expr("", "", "this").unwrap(), ["push pointer 0"]);
    }

    #[test]
    fn test_this_is_argument_zero_in_method() {
        // `this` is bound before `a`, so `a` is argument 1.
        assert_eq!(expr("", "", "a").unwrap(), ["push argument 1"]);
    }

    #[test]
    fn test_string_constant() {
        assert_eq!(
            expr("", "", "\"Hi!\"").unwrap(),
            [
                "push constant 3",
                "call String.new 1",
                "push constant 72",
                "call String.appendChar 2",
                "push constant 105",
                "call String.appendChar 2",
                "push constant 33",
                "call String.appendChar 2",
            ]
        );
        assert_eq!(expr("", "", "\"\"").unwrap(), ["push constant 0", "call String.new 1"]);
    }

    #[test]
    fn test_array_read() {
        assert_eq!(
            expr("", "var Array arr;", "arr[a + 1]").unwrap(),
            [
                "push local 0",
                "push argument 1",
                "push constant 1",
                "add",
                "add",
                "pop pointer 1",
                "push that 0",
            ]
        );
    }

    #[test]
    fn test_method_call_on_variable() {
        assert_eq!(
            expr("field Point p;", "", "p.distance(b, 2)").unwrap(),
            ["push this 0", "push argument 2", "push constant 2", "call Point.distance 3"]
        );
    }

    #[test]
    fn test_function_call_on_class() {
        assert_eq!(
            expr("", "", "Math.max(a, 2)").unwrap(),
            ["push argument 1", "push constant 2", "call Math.max 2"]
        );
        assert_eq!(expr("", "", "Keyboard.readChar()").unwrap(), ["call Keyboard.readChar 0"]);
    }

    #[test]
    fn test_call_on_current_object() {
        assert_eq!(expr("", "", "g()").unwrap(), ["push pointer 0", "call T.g 1"]);
        assert_eq!(
            expr("", "", "g(a)").unwrap(),
            ["push pointer 0", "push argument 1", "call T.g 2"]
        );
    }

    #[test]
    fn test_nested_call_argument_counts() {
        assert_eq!(
            expr("", "", "Math.max(Math.min(1, 2, 3), g())").unwrap(),
            [
                "push constant 1",
                "push constant 2",
                "push constant 3",
                "call Math.min 3",
                "push pointer 0",
                "call T.g 1",
                "call Math.max 2",
            ]
        );
    }

    #[test]
    fn test_integer_range() {
        assert_eq!(expr("", "", "32767").unwrap(), ["push constant 32767"]);
        assert_eq!(
            expr("", "", "32768"),
            Err(JackError::IntegerRange {
                line: 1,
                lexeme: "32768".into()
            })
        );
        assert!(expr("", "", "99999999999").is_err());
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(expr("", "", "ghost"), Err(JackError::UndefinedSymbol("ghost".into())));
        assert_eq!(
            expr("", "", "ghost[1]"),
            Err(JackError::UndefinedSymbol("ghost".into()))
        );
    }

    #[test]
    fn test_bad_term() {
        assert!(matches!(expr("", "", ")"), Err(JackError::Syntax { .. })));
        assert!(matches!(expr("", "", "int"), Err(JackError::Syntax { .. })));
    }

    #[test]
    fn test_string_constant_too_long() {
        let long = format!("\"{}\"", "x".repeat(70_000));
        assert_eq!(
            expr("", "", &long),
            Err(JackError::TooMany {
                what: "characters in string constant",
                count: 70_000,
                limit: 32767,
            })
        );

        let longest = format!("\"{}\"", "x".repeat(32767));
        assert_eq!(expr("", "", &longest).unwrap()[0], "push constant 32767");
    }
}
