//! Stack machine instructions.
use std::fmt;

use smol_str::SmolStr;

/// Memory segment of the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    /// Fields of the current object.
    This,
    /// Target of the indirection register, used for array access.
    That,
    /// `pointer 0` holds `this`, `pointer 1` holds `that`.
    Pointer,
    Temp,
    Static,
}

impl fmt::Display for Segment {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Constant => "constant",
            Self::Local    => "local",
            Self::Argument => "argument",
            Self::This     => "this",
            Self::That     => "that",
            Self::Pointer  => "pointer",
            Self::Temp     => "temp",
            Self::Static   => "static",
        };
        f.write_str(name)
    }
}

/// Arithmetic and logic commands operating on the top of the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
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

impl fmt::Display for ArithOp {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq  => "eq",
            Self::Gt  => "gt",
            Self::Lt  => "lt",
            Self::And => "and",
            Self::Or  => "or",
            Self::Not => "not",
        };
        f.write_str(name)
    }
}

/// Control flow label, unique within a class.
///
/// Rendered as `<Class><id>L<arm>`. Every `if` and `while` takes one id
/// and uses arm 1 and arm 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub class: SmolStr,
    pub id: u32,
    pub arm: u8,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}L{}", self.class, self.id, self.arm)
    }
}

/// Fully qualified subroutine name, `Class.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualName {
    pub class: SmolStr,
    pub name: SmolStr,
}

impl QualName {
    pub fn new(class: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.name)
    }
}

/// Instruction of the stack machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instr {
    /// `push <segment> <index>`
    Push(Segment, u16),
    /// `pop <segment> <index>`
    Pop(Segment, u16),
    /// `add`, `sub`, `neg`, `eq`, `gt`, `lt`, `and`, `or`, `not`
    Arith(ArithOp),
    /// `label <name>`
    Label(Label),
    /// `goto <name>`
    Goto(Label),
    /// `if-goto <name>`
    /// Pops the top of the stack and jumps when it is not zero.
    IfGoto(Label),
    /// `call <Class.name> <argCount>`
    Call(QualName, u16),
    /// `function <Class.name> <localCount>`
    Function(QualName, u16),
    /// `return`
    Return,
}

/// Outputs instruction in its textual form.
impl fmt::Display for Instr {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instr::Push(seg, index)     => write!(f, "push {} {}", seg, index),
            Instr::Pop(seg, index)      => write!(f, "pop {} {}", seg, index),
            Instr::Arith(op)            => write!(f, "{}", op),
            Instr::Label(label)         => write!(f, "label {}", label),
            Instr::Goto(label)          => write!(f, "goto {}", label),
            Instr::IfGoto(label)        => write!(f, "if-goto {}", label),
            Instr::Call(name, args)     => write!(f, "call {} {}", name, args),
            Instr::Function(name, vars) => write!(f, "function {} {}", name, vars),
            Instr::Return               => write!(f, "return"),
        }
    }
}

/// Render instructions as newline terminated text.
pub fn render(code: &[Instr]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for instr in code {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}", instr);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_instruction_text() {
        let label = Label {
            class: "Main".into(),
            id: 3,
            arm: 2,
        };
        let code = [
            Instr::Function(QualName::new("Main", "main"), 2),
            Instr::Push(Segment::Constant, 7),
            Instr::Pop(Segment::Pointer, 1),
            Instr::Arith(ArithOp::Not),
            Instr::IfGoto(label.clone()),
            Instr::Goto(label.clone()),
            Instr::Label(label),
            Instr::Call(QualName::new("Math", "multiply"), 2),
            Instr::Return,
        ];

        let expected = concat!(
            "function Main.main 2\n",
            "push constant 7\n",
            "pop pointer 1\n",
            "not\n",
            "if-goto Main3L2\n",
            "goto Main3L2\n",
            "label Main3L2\n",
            "call Math.multiply 2\n",
            "return\n",
        );
        assert_eq!(render(&code), expected);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&[]), "");
    }
}
