//! Result and errors.
use std::fmt::{self, Display, Formatter};

use smol_str::SmolStr;

use crate::compile::Storage;

pub type JackResult<T> = std::result::Result<T, JackError>;

/// Fatal compilation error.
///
/// Any error aborts the whole compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JackError {
    /// Token does not fit the shape the grammar requires here.
    Syntax {
        line: u32,
        expected: String,
        found: SmolStr,
    },
    /// Statement position holds something other than `let`, `if`,
    /// `while`, `do` or `return`.
    UnexpectedStatement { line: u32, found: SmolStr },
    /// Ran out of tokens in the middle of a production.
    EndOfSource,
    /// Identifier is neither a subroutine variable nor a class member.
    UndefinedSymbol(SmolStr),
    /// Variable declared into the wrong scope.
    ///
    /// This is a bug in the compiler, not in the source program.
    InvalidStorage { name: SmolStr, storage: Storage },
    /// Integer literal exceeds the VM constant range.
    IntegerRange { line: u32, lexeme: SmolStr },
    /// A count exceeds what its instruction operand can carry.
    TooMany {
        what: &'static str,
        count: usize,
        limit: u16,
    },
}

impl JackError {
    pub(crate) fn syntax(line: u32, expected: impl ToString, found: impl Into<SmolStr>) -> Self {
        Self::Syntax {
            line,
            expected: expected.to_string(),
            found: found.into(),
        }
    }
}

impl Display for JackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { line, expected, found } => {
                write!(f, "line {line}: expected {expected}, found '{found}'")
            }
            Self::UnexpectedStatement { line, found } => {
                write!(f, "line {line}: unexpected statement: {found}")
            }
            Self::EndOfSource => write!(f, "unexpected end of source code"),
            Self::UndefinedSymbol(name) => write!(f, "identifier not found: {name}"),
            Self::InvalidStorage { name, storage } => {
                write!(f, "cannot declare '{name}' with storage {storage:?} in this scope")
            }
            Self::IntegerRange { line, lexeme } => {
                write!(f, "line {line}: integer constant {lexeme} out of range 0..=32767")
            }
            Self::TooMany { what, count, limit } => {
                write!(f, "too many {what}: {count} exceeds {limit}")
            }
        }
    }
}

/// Narrow a count to an instruction operand no larger than `limit`.
pub(crate) fn operand(what: &'static str, count: usize, limit: u16) -> JackResult<u16> {
    match u16::try_from(count) {
        Ok(value) if value <= limit => Ok(value),
        _ => Err(JackError::TooMany { what, count, limit }),
    }
}

impl std::error::Error for JackError {}
