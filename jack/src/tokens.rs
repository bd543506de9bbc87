//! Tokens
use std::fmt;

use smol_str::SmolStr;

/// Classified lexeme.
///
/// String constants keep their surrounding quotes in `lexeme`. Use
/// [`Token::string_value`] for the text between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: SmolStr,
    /// Source line the token started on, 1-based.
    pub line: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<SmolStr>, line: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }

    #[inline]
    pub fn is_symbol(&self, symbol: char) -> bool {
        self.kind == TokenKind::Symbol && self.lexeme.len() == 1 && self.lexeme.starts_with(symbol)
    }

    #[inline]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Text of a string constant without the delimiting quotes.
    ///
    /// An unterminated string has no closing quote, so only
    /// the opening one is removed.
    pub fn string_value(&self) -> &str {
        let text = self.lexeme.as_str();
        let text = text.strip_prefix('"').unwrap_or(text);
        text.strip_suffix('"').unwrap_or(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[rustfmt::skip]
pub enum TokenKind {
    /// Reserved identifiers
    Keyword(Keyword),
    /// One of `{ } ( ) [ ] . , ; + - * / & | < > = ~`
    Symbol,
    /// Number literal
    Integer,
    /// String literal, including its quotes
    String,
    Ident,
}

/// Category names used by the token dump.
impl fmt::Display for TokenKind {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Keyword(_) => write!(f, "keyword"),
            Self::Symbol     => write!(f, "symbol"),
            Self::Integer    => write!(f, "integerConstant"),
            Self::String     => write!(f, "StringConstant"),
            Self::Ident      => write!(f, "identifier"),
        }
    }
}

/// Reserved keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Keyword {
    // ------------------------------------------------------------------------
    // Declarations
    Class,        // class
    Constructor,  // constructor
    Function,     // function
    Method,       // method
    Field,        // field
    Static,       // static
    Var,          // var

    // ------------------------------------------------------------------------
    // Types
    Int,          // int
    Char,         // char
    Boolean,      // boolean
    Void,         // void

    // ------------------------------------------------------------------------
    // Constants
    True,         // true
    False,        // false
    Null,         // null
    This,         // this

    // ------------------------------------------------------------------------
    // Statements
    Let,          // let
    Do,           // do
    If,           // if
    Else,         // else
    While,        // while
    Return,       // return
}

impl Keyword {
    #[rustfmt::skip]
    pub fn parse(text: impl AsRef<str>) -> Option<Self> {
        match text.as_ref() {
            "class"       => Some(Self::Class),
            "constructor" => Some(Self::Constructor),
            "function"    => Some(Self::Function),
            "method"      => Some(Self::Method),
            "field"       => Some(Self::Field),
            "static"      => Some(Self::Static),
            "var"         => Some(Self::Var),
            // ----------------------------------------------------------------
            "int"         => Some(Self::Int),
            "char"        => Some(Self::Char),
            "boolean"     => Some(Self::Boolean),
            "void"        => Some(Self::Void),
            // ----------------------------------------------------------------
            "true"        => Some(Self::True),
            "false"       => Some(Self::False),
            "null"        => Some(Self::Null),
            "this"        => Some(Self::This),
            // ----------------------------------------------------------------
            "let"         => Some(Self::Let),
            "do"          => Some(Self::Do),
            "if"          => Some(Self::If),
            "else"        => Some(Self::Else),
            "while"       => Some(Self::While),
            "return"      => Some(Self::Return),
            // ----------------------------------------------------------------
            _ => None,
        }
    }

    #[rustfmt::skip]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class       => "class",
            Self::Constructor => "constructor",
            Self::Function    => "function",
            Self::Method      => "method",
            Self::Field       => "field",
            Self::Static      => "static",
            Self::Var         => "var",
            Self::Int         => "int",
            Self::Char        => "char",
            Self::Boolean     => "boolean",
            Self::Void        => "void",
            Self::True        => "true",
            Self::False       => "false",
            Self::Null        => "null",
            Self::This        => "this",
            Self::Let         => "let",
            Self::Do          => "do",
            Self::If          => "if",
            Self::Else        => "else",
            Self::While       => "while",
            Self::Return      => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
