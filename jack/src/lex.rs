//! Lexical analysis (tokenizer)
use crate::tokens::{Keyword, Token, TokenKind};

use itertools::{multipeek, MultiPeek};
use std::str::Chars;

/// Characters that always form a token on their own.
pub const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~";

/// Lexical analyzer.
///
/// Tokenizing is eager. The whole source is split into tokens before
/// the parser sees the first one, see [`Lexer::tokenize`].
pub struct Lexer<'a> {
    /// Keep reference to the source so the caller can
    /// retrieve it after tokenizing.
    original: &'a str,
    tokens: Vec<Token>,
    /// Characters of the identifier, keyword or number being built.
    pending: String,
    pending_line: u32,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            original: source_code,
            tokens: vec![],
            pending: String::new(),
            pending_line: 1,
            line: 1,
        }
    }

    /// Original source code that was passed in during construction.
    pub fn source_code(&self) -> &'a str {
        self.original
    }

    /// Strip comments and split the remaining text into classified tokens.
    ///
    /// The lexer is permissive. Characters outside the grammar end
    /// up inside identifiers, and an unterminated string constant
    /// runs to the end of the input. Rejecting them is left to the parser.
    pub fn tokenize(mut self) -> Vec<Token> {
        let text = strip_comments(self.original);
        let mut chars = text.chars();

        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    self.flush();
                    self.consume_string(&mut chars);
                }
                c if SYMBOLS.contains(c) => {
                    self.flush();
                    self.tokens.push(Token::new(TokenKind::Symbol, c.to_string(), self.line));
                }
                '\n' => {
                    self.flush();
                    self.line += 1;
                }
                c if is_whitespace(c) => self.flush(),
                c => {
                    if self.pending.is_empty() {
                        self.pending_line = self.line;
                    }
                    self.pending.push(c);
                }
            }
        }
        self.flush();

        log::trace!("{} tokens", self.tokens.len());
        self.tokens
    }

    /// Consume a string constant after its opening quote.
    ///
    /// The quotes are kept in the lexeme.
    fn consume_string(&mut self, chars: &mut Chars) {
        let line = self.line;
        let mut lexeme = String::from('"');

        for c in chars.by_ref() {
            lexeme.push(c);
            match c {
                '"' => break,
                '\n' => self.line += 1,
                _ => {}
            }
        }

        self.tokens.push(Token::new(TokenKind::String, lexeme, line));
    }

    /// Turn the pending run of characters into a token.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let kind = classify(&self.pending);
        let lexeme = std::mem::take(&mut self.pending);
        self.tokens.push(Token::new(kind, lexeme, self.pending_line));
    }
}

/// Classify a run of non-symbol, non-whitespace characters.
fn classify(run: &str) -> TokenKind {
    if run.chars().all(|c| c.is_ascii_digit()) {
        TokenKind::Integer
    } else {
        Keyword::parse(run)
            .map(TokenKind::Keyword)
            .unwrap_or(TokenKind::Ident)
    }
}

/// Remove `//` line comments and `/* */` block comments.
///
/// Comment delimiters inside string constants are left alone. Each
/// comment is replaced by a space so that it still separates tokens, and
/// newlines inside block comments are kept so line numbers stay intact.
///
/// A block comment that is never closed swallows the rest of the input.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = multipeek(source.chars());
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            in_string = c != '"';
            out.push(c);
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' => match chars.peek() {
                Some(&'/') => {
                    chars.next();
                    skip_line(&mut chars);
                    out.push(' ');
                }
                Some(&'*') => {
                    chars.next();
                    skip_block(&mut chars, &mut out);
                    out.push(' ');
                }
                _ => out.push('/'),
            },
            _ => out.push(c),
        }
    }

    out
}

/// Skip up to, but not including, the next newline.
fn skip_line(chars: &mut MultiPeek<Chars>) {
    while let Some(c) = chars.peek() {
        if *c == '\n' {
            break;
        }
        chars.next();
    }
}

/// Skip past the closing `*/`, keeping newlines.
fn skip_block(chars: &mut MultiPeek<Chars>, out: &mut String) {
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'/') => {
                chars.next();
                return;
            }
            '\n' => out.push('\n'),
            _ => {}
        }
    }
}

/// Test whether the character separates tokens.
///
/// Newline is handled separately because it advances the line count.
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}
