//! Random access stream of tokens with a forward cursor.
use std::fmt::{self, Write as FmtWrite};

use crate::{
    error::{JackError, JackResult},
    lex::Lexer,
    tokens::{Keyword, Token, TokenKind},
};

/// Fully lexed token sequence with a cursor.
///
/// The cursor is always within `0..=len`, where `len` means
/// end-of-source. The parser only ever moves it forward, deciding
/// each production from the current token and at most one token
/// of lookahead.
pub struct TokenStream {
    tokens: Vec<Token>,
    cursor: usize,
}

impl TokenStream {
    pub fn new(lexer: Lexer) -> Self {
        Self::from_tokens(lexer.tokenize())
    }

    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        Self { tokens, cursor: 0 }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Current cursor position.
    #[inline]
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Indicates whether the cursor still points at a token.
    #[inline]
    pub fn has_more(&self) -> bool {
        self.cursor < self.tokens.len()
    }

    /// Return the current token without advancing the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`JackError::EndOfSource`] when the cursor is past the last token.
    #[inline]
    pub fn current(&self) -> JackResult<&Token> {
        self.tokens.get(self.cursor).ok_or(JackError::EndOfSource)
    }

    #[inline]
    pub fn current_lexeme(&self) -> JackResult<&str> {
        self.current().map(|token| token.lexeme.as_str())
    }

    #[inline]
    pub fn current_kind(&self) -> JackResult<TokenKind> {
        self.current().map(|token| token.kind)
    }

    /// Lexeme of the token after the current one.
    ///
    /// Returns `None` when there is no such token.
    #[inline]
    pub fn peek_next_lexeme(&self) -> Option<&str> {
        self.tokens.get(self.cursor + 1).map(|token| token.lexeme.as_str())
    }

    /// Move the cursor forward by one token.
    ///
    /// # Errors
    ///
    /// Advancing from end-of-source is an error, the cursor stays put.
    #[inline]
    pub fn advance(&mut self) -> JackResult<()> {
        if self.has_more() {
            self.cursor += 1;
            Ok(())
        } else {
            Err(JackError::EndOfSource)
        }
    }

    /// Rewind to the first token.
    ///
    /// Only used for diagnostic dumps, never while compiling.
    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Consumes and returns the current token.
    pub fn next_token(&mut self) -> JackResult<Token> {
        let token = self.current()?.clone();
        self.advance()?;
        Ok(token)
    }

    /// Consumes the current token if it is the given symbol.
    ///
    /// Returns true when matched. The cursor does not
    /// move when the symbol does not match.
    pub fn match_symbol(&mut self, symbol: char) -> bool {
        match self.tokens.get(self.cursor) {
            Some(token) if token.is_symbol(symbol) => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    /// Consumes the current token if it is the given keyword.
    pub fn match_keyword(&mut self, keyword: Keyword) -> bool {
        match self.tokens.get(self.cursor) {
            Some(token) if token.is_keyword(keyword) => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    /// Tests the current token against a symbol without consuming it.
    #[inline]
    pub fn at_symbol(&self, symbol: char) -> bool {
        matches!(self.tokens.get(self.cursor), Some(token) if token.is_symbol(symbol))
    }

    /// Tests the current token against a keyword without consuming it.
    #[inline]
    pub fn at_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.tokens.get(self.cursor), Some(token) if token.is_keyword(keyword))
    }

    /// Consume the given symbol.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if the current token is anything else.
    /// The cursor is not advanced in that case.
    pub fn consume_symbol(&mut self, symbol: char) -> JackResult<()> {
        let token = self.current()?;
        if token.is_symbol(symbol) {
            self.cursor += 1;
            Ok(())
        } else {
            Err(JackError::syntax(token.line, format!("'{symbol}'"), token.lexeme.clone()))
        }
    }

    /// Consume the given keyword.
    pub fn consume_keyword(&mut self, keyword: Keyword) -> JackResult<()> {
        let token = self.current()?;
        if token.is_keyword(keyword) {
            self.cursor += 1;
            Ok(())
        } else {
            Err(JackError::syntax(token.line, format!("'{keyword}'"), token.lexeme.clone()))
        }
    }

    /// Consume an identifier and return it.
    pub fn consume_ident(&mut self) -> JackResult<Token> {
        let token = self.current()?;
        if token.kind == TokenKind::Ident {
            self.next_token()
        } else {
            Err(JackError::syntax(token.line, "identifier", token.lexeme.clone()))
        }
    }

    /// Write every token on its own line as `<lexeme>, type: <category>`.
    ///
    /// Rewinds the cursor before and after.
    pub fn dump<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        self.reset_cursor();
        while let Ok(token) = self.current() {
            writeln!(w, "{}, type: {}", token.lexeme, token.kind)?;
            self.cursor += 1;
        }
        self.reset_cursor();
        Ok(())
    }
}
