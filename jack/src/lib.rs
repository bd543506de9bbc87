pub mod compile;
mod error;
pub mod lex;
pub mod token_stream;
pub mod tokens;

pub use self::error::{JackError, JackResult};

pub mod prelude {
    pub use super::{
        compile::{Compiler, SymbolTable},
        error::{JackError, JackResult},
        lex::Lexer,
        token_stream::TokenStream,
    };
}

/// Compile the source of a single class into stack machine text.
pub fn compile_str(source: &str) -> JackResult<String> {
    // Lexical analysis
    let lexer = lex::Lexer::new(source);
    let stream = token_stream::TokenStream::new(lexer);

    // Parsing and code generation in one pass
    let mut compiler = compile::Compiler::new(stream, compile::SymbolTable::new());
    compiler.compile_class()?;

    Ok(compiler.output())
}

/// Token listing of a source file, one `<lexeme>, type: <category>` per line.
pub fn dump_tokens(source: &str) -> String {
    let mut stream = token_stream::TokenStream::new(lex::Lexer::new(source));
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = stream.dump(&mut out);
    out
}
