pub mod parser;

pub use parser::Parser;

use eca_lexer::Lexer;
use eca_syntax::ast::Program;
use eca_syntax::error::Result;

/// Lexes and parses a complete source file.
pub fn parse(source: &str) -> Result<Program> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_program()
}
