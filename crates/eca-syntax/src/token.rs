//! Token definitions for the ECA assembly dialect.
//!
//! Tokens are the smallest meaningful units of ECA source. The dialect is
//! line-oriented: newlines and leading indentation are significant because
//! function bodies are written as indented lines under a header.
//!
//! # Token Categories
//!
//! - **Words**: opcode mnemonics and function names (`ADD`, `PUSH2`, `transfer`)
//! - **Literals**: argument counts in headers (`2`) and byte strings (`0x01ff`)
//! - **Variables**: definitions (`#slot`) and references (`@slot`)
//! - **Punctuation**: `(`, `)`, `,`, `:`
//! - **Layout**: newlines, indentation, end-of-file
//!
//! # Examples
//!
//! ```rust
//! use eca_syntax::{Token, TokenKind};
//!
//! let push = Token {
//!     kind: TokenKind::Ident("PUSH1".to_string()),
//!     line: 1,
//!     col: 1,
//! };
//!
//! let literal = Token {
//!     kind: TokenKind::Bytes(vec![0x01]),
//!     line: 1,
//!     col: 7,
//! };
//! ```

/// Token types produced by the ECA lexer.
///
/// Each variant carries its semantic content (the text of a word, the value
/// of a number, the decoded bytes of a hex literal).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // === Words and literals ===

    /// An opcode mnemonic or function name.
    ///
    /// Examples: `ADD`, `PUSH32`, `my_func`
    Ident(String),

    /// A decimal number, only meaningful as an argument count in a function header.
    Number(u64),

    /// A hex byte string with its `0x` prefix stripped and digits decoded.
    ///
    /// Examples: `0x01`, `0xdeadbeef`
    Bytes(Vec<u8>),

    // === Variables ===

    /// A variable definition `#name`
    VarDef(String),

    /// A variable reference `@name`
    VarRef(String),

    // === Punctuation ===

    /// Left parenthesis `(`
    LParen,

    /// Right parenthesis `)`
    RParen,

    /// Comma separator `,` between argument counts
    Comma,

    /// Colon `:` closing a function header
    Colon,

    // === Layout ===

    /// End of a source line
    Newline,

    /// Leading whitespace on a non-blank line; opens a function body line
    Indent,

    /// End-of-file marker
    Eof,
}

impl TokenKind {
    /// Short human-readable description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(s) => format!("'{}'", s),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Bytes(b) => format!("{}-byte literal", b.len()),
            TokenKind::VarDef(s) => format!("'#{}'", s),
            TokenKind::VarRef(s) => format!("'@{}'", s),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Indent => "indentation".to_string(),
            TokenKind::Eof => "end of file".to_string(),
        }
    }
}

/// A token with its source location.
///
/// # Fields
///
/// - `kind`: The type and content of the token
/// - `line`: 1-based line number in the source file
/// - `col`: 1-based column number in the source file
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The type and semantic content of this token
    pub kind: TokenKind,

    /// Line number in the source file (1-based)
    pub line: usize,

    /// Column number in the source file (1-based)
    pub col: usize,
}
