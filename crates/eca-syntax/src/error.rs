//! Syntax error type shared by the ECA lexer and parser.
//!
//! Front-end failures are reported as a single [`Error`] carrying a message
//! and, when known, the 1-based source position. Later compilation stages
//! have their own structured error enums; this type only covers text that
//! could not be turned into an AST.
//!
//! # Examples
//!
//! ```rust
//! use eca_syntax::error::{Error, Result, error_at};
//!
//! fn expect_header(line: usize, col: usize, ok: bool) -> Result<()> {
//!     if ok {
//!         Ok(())
//!     } else {
//!         error_at(line, col, "Expected ':' after function header")
//!     }
//! }
//!
//! let err = expect_header(3, 9, false).unwrap_err();
//! assert_eq!(err.to_string(), "Expected ':' after function header at 3:9");
//! ```

use std::fmt;

/// An error that occurred while lexing or parsing ECA source.
///
/// # Fields
///
/// - `msg`: Human-readable error description
/// - `line`: Optional 1-based line number in source file
/// - `col`: Optional 1-based column number in source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Human-readable error message
    pub msg: String,

    /// Optional line number in source file (1-based)
    pub line: Option<usize>,

    /// Optional column number in source file (1-based)
    pub col: Option<usize>,
}

impl Error {
    /// Creates a new error with the given message and no source location.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            line: None,
            col: None,
        }
    }

    /// Creates a new error with the given message and source location.
    ///
    /// ```rust
    /// use eca_syntax::Error;
    ///
    /// let error = Error::with_span("Unexpected '@x'", 5, 12);
    /// assert_eq!(error.to_string(), "Unexpected '@x' at 5:12");
    /// ```
    pub fn with_span(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            msg: msg.into(),
            line: Some(line),
            col: Some(col),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(l), Some(c)) = (self.line, self.col) {
            write!(f, "{} at {}:{}", self.msg, l, c)
        } else {
            write!(f, "{}", self.msg)
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}
impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// A specialized `Result` type for front-end operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::with_span(msg, line, col))`.
///
/// # Parameters
///
/// - `line`: 1-based line number in the source file
/// - `col`: 1-based column number in the source file
/// - `msg`: The error message
pub fn error_at<T>(line: usize, col: usize, msg: impl Into<String>) -> Result<T> {
    Err(Error::with_span(msg, line, col))
}
