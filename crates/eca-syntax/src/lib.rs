//! Syntax definitions shared by the ECA front end and compiler.

pub mod ast;
pub mod error;
pub mod token;

pub use ast::*;
pub use error::*;
pub use token::*;
