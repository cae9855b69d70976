//! ECA compiler: validated AST -> EVM bytecode.

pub mod alloc;
pub mod compiler;
pub mod emit;
pub mod error;
pub mod layout;
pub mod program;
pub mod validate;

pub use alloc::{plan, AddressWidths, AllocUnit, Symbol};
pub use compiler::{compile, Artifact, Compiler};
pub use emit::{emit, Emitted};
pub use error::{CompileError, Result, Warning};
pub use layout::{byte_width, resolve, Layout, ResolveLimits};
pub use program::{Function, Program, Variable};
pub use validate::{validate, Validated, MAX_FUNCTION_ARGS};
