//! Compile errors and non-fatal warnings.

use std::fmt;

use thiserror::Error;

/// Every way a compile can fail. The first violation aborts compilation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    // binding
    #[error("'{0}' is defined more than once")]
    DuplicateDefinition(String),

    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("undefined function '{0}'")]
    UndefinedFunction(String),

    // shape
    #[error("function '{0}' declares {1} arguments, at most 16 are allowed")]
    TooManyArgs(String, usize),

    #[error("bytes literal size {actual} != the push size ({expected})")]
    LiteralSizeMismatch { expected: usize, actual: usize },

    #[error("function '{0}' cannot use variables")]
    IllegalVariableUse(String),

    #[error("cannot push {0} bytes, a push carries 1 to 32 bytes")]
    InvalidLiteralLength(usize),

    #[error("unknown opcode '{0}'")]
    UnknownOpcode(String),

    #[error("opcode '{0}' does not take an operand")]
    UnexpectedOperand(String),

    // layout
    #[error("layout did not converge after {passes} passes")]
    NonConvergent { passes: usize },

    /// Byte lengths differ, or the layout was resolved for a different
    /// number of units.
    #[error("output does not match the resolved layout (expected {expected}, found {actual})")]
    LayoutMismatch { expected: u64, actual: u64 },
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Advisory conditions reported alongside a successful compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Variables defined but never pushed; their marker bytes are still emitted.
    UnusedVariables(Vec<String>),
    /// Functions never called; they are left out of the output.
    UnusedFunctions(Vec<String>),
    /// A variable's address needed more bytes than its push opcode carries.
    TruncatedAddress { variable: String, address: u64, width: usize },
}

fn quoted(names: &[String]) -> String {
    names.iter().map(|n| format!("'{}'", n)).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnusedVariables(names) => write!(f, "unused vars: {}", quoted(names)),
            Warning::UnusedFunctions(names) => write!(f, "unused functions: {}", quoted(names)),
            Warning::TruncatedAddress { variable, address, width } => write!(
                f,
                "truncating address 0x{:x} of '{}' to {} byte{}",
                address,
                variable,
                width,
                if *width == 1 { "" } else { "s" }
            ),
        }
    }
}
