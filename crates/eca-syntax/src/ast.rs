//! AST (abstract syntax tree) types for the ECA assembly dialect.

use serde::Serialize;

/// Largest operand width a `PUSHn` mnemonic may name.
pub const MAX_PUSH_WIDTH: usize = 32;

/// Returns `Some(n)` if `name` is spelled `PUSH<digits>`, whatever `n` is.
///
/// ```rust
/// use eca_syntax::push_suffix;
///
/// assert_eq!(push_suffix("PUSH4"), Some(4));
/// assert_eq!(push_suffix("PUSH"), None);
/// assert_eq!(push_suffix("POP"), None);
/// ```
pub fn push_suffix(name: &str) -> Option<usize> {
    let digits = name.strip_prefix("PUSH")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Operand attached to a push opcode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Operand {
    /// Literal bytes, most significant first.
    Literal(Vec<u8>),
    /// Address of a variable defined with `#name`.
    Var(String),
}

/// A single source instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    Op {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        operand: Option<Operand>,
    },
    Call {
        name: String,
    },
    VarDef {
        name: String,
    },
}

impl Instruction {
    /// Convenience constructor for an opcode without operand.
    pub fn op(name: impl Into<String>) -> Self {
        Instruction::Op { name: name.into(), operand: None }
    }

    /// Convenience constructor for a literal push.
    pub fn push(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Instruction::Op { name: name.into(), operand: Some(Operand::Literal(bytes)) }
    }

    /// Convenience constructor for a variable-address push.
    pub fn push_var(name: impl Into<String>, var: impl Into<String>) -> Self {
        Instruction::Op { name: name.into(), operand: Some(Operand::Var(var.into())) }
    }

    pub fn call(name: impl Into<String>) -> Self {
        Instruction::Call { name: name.into() }
    }

    pub fn var_def(name: impl Into<String>) -> Self {
        Instruction::VarDef { name: name.into() }
    }
}

/// Function definition as written: `name(in, out):` plus indented body lines.
///
/// Argument counts are kept exactly as parsed; range checks happen during
/// semantic validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub in_args: usize,
    pub out_args: usize,
    pub body: Vec<Instruction>,
}

/// Top-level program items, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "body", rename_all = "snake_case")]
pub enum Item {
    /// A run of consecutive top-level instructions.
    Block(Vec<Instruction>),
    Function(FunctionDef),
}

/// Entire source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Program {
    pub items: Vec<Item>,
}
