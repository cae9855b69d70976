//! Validated program model.
//!
//! Built once by the validator from the source AST. After layout the
//! compiler fills in resolved offsets; nothing else changes.

use std::collections::HashMap;

use eca_syntax::ast::Instruction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub in_args: u8,
    pub out_args: u8,
    /// Only `Op` (with constant operands) and `Call` instructions.
    pub body: Vec<Instruction>,
    pub entry_offset: Option<u64>,
    pub is_unused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    /// Offset of the variable's jump marker byte.
    pub offset: Option<u64>,
    pub is_unused: bool,
}

/// A compiled unit: functions and variables in definition order plus the
/// concatenated top-level code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub(crate) functions: Vec<Function>,
    pub(crate) func_indices: HashMap<String, usize>,
    pub(crate) variables: Vec<Variable>,
    pub(crate) var_indices: HashMap<String, usize>,
    pub main_code: Vec<Instruction>,
}

impl Program {
    /// Functions in definition order.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Variables in definition order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.func_indices.get(name).map(|&i| &self.functions[i])
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.var_indices.get(name).map(|&i| &self.variables[i])
    }

    pub(crate) fn function_mut(&mut self, name: &str) -> Option<&mut Function> {
        let i = *self.func_indices.get(name)?;
        self.functions.get_mut(i)
    }

    pub(crate) fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        let i = *self.var_indices.get(name)?;
        self.variables.get_mut(i)
    }

    /// Called functions, in the order their bodies are laid out.
    pub fn used_functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter().filter(|f| !f.is_unused)
    }
}
