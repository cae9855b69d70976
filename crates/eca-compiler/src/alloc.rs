//! Allocation planning: turns instructions into layout units.
//!
//! A unit is either a run of bytes that is final as soon as it is planned,
//! or a deferred unit whose bytes depend on addresses only known after
//! layout. Consecutive fixed bytes are coalesced into one run; a run never
//! spans a deferred unit, so source order is preserved exactly.

use std::fmt;

use eca_bytecode::OpcodeCatalog;
use eca_syntax::ast::{Instruction, Operand};
use log::debug;

use crate::error::{CompileError, Result};
use crate::program::{Function, Program};
use crate::validate::check_op;

/// A name that owns a position in the output.
///
/// Functions and variables have separate namespaces, so a function and a
/// variable may share a name without sharing a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Symbol {
    Function(String),
    Variable(String),
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Function(name) => write!(f, "{}()", name),
            Symbol::Variable(name) => write!(f, "#{}", name),
        }
    }
}

/// Operand widths chosen for the two address pushes of a call stub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressWidths {
    /// Width of the return-address push.
    pub ret: usize,
    /// Width of the destination push.
    pub dest: usize,
}

impl AddressWidths {
    pub const MIN: AddressWidths = AddressWidths { ret: 1, dest: 1 };
}

impl Default for AddressWidths {
    fn default() -> Self {
        Self::MIN
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocUnit {
    /// Bytes final at planning time.
    Fixed(Vec<u8>),
    /// `PUSH ret, SWAPn..SWAP1, PUSH dest, JUMP, JUMPDEST`.
    CallStub { target: String, arg_count: u8 },
    /// Push of a variable's address with the operand width its opcode fixes.
    VarPush { opcode: u8, opcode_name: String, var: String, width: usize },
    /// Single destination-marker byte owned by a function entry or a variable.
    JumpMarker { owner: Symbol },
}

impl AllocUnit {
    /// Whether the unit's bytes wait on layout.
    pub fn is_deferred(&self) -> bool {
        !matches!(self, AllocUnit::Fixed(_))
    }

    /// Size under the given call-stub widths; only call stubs depend on them.
    pub fn size(&self, widths: AddressWidths) -> u64 {
        match self {
            AllocUnit::Fixed(bytes) => bytes.len() as u64,
            AllocUnit::CallStub { arg_count, .. } => call_stub_size(*arg_count, widths),
            AllocUnit::VarPush { width, .. } => 1 + *width as u64,
            AllocUnit::JumpMarker { .. } => 1,
        }
    }
}

/// Byte length of a call stub; the return address is `start + size - 1`.
pub fn call_stub_size(arg_count: u8, widths: AddressWidths) -> u64 {
    (1 + widths.ret as u64) + arg_count as u64 + (1 + widths.dest as u64) + 1 + 1
}

impl fmt::Display for AllocUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocUnit::Fixed(bytes) => {
                write!(f, "ops     ")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            AllocUnit::CallStub { target, arg_count } => {
                write!(f, "call    {}() with {} arg{}", target, arg_count, if *arg_count == 1 { "" } else { "s" })
            }
            AllocUnit::VarPush { opcode_name, var, .. } => write!(f, "push    {} @{}", opcode_name, var),
            AllocUnit::JumpMarker { owner } => write!(f, "dest    {}", owner),
        }
    }
}

struct Planner<'a> {
    program: &'a Program,
    catalog: &'a OpcodeCatalog,
    units: Vec<AllocUnit>,
}

impl<'a> Planner<'a> {
    fn emit_fixed(&mut self, bytes: &[u8]) {
        if let Some(AllocUnit::Fixed(run)) = self.units.last_mut() {
            run.extend_from_slice(bytes);
        } else {
            self.units.push(AllocUnit::Fixed(bytes.to_vec()));
        }
    }

    fn opcode(&self, name: &str) -> Result<u8> {
        self.catalog.get(name).ok_or_else(|| CompileError::UnknownOpcode(name.to_string()))
    }

    fn push_marker(&mut self, owner: Symbol) -> Result<()> {
        self.opcode("JUMPDEST")?;
        self.units.push(AllocUnit::JumpMarker { owner });
        Ok(())
    }

    fn plan_instruction(&mut self, inst: &Instruction) -> Result<()> {
        match inst {
            Instruction::Call { name } => {
                let target = self
                    .program
                    .function(name)
                    .ok_or_else(|| CompileError::UndefinedFunction(name.clone()))?;
                // address pushes are checked once their widths are known
                for depth in 1..=target.in_args {
                    self.opcode(&format!("SWAP{}", depth))?;
                }
                self.opcode("JUMP")?;
                self.opcode("JUMPDEST")?;
                self.units.push(AllocUnit::CallStub { target: name.clone(), arg_count: target.in_args });
            }
            Instruction::VarDef { name } => self.push_marker(Symbol::Variable(name.clone()))?,
            Instruction::Op { name, operand: Some(Operand::Var(var)) } => {
                let opcode = self.opcode(name)?;
                let width = self
                    .catalog
                    .push_width(name)
                    .ok_or_else(|| CompileError::UnexpectedOperand(name.clone()))?;
                self.units.push(AllocUnit::VarPush {
                    opcode,
                    opcode_name: name.clone(),
                    var: var.clone(),
                    width,
                });
            }
            Instruction::Op { name, operand } => {
                check_op(name, operand.as_ref(), self.catalog)?;
                let opcode = self.opcode(name)?;
                match operand {
                    Some(Operand::Literal(bytes)) => {
                        let mut encoded = Vec::with_capacity(1 + bytes.len());
                        encoded.push(opcode);
                        encoded.extend_from_slice(bytes);
                        self.emit_fixed(&encoded);
                    }
                    _ => self.emit_fixed(&[opcode]),
                }
            }
        }
        Ok(())
    }

    fn plan_function(&mut self, function: &Function) -> Result<()> {
        self.push_marker(Symbol::Function(function.name.clone()))?;
        for inst in &function.body {
            self.plan_instruction(inst)?;
        }
        // return: bring the return address above the results, then jump to it
        if function.out_args > 0 {
            let swap = self.opcode(&format!("SWAP{}", function.out_args))?;
            self.emit_fixed(&[swap]);
        }
        let jump = self.opcode("JUMP")?;
        self.emit_fixed(&[jump]);
        Ok(())
    }
}

/// Lays out main code first, then every called function in definition order.
pub fn plan(program: &Program, catalog: &OpcodeCatalog) -> Result<Vec<AllocUnit>> {
    let mut planner = Planner { program, catalog, units: Vec::new() };
    for inst in &program.main_code {
        planner.plan_instruction(inst)?;
    }
    for function in program.used_functions() {
        planner.plan_function(function)?;
    }
    let deferred = planner.units.iter().filter(|u| u.is_deferred()).count();
    debug!("planned {} units ({} deferred)", planner.units.len(), deferred);
    Ok(planner.units)
}
