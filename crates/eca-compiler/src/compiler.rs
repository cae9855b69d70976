//! Compilation driver: validate, plan, resolve, emit.

use eca_bytecode::{Bytecode, OpcodeCatalog};
use eca_syntax::ast;
use log::debug;

use crate::alloc::{plan, AllocUnit, Symbol};
use crate::emit::emit;
use crate::error::{Result, Warning};
use crate::layout::{resolve, Layout, ResolveLimits};
use crate::program::Program;
use crate::validate::validate;

/// Everything a successful compile produces.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub bytecode: Bytecode,
    /// The validated program with entry and variable offsets filled in.
    pub program: Program,
    pub units: Vec<AllocUnit>,
    pub layout: Layout,
    pub warnings: Vec<Warning>,
}

pub struct Compiler<'a> {
    catalog: &'a OpcodeCatalog,
    limits: ResolveLimits,
}

impl<'a> Compiler<'a> {
    pub fn new(catalog: &'a OpcodeCatalog) -> Self {
        Self { catalog, limits: ResolveLimits::default() }
    }

    pub fn with_limits(mut self, limits: ResolveLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn compile(&self, source: ast::Program) -> Result<Artifact> {
        let validated = validate(source, self.catalog)?;
        let mut program = validated.program;
        let mut warnings = validated.warnings;

        let units = plan(&program, self.catalog)?;
        let layout = resolve(&units, &self.limits)?;
        let emitted = emit(&units, &layout, self.catalog)?;
        warnings.extend(emitted.warnings);

        for (symbol, &offset) in &layout.symbols {
            match symbol {
                Symbol::Function(name) => {
                    if let Some(f) = program.function_mut(name) {
                        f.entry_offset = Some(offset);
                    }
                }
                Symbol::Variable(name) => {
                    if let Some(v) = program.variable_mut(name) {
                        v.offset = Some(offset);
                    }
                }
            }
        }

        debug!("compiled {} bytes in {} resolution passes", emitted.bytecode.len(), layout.passes);
        Ok(Artifact { bytecode: emitted.bytecode, program, units, layout, warnings })
    }
}

/// Compiles `source` with default resolution limits.
pub fn compile(source: ast::Program, catalog: &OpcodeCatalog) -> Result<Artifact> {
    Compiler::new(catalog).compile(source)
}
