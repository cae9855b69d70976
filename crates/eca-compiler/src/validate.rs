//! Semantic validation: name binding, argument limits and literal shapes.

use std::collections::BTreeSet;

use eca_bytecode::OpcodeCatalog;
use eca_syntax::ast::{self, FunctionDef, Instruction, Item, Operand};
use log::debug;

use crate::error::{CompileError, Result, Warning};
use crate::program::{Function, Program, Variable};

/// Largest argument or return count a function may declare.
pub const MAX_FUNCTION_ARGS: usize = 16;

/// A checked program plus the warnings raised while checking it.
#[derive(Debug, Clone)]
pub struct Validated {
    pub program: Program,
    pub warnings: Vec<Warning>,
}

#[derive(Default)]
struct References {
    variables: BTreeSet<String>,
    calls: BTreeSet<String>,
}

impl References {
    /// Records what `body` reads and registers the variables it defines.
    fn scan(&mut self, body: &[Instruction], program: &mut Program) -> Result<()> {
        for inst in body {
            match inst {
                Instruction::Op { operand: Some(Operand::Var(var)), .. } => {
                    self.variables.insert(var.clone());
                }
                Instruction::Op { .. } => {}
                Instruction::Call { name } => {
                    self.calls.insert(name.clone());
                }
                Instruction::VarDef { name } => {
                    if program.var_indices.contains_key(name) {
                        return Err(CompileError::DuplicateDefinition(name.clone()));
                    }
                    program.var_indices.insert(name.clone(), program.variables.len());
                    program.variables.push(Variable { name: name.clone(), offset: None, is_unused: false });
                }
            }
        }
        Ok(())
    }
}

/// Checks `source` against `catalog` and builds the program model.
pub fn validate(source: ast::Program, catalog: &OpcodeCatalog) -> Result<Validated> {
    let mut program = Program::default();
    let mut refs = References::default();
    let mut defs: Vec<FunctionDef> = Vec::new();

    for item in source.items {
        match item {
            Item::Block(body) => {
                refs.scan(&body, &mut program)?;
                program.main_code.extend(body);
            }
            Item::Function(def) => {
                if program.func_indices.contains_key(&def.name) {
                    return Err(CompileError::DuplicateDefinition(def.name));
                }
                program.func_indices.insert(def.name.clone(), defs.len());
                refs.scan(&def.body, &mut program)?;
                defs.push(def);
            }
        }
    }

    if let Some(var) = refs.variables.iter().find(|v| !program.var_indices.contains_key(*v)) {
        return Err(CompileError::UndefinedVariable(var.clone()));
    }
    if let Some(func) = refs.calls.iter().find(|f| !program.func_indices.contains_key(*f)) {
        return Err(CompileError::UndefinedFunction(func.clone()));
    }

    let mut warnings = Vec::new();
    let mut unused_vars = Vec::new();
    for var in program.variables.iter_mut() {
        if !refs.variables.contains(&var.name) {
            var.is_unused = true;
            unused_vars.push(var.name.clone());
        }
    }
    if !unused_vars.is_empty() {
        unused_vars.sort();
        warnings.push(Warning::UnusedVariables(unused_vars));
    }

    for def in defs {
        let function = check_function(def, &refs)?;
        program.functions.push(function);
    }
    let mut unused_funcs: Vec<String> =
        program.functions.iter().filter(|f| f.is_unused).map(|f| f.name.clone()).collect();
    if !unused_funcs.is_empty() {
        unused_funcs.sort();
        warnings.push(Warning::UnusedFunctions(unused_funcs));
    }

    let bodies = program.functions.iter().map(|f| f.body.as_slice());
    for inst in std::iter::once(program.main_code.as_slice()).chain(bodies).flatten() {
        if let Instruction::Op { name, operand } = inst {
            check_op(name, operand.as_ref(), catalog)?;
        }
    }

    debug!(
        "validated {} main instructions, {} functions, {} variables",
        program.main_code.len(),
        program.functions.len(),
        program.variables.len()
    );
    Ok(Validated { program, warnings })
}

fn check_function(def: FunctionDef, refs: &References) -> Result<Function> {
    let arg_count = |count: usize| {
        u8::try_from(count)
            .ok()
            .filter(|&c| (c as usize) <= MAX_FUNCTION_ARGS)
            .ok_or_else(|| CompileError::TooManyArgs(def.name.clone(), count))
    };
    let in_args = arg_count(def.in_args)?;
    let out_args = arg_count(def.out_args)?;

    let reads_variable = def.body.iter().any(|inst| {
        matches!(
            inst,
            Instruction::Op { operand: Some(Operand::Var(_)), .. } | Instruction::VarDef { .. }
        )
    });
    if reads_variable {
        return Err(CompileError::IllegalVariableUse(def.name));
    }

    let is_unused = !refs.calls.contains(&def.name);
    Ok(Function { name: def.name, in_args, out_args, body: def.body, entry_offset: None, is_unused })
}

/// Checks that an opcode exists and that its operand matches its push width.
pub fn check_op(name: &str, operand: Option<&Operand>, catalog: &OpcodeCatalog) -> Result<()> {
    if !catalog.contains(name) {
        return Err(CompileError::UnknownOpcode(name.to_string()));
    }
    match (catalog.push_width(name), operand) {
        (Some(expected), Some(Operand::Literal(bytes))) if bytes.len() != expected => {
            Err(CompileError::LiteralSizeMismatch { expected, actual: bytes.len() })
        }
        (Some(expected), None) => Err(CompileError::LiteralSizeMismatch { expected, actual: 0 }),
        (None, Some(_)) => Err(CompileError::UnexpectedOperand(name.to_string())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(src: &str) -> Result<Validated> {
        let ast = eca_parser::parse(src).expect("Parsing should succeed");
        validate(ast, &OpcodeCatalog::standard())
    }

    fn expect_err(src: &str) -> CompileError {
        match check(src) {
            Ok(v) => panic!("Expected error, program validated: {:?}", v.program),
            Err(e) => e,
        }
    }

    #[test]
    fn test_main_code_concatenates_blocks() {
        let v = check("PUSH1 0x01\nf(0, 0):\n  STOP\nf() POP\n").unwrap();
        assert_eq!(
            v.program.main_code,
            vec![Instruction::push("PUSH1", vec![1]), Instruction::call("f"), Instruction::op("POP")]
        );
        assert!(v.warnings.is_empty());
    }

    #[test]
    fn test_duplicate_variable() {
        assert_eq!(expect_err("#a #a"), CompileError::DuplicateDefinition("a".into()));
    }

    #[test]
    fn test_duplicate_function() {
        let e = expect_err("f(0, 0):\n  STOP\nf(1, 0):\n  POP\n");
        assert_eq!(e, CompileError::DuplicateDefinition("f".into()));
    }

    #[test]
    fn test_function_and_variable_may_share_a_name() {
        let v = check("#x PUSH1 @x x()\nx(0, 0):\n  STOP\n").unwrap();
        assert!(v.program.variable("x").is_some());
        assert!(v.program.function("x").is_some());
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(expect_err("PUSH2 @X"), CompileError::UndefinedVariable("X".into()));
    }

    #[test]
    fn test_undefined_function() {
        assert_eq!(expect_err("missing()"), CompileError::UndefinedFunction("missing".into()));
    }

    #[test]
    fn test_unused_symbols_are_flagged_not_removed() {
        let v = check("#b #a STOP\nhelper(0, 0):\n  STOP\n").unwrap();
        assert_eq!(
            v.warnings,
            vec![
                Warning::UnusedVariables(vec!["a".into(), "b".into()]),
                Warning::UnusedFunctions(vec!["helper".into()]),
            ]
        );
        assert_eq!(v.program.variables().len(), 2);
        assert!(v.program.variables().iter().all(|var| var.is_unused));
        assert!(v.program.function("helper").unwrap().is_unused);
    }

    #[test]
    fn test_too_many_args() {
        assert_eq!(
            expect_err("f(17, 0):\n  STOP\n"),
            CompileError::TooManyArgs("f".into(), 17)
        );
        assert_eq!(
            expect_err("g(0, 300):\n  STOP\n"),
            CompileError::TooManyArgs("g".into(), 300)
        );
    }

    #[test]
    fn test_sixteen_args_is_allowed() {
        let v = check("f()\nf(16, 16):\n  STOP\n").unwrap();
        let f = v.program.function("f").unwrap();
        assert_eq!((f.in_args, f.out_args), (16, 16));
    }

    #[test]
    fn test_variable_push_inside_function() {
        let e = expect_err("#v\nf(0, 0):\n  PUSH1 @v\n");
        assert_eq!(e, CompileError::IllegalVariableUse("f".into()));
    }

    #[test]
    fn test_variable_def_inside_function_ast() {
        let ast = ast::Program {
            items: vec![ast::Item::Function(FunctionDef {
                name: "f".into(),
                in_args: 0,
                out_args: 0,
                body: vec![Instruction::var_def("v")],
            })],
        };
        let e = validate(ast, &OpcodeCatalog::standard()).unwrap_err();
        assert_eq!(e, CompileError::IllegalVariableUse("f".into()));
    }

    #[test]
    fn test_literal_size_mismatch() {
        assert_eq!(
            expect_err("PUSH2 0x01"),
            CompileError::LiteralSizeMismatch { expected: 2, actual: 1 }
        );
        assert_eq!(
            expect_err("f()\nf(0, 0):\n  PUSH1 0x0102\n"),
            CompileError::LiteralSizeMismatch { expected: 1, actual: 2 }
        );
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(expect_err("FROB"), CompileError::UnknownOpcode("FROB".into()));
    }

    #[test]
    fn test_operand_on_plain_opcode() {
        let op = Operand::Literal(vec![1]);
        let e = check_op("ADD", Some(&op), &OpcodeCatalog::standard()).unwrap_err();
        assert_eq!(e, CompileError::UnexpectedOperand("ADD".into()));
    }

    #[test]
    fn test_push_without_operand() {
        let e = check_op("PUSH4", None, &OpcodeCatalog::standard()).unwrap_err();
        assert_eq!(e, CompileError::LiteralSizeMismatch { expected: 4, actual: 0 });
    }
}
