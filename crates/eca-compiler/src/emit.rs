//! Byte emission from a resolved layout.

use eca_bytecode::{Bytecode, OpcodeCatalog};
use eca_syntax::MAX_PUSH_WIDTH;
use log::debug;

use crate::alloc::{AddressWidths, AllocUnit, Symbol};
use crate::error::{CompileError, Result, Warning};
use crate::layout::Layout;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub bytecode: Bytecode,
    pub warnings: Vec<Warning>,
}

/// Big-endian `value` in exactly `width` bytes: zero padded on the left, or
/// cut down to its low-order bytes. The flag reports a cut.
fn address_bytes(value: u64, width: usize) -> (Vec<u8>, bool) {
    let be = value.to_be_bytes();
    if width >= be.len() {
        let mut out = vec![0; width - be.len()];
        out.extend_from_slice(&be);
        return (out, false);
    }
    let cut = be.len() - width;
    let truncated = be[..cut].iter().any(|&b| b != 0);
    (be[cut..].to_vec(), truncated)
}

struct Emitter<'a> {
    layout: &'a Layout,
    catalog: &'a OpcodeCatalog,
    out: Vec<u8>,
    warnings: Vec<Warning>,
}

fn required(opcode: Option<u8>, name: impl FnOnce() -> String) -> Result<u8> {
    opcode.ok_or_else(|| CompileError::UnknownOpcode(name()))
}

impl<'a> Emitter<'a> {
    fn push_address(&mut self, value: u64, width: usize) -> Result<()> {
        if !(1..=MAX_PUSH_WIDTH).contains(&width) {
            return Err(CompileError::InvalidLiteralLength(width));
        }
        let op = required(self.catalog.push(width), || format!("PUSH{}", width))?;
        self.out.push(op);
        // widths here come from `byte_width`, so nothing is ever cut
        self.out.extend(address_bytes(value, width).0);
        Ok(())
    }

    fn render(&mut self, index: usize, unit: &AllocUnit) -> Result<()> {
        match unit {
            AllocUnit::Fixed(bytes) => self.out.extend_from_slice(bytes),
            AllocUnit::JumpMarker { .. } => {
                let jumpdest = required(self.catalog.jumpdest(), || "JUMPDEST".into())?;
                self.out.push(jumpdest);
            }
            AllocUnit::VarPush { opcode, var, width, .. } => {
                let address = self
                    .layout
                    .symbol(&Symbol::Variable(var.clone()))
                    .ok_or_else(|| CompileError::UndefinedVariable(var.clone()))?;
                let (bytes, truncated) = address_bytes(address, *width);
                if truncated {
                    self.warnings.push(Warning::TruncatedAddress { variable: var.clone(), address, width: *width });
                }
                self.out.push(*opcode);
                self.out.extend(bytes);
            }
            AllocUnit::CallStub { target, arg_count } => {
                let AddressWidths { ret: ret_width, dest: dest_width } = self.layout.widths[index];
                let dest = self
                    .layout
                    .symbol(&Symbol::Function(target.clone()))
                    .ok_or_else(|| CompileError::UndefinedFunction(target.clone()))?;
                let ret = self.layout.offset(index) + self.layout.unit_size(index) - 1;

                self.push_address(ret, ret_width)?;
                // sink the return address below the arguments
                for depth in (1..=*arg_count as usize).rev() {
                    let swap = required(self.catalog.swap(depth), || format!("SWAP{}", depth))?;
                    self.out.push(swap);
                }
                self.push_address(dest, dest_width)?;
                let jump = required(self.catalog.jump(), || "JUMP".into())?;
                let jumpdest = required(self.catalog.jumpdest(), || "JUMPDEST".into())?;
                self.out.push(jump);
                self.out.push(jumpdest);
            }
        }
        Ok(())
    }
}

/// Renders every unit at its resolved offset and checks the result against the layout.
pub fn emit(units: &[AllocUnit], layout: &Layout, catalog: &OpcodeCatalog) -> Result<Emitted> {
    let resolved_units = layout.widths.len();
    if resolved_units != units.len() || layout.offsets.len() != resolved_units + 1 {
        return Err(CompileError::LayoutMismatch { expected: resolved_units as u64, actual: units.len() as u64 });
    }

    let mut emitter = Emitter {
        layout,
        catalog,
        out: Vec::with_capacity(layout.total_len() as usize),
        warnings: Vec::new(),
    };

    for (index, unit) in units.iter().enumerate() {
        let start = emitter.out.len() as u64;
        emitter.render(index, unit)?;
        let actual = emitter.out.len() as u64 - start;
        let expected = layout.unit_size(index);
        if actual != expected {
            return Err(CompileError::LayoutMismatch { expected, actual });
        }
    }

    let actual = emitter.out.len() as u64;
    if actual != layout.total_len() {
        return Err(CompileError::LayoutMismatch { expected: layout.total_len(), actual });
    }

    debug!("emitted {} bytes, {} warnings", actual, emitter.warnings.len());
    Ok(Emitted { bytecode: Bytecode::new(emitter.out), warnings: emitter.warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{resolve, ResolveLimits};

    fn emit_units(units: &[AllocUnit]) -> Result<Emitted> {
        let layout = resolve(units, &ResolveLimits::default())?;
        emit(units, &layout, &OpcodeCatalog::standard())
    }

    #[test]
    fn test_address_bytes() {
        assert_eq!(address_bytes(0x12, 1), (vec![0x12], false));
        assert_eq!(address_bytes(0x12, 3), (vec![0x00, 0x00, 0x12], false));
        assert_eq!(address_bytes(0x1234, 1), (vec![0x34], true));
        let (wide, cut) = address_bytes(1, 32);
        assert_eq!(wide.len(), 32);
        assert_eq!(wide[31], 1);
        assert!(!cut);
    }

    #[test]
    fn test_call_stub_bytes() {
        let units = vec![
            AllocUnit::CallStub { target: "f".into(), arg_count: 2 },
            AllocUnit::Fixed(vec![0x00]),
            AllocUnit::JumpMarker { owner: Symbol::Function("f".into()) },
            AllocUnit::Fixed(vec![0x56]),
        ];
        let emitted = emit_units(&units).unwrap();
        assert_eq!(
            &emitted.bytecode[..],
            // PUSH1 7, SWAP2, SWAP1, PUSH1 9, JUMP, JUMPDEST, STOP, JUMPDEST, JUMP
            &[0x60, 0x07, 0x91, 0x90, 0x60, 0x09, 0x56, 0x5b, 0x00, 0x5b, 0x56]
        );
        // the return address names the landing pad right after JUMP
        assert_eq!(emitted.bytecode[7], 0x5b);
    }

    #[test]
    fn test_variable_push_pads_to_opcode_width() {
        let units = vec![
            AllocUnit::VarPush { opcode: 0x62, opcode_name: "PUSH3".into(), var: "v".into(), width: 3 },
            AllocUnit::JumpMarker { owner: Symbol::Variable("v".into()) },
        ];
        let emitted = emit_units(&units).unwrap();
        assert_eq!(&emitted.bytecode[..], &[0x62, 0x00, 0x00, 0x04, 0x5b]);
        assert!(emitted.warnings.is_empty());
    }

    #[test]
    fn test_truncated_variable_push_warns() {
        let units = vec![
            AllocUnit::Fixed(vec![0; 0x120]),
            AllocUnit::JumpMarker { owner: Symbol::Variable("far".into()) },
            AllocUnit::VarPush { opcode: 0x60, opcode_name: "PUSH1".into(), var: "far".into(), width: 1 },
        ];
        let emitted = emit_units(&units).unwrap();
        assert_eq!(&emitted.bytecode[0x121..], &[0x60, 0x20]);
        assert_eq!(
            emitted.warnings,
            vec![Warning::TruncatedAddress { variable: "far".into(), address: 0x120, width: 1 }]
        );
    }

    #[test]
    fn test_layout_of_other_units_is_rejected() {
        let short = vec![AllocUnit::Fixed(vec![0x01])];
        let layout = resolve(&short, &ResolveLimits::default()).unwrap();
        let longer = vec![AllocUnit::Fixed(vec![0x01]), AllocUnit::JumpMarker { owner: Symbol::Variable("v".into()) }];
        let err = emit(&longer, &layout, &OpcodeCatalog::standard()).unwrap_err();
        assert_eq!(err, CompileError::LayoutMismatch { expected: 1, actual: 2 });
    }

    #[test]
    fn test_missing_push_width_in_catalog() {
        let units = vec![
            AllocUnit::CallStub { target: "f".into(), arg_count: 0 },
            AllocUnit::JumpMarker { owner: Symbol::Function("f".into()) },
        ];
        let layout = resolve(&units, &ResolveLimits::default()).unwrap();
        let catalog = OpcodeCatalog::from_entries(vec![("JUMP", 0x56), ("JUMPDEST", 0x5b)]).unwrap();
        let err = emit(&units, &layout, &catalog).unwrap_err();
        assert_eq!(err, CompileError::UnknownOpcode("PUSH1".into()));
    }

    #[test]
    fn test_stale_layout_is_rejected() {
        let units = vec![AllocUnit::Fixed(vec![0x01, 0x02])];
        let mut layout = resolve(&units, &ResolveLimits::default()).unwrap();
        layout.offsets = vec![0, 3];
        let err = emit(&units, &layout, &OpcodeCatalog::standard()).unwrap_err();
        assert_eq!(err, CompileError::LayoutMismatch { expected: 3, actual: 2 });
    }
}
