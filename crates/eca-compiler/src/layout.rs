//! Position resolution.
//!
//! A call stub pushes two addresses whose byte widths depend on where things
//! end up, and where things end up depends on those widths. The resolver
//! iterates: every pass lays out all units under the current widths, rebuilds
//! the symbol map from scratch and recomputes each stub's widths. Widths only
//! ever grow and are bounded by eight bytes, so the iteration terminates.

use std::collections::HashMap;

use log::{debug, trace};

use crate::alloc::{AddressWidths, AllocUnit, Symbol};
use crate::error::{CompileError, Result};

/// Widest address a push may need; offsets are `u64`.
const MAX_ADDRESS_WIDTH: u64 = 8;

/// Minimal number of bytes that can hold `value`; zero takes one byte.
pub fn byte_width(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    ((bits + 7) / 8).max(1)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveLimits {
    /// Upper bound on resolution passes; derived from the stub count if unset.
    pub max_passes: Option<usize>,
}

impl ResolveLimits {
    pub fn with_max_passes(max_passes: usize) -> Self {
        Self { max_passes: Some(max_passes) }
    }

    /// Every non-final pass grows at least one of the two widths of some
    /// stub by a byte, and each width grows at most seven times.
    pub fn max_passes_for(&self, units: &[AllocUnit]) -> usize {
        self.max_passes.unwrap_or_else(|| {
            let stubs = units.iter().filter(|u| matches!(u, AllocUnit::CallStub { .. })).count();
            2 + 2 * (MAX_ADDRESS_WIDTH as usize - 1) * stubs
        })
    }
}

/// Final positions of every unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Start offset of each unit, followed by the total length.
    pub offsets: Vec<u64>,
    /// Address widths of each unit; only meaningful for call stubs.
    pub widths: Vec<AddressWidths>,
    pub symbols: HashMap<Symbol, u64>,
    /// Passes taken to reach the fixed point.
    pub passes: usize,
}

impl Layout {
    pub fn total_len(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    pub fn offset(&self, index: usize) -> u64 {
        self.offsets[index]
    }

    pub fn unit_size(&self, index: usize) -> u64 {
        self.offsets[index + 1] - self.offsets[index]
    }

    pub fn symbol(&self, symbol: &Symbol) -> Option<u64> {
        self.symbols.get(symbol).copied()
    }
}

fn compute_offsets_into(units: &[AllocUnit], widths: &[AddressWidths], offsets: &mut Vec<u64>) {
    offsets.clear();
    let mut pos = 0u64;
    for (unit, w) in units.iter().zip(widths) {
        offsets.push(pos);
        pos += unit.size(*w);
    }
    offsets.push(pos);
}

fn collect_symbols(units: &[AllocUnit], offsets: &[u64]) -> HashMap<Symbol, u64> {
    units
        .iter()
        .zip(offsets)
        .filter_map(|(unit, &offset)| match unit {
            AllocUnit::JumpMarker { owner } => Some((owner.clone(), offset)),
            _ => None,
        })
        .collect()
}

/// Runs the fixed-point iteration over `units`.
pub fn resolve(units: &[AllocUnit], limits: &ResolveLimits) -> Result<Layout> {
    let max_passes = limits.max_passes_for(units);
    let mut widths = vec![AddressWidths::MIN; units.len()];
    let mut offsets = Vec::with_capacity(units.len() + 1);
    let mut passes = 0;

    loop {
        if passes == max_passes {
            return Err(CompileError::NonConvergent { passes });
        }
        passes += 1;

        compute_offsets_into(units, &widths, &mut offsets);
        let symbols = collect_symbols(units, &offsets);

        let mut changed = 0;
        for (i, unit) in units.iter().enumerate() {
            let AllocUnit::CallStub { target, .. } = unit else {
                continue;
            };
            let dest = symbols
                .get(&Symbol::Function(target.clone()))
                .copied()
                .ok_or_else(|| CompileError::UndefinedFunction(target.clone()))?;
            // landing pad is the stub's last byte
            let ret = offsets[i + 1] - 1;
            let current = widths[i];
            let needed = AddressWidths {
                ret: byte_width(ret).max(current.ret),
                dest: byte_width(dest).max(current.dest),
            };
            if needed != current {
                widths[i] = needed;
                changed += 1;
            }
        }

        let total = offsets[units.len()];
        trace!("resolve pass {}: {} bytes, {} stubs widened", passes, total, changed);
        if changed == 0 {
            debug!("layout converged after {} passes, {} bytes", passes, total);
            return Ok(Layout { offsets, widths, symbols, passes });
        }
    }
}
