//! Opcode catalog and bytecode container for ECA.
//!
//! This crate defines the validated mnemonic table the compiler encodes
//! against and the byte container it produces.

pub mod bytecode;
pub mod catalog;

pub use bytecode::Bytecode;
pub use catalog::{push_width_of, CatalogError, OpcodeCatalog, MAX_SWAP_DEPTH};
