//! Opcode catalog: the mnemonic → byte table the compiler encodes against.
//!
//! A catalog is built once, validated, and then passed by reference to every
//! compilation stage. Validation only guarantees that every `PUSHn` value
//! encodes its own operand width in its low five bits. Opcodes the code
//! generator emits on its own (`PUSHn`, `SWAPn`, `JUMP`, `JUMPDEST`) may be
//! absent; the compiler reports them when a program actually needs them.

use std::collections::BTreeMap;
use std::fmt;

use eca_syntax::{push_suffix, MAX_PUSH_WIDTH};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use thiserror::Error;

/// Deepest stack slot a `SWAPn` opcode reaches.
pub const MAX_SWAP_DEPTH: usize = 16;

/// Errors raised while loading or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid opcode catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("opcode '{name}' has invalid value '{value}' (expected a byte)")]
    InvalidValue { name: String, value: String },

    #[error("opcode '{0}' is defined more than once")]
    Duplicate(String),

    #[error("'{0}' is not a valid push mnemonic (expected PUSH1..PUSH32)")]
    UnexpectedPush(String),

    #[error("'{name}' = 0x{value:02x} does not encode a {width}-byte operand")]
    InconsistentPush { name: String, value: u8, width: usize },
}

/// JSON catalogs may spell a value as `"0x60"`, `"60"` or `96`.
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonValue {
    Int(u64),
    Hex(String),
}

impl JsonValue {
    fn to_byte(&self, name: &str) -> Result<u8, CatalogError> {
        let invalid = |value: String| CatalogError::InvalidValue { name: name.to_string(), value };
        match self {
            JsonValue::Int(n) => u8::try_from(*n).map_err(|_| invalid(n.to_string())),
            JsonValue::Hex(s) => {
                let digits = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                u8::from_str_radix(digits, 16).map_err(|_| invalid(s.clone()))
            }
        }
    }
}

/// JSON object entries in document order, repeated keys included.
struct JsonEntries(Vec<(String, JsonValue)>);

impl<'de> Deserialize<'de> for JsonEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = JsonEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping opcode names to byte values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<JsonEntries, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, JsonValue>()? {
                    entries.push(entry);
                }
                Ok(JsonEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Immutable, validated opcode table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeCatalog {
    opcodes: BTreeMap<String, u8>,
}

const STANDARD_OPCODES: &[(&str, u8)] = &[
    ("STOP", 0x00),
    ("ADD", 0x01),
    ("MUL", 0x02),
    ("SUB", 0x03),
    ("DIV", 0x04),
    ("SDIV", 0x05),
    ("MOD", 0x06),
    ("SMOD", 0x07),
    ("ADDMOD", 0x08),
    ("MULMOD", 0x09),
    ("EXP", 0x0a),
    ("SIGNEXTEND", 0x0b),
    ("LT", 0x10),
    ("GT", 0x11),
    ("SLT", 0x12),
    ("SGT", 0x13),
    ("EQ", 0x14),
    ("ISZERO", 0x15),
    ("AND", 0x16),
    ("OR", 0x17),
    ("XOR", 0x18),
    ("NOT", 0x19),
    ("BYTE", 0x1a),
    ("SHL", 0x1b),
    ("SHR", 0x1c),
    ("SAR", 0x1d),
    ("SHA3", 0x20),
    ("ADDRESS", 0x30),
    ("BALANCE", 0x31),
    ("ORIGIN", 0x32),
    ("CALLER", 0x33),
    ("CALLVALUE", 0x34),
    ("CALLDATALOAD", 0x35),
    ("CALLDATASIZE", 0x36),
    ("CALLDATACOPY", 0x37),
    ("CODESIZE", 0x38),
    ("CODECOPY", 0x39),
    ("GASPRICE", 0x3a),
    ("EXTCODESIZE", 0x3b),
    ("EXTCODECOPY", 0x3c),
    ("RETURNDATASIZE", 0x3d),
    ("RETURNDATACOPY", 0x3e),
    ("EXTCODEHASH", 0x3f),
    ("BLOCKHASH", 0x40),
    ("COINBASE", 0x41),
    ("TIMESTAMP", 0x42),
    ("NUMBER", 0x43),
    ("DIFFICULTY", 0x44),
    ("GASLIMIT", 0x45),
    ("CHAINID", 0x46),
    ("SELFBALANCE", 0x47),
    ("BASEFEE", 0x48),
    ("POP", 0x50),
    ("MLOAD", 0x51),
    ("MSTORE", 0x52),
    ("MSTORE8", 0x53),
    ("SLOAD", 0x54),
    ("SSTORE", 0x55),
    ("JUMP", 0x56),
    ("JUMPI", 0x57),
    ("PC", 0x58),
    ("MSIZE", 0x59),
    ("GAS", 0x5a),
    ("JUMPDEST", 0x5b),
    ("CREATE", 0xf0),
    ("CALL", 0xf1),
    ("CALLCODE", 0xf2),
    ("RETURN", 0xf3),
    ("DELEGATECALL", 0xf4),
    ("CREATE2", 0xf5),
    ("STATICCALL", 0xfa),
    ("REVERT", 0xfd),
    ("INVALID", 0xfe),
    ("SELFDESTRUCT", 0xff),
];

impl OpcodeCatalog {
    /// The built-in Ethereum table (pre-Shanghai, so without `PUSH0`).
    pub fn standard() -> Self {
        let mut opcodes: BTreeMap<String, u8> = STANDARD_OPCODES
            .iter()
            .map(|&(name, value)| (name.to_string(), value))
            .collect();
        for i in 0..MAX_PUSH_WIDTH as u8 {
            opcodes.insert(format!("PUSH{}", i + 1), 0x60 + i);
        }
        for i in 0..MAX_SWAP_DEPTH as u8 {
            opcodes.insert(format!("DUP{}", i + 1), 0x80 + i);
            opcodes.insert(format!("SWAP{}", i + 1), 0x90 + i);
        }
        for i in 0..=4u8 {
            opcodes.insert(format!("LOG{}", i), 0xa0 + i);
        }
        Self { opcodes }
    }

    /// Builds and validates a catalog from `(name, value)` pairs.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: Into<String>,
    {
        let mut opcodes = BTreeMap::new();
        for (name, value) in entries {
            let name = name.into();
            if opcodes.contains_key(&name) {
                return Err(CatalogError::Duplicate(name));
            }
            opcodes.insert(name, value);
        }
        Self::validate(opcodes)
    }

    /// Parses a JSON object mapping mnemonic to byte value. A name given
    /// twice is rejected like in [`OpcodeCatalog::from_entries`].
    ///
    /// ```rust
    /// use eca_bytecode::OpcodeCatalog;
    ///
    /// let catalog = OpcodeCatalog::from_json(r#"{"PUSH1": "0x60", "PUSH2": 97, "ADD": "01"}"#).unwrap();
    /// assert_eq!(catalog.get("PUSH2"), Some(0x61));
    /// assert_eq!(catalog.push(1), Some(0x60));
    /// assert_eq!(catalog.jumpdest(), None);
    /// ```
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let JsonEntries(raw) = serde_json::from_str(text)?;
        let mut entries = Vec::with_capacity(raw.len());
        for (name, value) in raw {
            let byte = value.to_byte(&name)?;
            entries.push((name, byte));
        }
        Self::from_entries(entries)
    }

    fn validate(opcodes: BTreeMap<String, u8>) -> Result<Self, CatalogError> {
        for (name, &value) in &opcodes {
            match push_suffix(name) {
                Some(width) if (1..=MAX_PUSH_WIDTH).contains(&width) => {
                    if push_width_of(value) != width {
                        return Err(CatalogError::InconsistentPush { name: name.clone(), value, width });
                    }
                }
                Some(_) => return Err(CatalogError::UnexpectedPush(name.clone())),
                None if name.starts_with("PUSH") => return Err(CatalogError::UnexpectedPush(name.clone())),
                None => {}
            }
        }

        Ok(Self { opcodes })
    }

    /// Byte value of a mnemonic.
    pub fn get(&self, name: &str) -> Option<u8> {
        self.opcodes.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.opcodes.contains_key(name)
    }

    /// Operand width of a push mnemonic, read from its byte value.
    ///
    /// Returns `None` for unknown mnemonics and for non-push opcodes.
    pub fn push_width(&self, name: &str) -> Option<usize> {
        push_suffix(name)?;
        self.get(name).map(push_width_of)
    }

    /// The `PUSHn` opcode carrying a `width`-byte operand (`1..=32`), if defined.
    pub fn push(&self, width: usize) -> Option<u8> {
        if !(1..=MAX_PUSH_WIDTH).contains(&width) {
            return None;
        }
        self.get(&format!("PUSH{}", width))
    }

    /// The `SWAPn` opcode for stack depth `n` (`1..=16`), if defined.
    pub fn swap(&self, n: usize) -> Option<u8> {
        if !(1..=MAX_SWAP_DEPTH).contains(&n) {
            return None;
        }
        self.get(&format!("SWAP{}", n))
    }

    pub fn jump(&self) -> Option<u8> {
        self.get("JUMP")
    }

    /// The jump-destination marker used for every branch target.
    pub fn jumpdest(&self) -> Option<u8> {
        self.get("JUMPDEST")
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    /// Mnemonics and values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.opcodes.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl Default for OpcodeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Push operand width encoded in a push opcode's low five bits.
pub fn push_width_of(value: u8) -> usize {
    (value & 0x1f) as usize + 1
}
