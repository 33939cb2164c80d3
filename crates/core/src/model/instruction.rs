//! Instruction records.
//!
//! An [`Instruction`] is one architectural mnemonic variant. It owns its operands and at most
//! one encoding, and it is only ever replaced whole on re-import.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{IsaError, Result};

/// One architectural mnemonic variant.
///
/// `(isa, mnemonic, variant)` is the natural key; `variant = None` is a single distinct key value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Architecture key (`x86_32`, `x86_64`, `aarch64`).
    pub isa: String,
    /// Upper-case mnemonic.
    pub mnemonic: String,
    /// Disambiguator between forms sharing a mnemonic.
    pub variant: Option<String>,
    /// Functional category (vendor tag).
    pub category: String,
    /// ISA extension tag.
    pub extension: String,
    /// Instruction-set tag used for CPUID mapping.
    pub isa_set: String,
    /// Human-readable description; never empty after classification.
    pub description: String,
    /// Assembly syntax template.
    pub syntax: String,
    /// Ordered operand list.
    pub operands: Vec<Operand>,
    /// Binary encoding, when the vendor supplied a pattern.
    pub encoding: Option<Encoding>,
    /// Affected flag names in first-appearance order.
    pub flags_affected: Vec<String>,
    /// CPUID feature names gating the instruction.
    pub cpuid_features: Vec<String>,
    /// Required privilege level.
    pub cpl: Option<u8>,
    /// Vendor attribute tags.
    pub attributes: Vec<String>,
    /// Version that introduced the instruction.
    pub added_version: Option<String>,
    /// Whether the instruction is deprecated.
    pub deprecated: bool,
}

impl Instruction {
    /// Creates a record with the given key fields and empty payload.
    pub fn new(isa: impl Into<String>, mnemonic: impl Into<String>) -> Self {
        Self {
            isa: isa.into(),
            mnemonic: mnemonic.into(),
            variant: None,
            category: String::new(),
            extension: String::new(),
            isa_set: String::new(),
            description: String::new(),
            syntax: String::new(),
            operands: Vec::new(),
            encoding: None,
            flags_affected: Vec::new(),
            cpuid_features: Vec::new(),
            cpl: None,
            attributes: Vec::new(),
            added_version: None,
            deprecated: false,
        }
    }

    /// Checks the fields every persisted record must carry.
    ///
    /// # Returns
    ///
    /// `Err(IsaError::Validation)` naming the first empty field among
    /// `isa`, `mnemonic`, `category`, and `extension`.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("isa", &self.isa),
            ("mnemonic", &self.mnemonic),
            ("category", &self.category),
            ("extension", &self.extension),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some(&(missing, _)) => Err(IsaError::Validation {
                mnemonic: self.mnemonic.clone(),
                missing,
            }),
            None => Ok(()),
        }
    }

    /// Returns the variant as stored in the uniqueness key (`""` for `None`).
    ///
    /// `Some("")` and `None` share this key and name the same row.
    pub fn variant_key(&self) -> &str {
        self.variant.as_deref().unwrap_or_default()
    }
}

/// One operand of an instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    /// Vendor operand name (e.g. `REG0`, `MEM0`).
    pub name: String,
    /// Canonical operand type.
    #[serde(rename = "type")]
    pub operand_type: OperandType,
    /// Access mode.
    pub access: Access,
    /// Vendor size code.
    pub size: Option<String>,
    /// Whether the operand appears in assembly syntax.
    pub visibility: Visibility,
}

/// Canonical operand type.
///
/// Unmapped vendor types are kept lower-cased in [`OperandType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperandType {
    /// Register operand.
    Register,
    /// Memory operand (including address generation).
    Memory,
    /// Immediate operand.
    Immediate,
    /// Type could not be determined.
    Unknown,
    /// Free-form vendor type.
    Other(String),
}

impl OperandType {
    /// Canonical string form.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Register => "register",
            Self::Memory => "memory",
            Self::Immediate => "immediate",
            Self::Unknown => "unknown",
            Self::Other(raw) => raw,
        }
    }

    /// Short form used when rendering assembly syntax (`reg`, `mem`, `imm`).
    pub fn syntax_token(&self) -> &str {
        match self {
            Self::Register => "reg",
            Self::Memory => "mem",
            Self::Immediate => "imm",
            other => other.as_str(),
        }
    }
}

impl From<String> for OperandType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "register" => Self::Register,
            "memory" => Self::Memory,
            "immediate" => Self::Immediate,
            "unknown" | "" => Self::Unknown,
            _ => Self::Other(value),
        }
    }
}

impl From<OperandType> for String {
    fn from(value: OperandType) -> Self {
        match value {
            OperandType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for OperandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operand access mode.
///
/// Conditional and vendor-specific modes (`cr`, `cw`, `crw`) pass through in [`Access::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Access {
    /// Read.
    Read,
    /// Write.
    Write,
    /// Read and write.
    ReadWrite,
    /// Vendor-specific access code.
    Other(String),
}

impl Access {
    /// Vendor string form (`r`, `w`, `rw`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Read => "r",
            Self::Write => "w",
            Self::ReadWrite => "rw",
            Self::Other(raw) => raw,
        }
    }
}

impl From<&str> for Access {
    fn from(value: &str) -> Self {
        match value {
            "r" => Self::Read,
            "w" => Self::Write,
            "rw" => Self::ReadWrite,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for Access {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Access> for String {
    fn from(value: Access) -> Self {
        match value {
            Access::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

/// Operand visibility in assembly syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    /// Written in the assembly syntax.
    #[default]
    Explicit,
    /// Fixed by the instruction, not written.
    Implicit,
    /// Present in the encoding but hidden from syntax.
    Suppressed,
}

/// Binary encoding summary.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Encoding {
    /// Raw vendor pattern, kept verbatim.
    pub pattern: String,
    /// Space-joined `0xHH` opcode bytes in order of appearance.
    pub opcode: Option<String>,
    /// ModR/M byte present.
    pub modrm: bool,
    /// SIB byte present.
    pub sib: bool,
    /// Displacement present.
    pub displacement: bool,
    /// Immediate present.
    pub immediate: bool,
}

impl Encoding {
    /// Creates an encoding carrying only the raw pattern.
    pub fn from_pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Self::default()
        }
    }
}
