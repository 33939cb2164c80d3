//! Canonical data model.
//!
//! Every parser produces these records and the store persists them. It provides:
//! 1. **Instructions:** [`Instruction`] with its owned [`Operand`] list and optional [`Encoding`].
//! 2. **Metadata:** [`Architecture`], [`Register`], and [`AddressingMode`] collected in an [`ArchMetadata`] arena.
//! 3. **Audit:** [`ImportRun`] rows appended once per import attempt.

/// Instruction, operand, and encoding records.
pub mod instruction;
/// Architecture, register forest, and addressing-mode records.
pub mod metadata;
/// Import audit records.
pub mod import_run;

pub use import_run::ImportRun;
pub use instruction::{Access, Encoding, Instruction, Operand, OperandType, Visibility};
pub use metadata::{
    AddressingMode, AddressingModeRecord, ArchIndex, ArchMetadata, Architecture,
    ArchitectureRecord, Endianness, Register, RegisterIndex, RegisterRecord,
};

/// Architecture key for the 32-bit x86 family member.
pub const ISA_X86_32: &str = "x86_32";
/// Architecture key for the 64-bit x86 family member.
pub const ISA_X86_64: &str = "x86_64";
/// Architecture key for AArch64.
pub const ISA_AARCH64: &str = "aarch64";
