//! Calling-convention and register-role tables.
//!
//! Static per-architecture data used to enrich register rows:
//! 1. **Preservation:** Callee-saved ("preserved") and caller-saved ("volatile") register names for
//!    the System V x86-64, cdecl x86-32, and AAPCS64 conventions.
//! 2. **Register types:** Vendor register class to user-facing type.
//! 3. **Purposes:** Fixed-role registers (stack pointer, link register, ...).
//!
//! Lookups are case-insensitive. An explicit per-register override always beats the table.

use serde::Serialize;

use crate::model::{ISA_AARCH64, ISA_X86_32, ISA_X86_64};

/// Calling-convention classification of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Preservation {
    /// Callee-saved: survives a call.
    Preserved,
    /// Caller-saved: may be clobbered by a call.
    Volatile,
    /// Not covered by the convention (control, debug, vector state, ...).
    Unspecified,
}

impl Preservation {
    /// String form used in query output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preserved => "preserved",
            Self::Volatile => "volatile",
            Self::Unspecified => "unspecified",
        }
    }
}

const X86_64_PRESERVED: &[&str] = &[
    "rbx", "rsp", "rbp", "r12", "r13", "r14", "r15", "ebx", "esp", "ebp", "r12d", "r13d", "r14d",
    "r15d", "bx", "sp", "bp", "r12w", "r13w", "r14w", "r15w", "bl", "bh", "spl", "bpl", "r12b",
    "r13b", "r14b", "r15b",
];

const X86_64_VOLATILE: &[&str] = &[
    "rax", "rcx", "rdx", "rsi", "rdi", "r8", "r9", "r10", "r11", "eax", "ecx", "edx", "esi", "edi",
    "r8d", "r9d", "r10d", "r11d", "ax", "cx", "dx", "si", "di", "r8w", "r9w", "r10w", "r11w", "al",
    "ah", "cl", "ch", "dl", "dh", "sil", "dil", "r8b", "r9b", "r10b", "r11b",
];

const X86_32_PRESERVED: &[&str] = &[
    "ebx", "esi", "edi", "ebp", "esp", "bx", "si", "di", "bp", "sp", "bl", "bh", "sil", "dil",
    "bpl", "spl",
];

const X86_32_VOLATILE: &[&str] = &[
    "eax", "ecx", "edx", "ax", "cx", "dx", "al", "ah", "cl", "ch", "dl", "dh",
];

const AARCH64_PRESERVED: &[&str] = &[
    "x19", "x20", "x21", "x22", "x23", "x24", "x25", "x26", "x27", "x28", "sp", "x29", "x30",
    "w19", "w20", "w21", "w22", "w23", "w24", "w25", "w26", "w27", "w28", "w29", "w30",
];

const AARCH64_VOLATILE: &[&str] = &[
    "x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7", "x8", "x9", "x10", "x11", "x12", "x13", "x14",
    "x15", "x16", "x17", "x18", "w0", "w1", "w2", "w3", "w4", "w5", "w6", "w7", "w8", "w9", "w10",
    "w11", "w12", "w13", "w14", "w15", "w16", "w17", "w18",
];

/// Vendor register class to user-facing register type.
const REGISTER_TYPES: &[(&str, &str)] = &[
    ("gpr", "general-purpose"),
    ("flags", "flags"),
    ("segment", "segment"),
    ("sr", "segment"),
    ("control", "control"),
    ("cr", "control"),
    ("debug", "debug"),
    ("dr", "debug"),
    ("mmx", "multimedia"),
    ("x87", "floating-point"),
    ("simd", "vector"),
    ("xmm", "vector"),
    ("ymm", "vector"),
    ("zmm", "vector"),
    ("gpr64", "general-purpose"),
    ("gpr32", "general-purpose"),
    ("vector", "vector"),
    ("system", "system"),
    ("integer", "general-purpose"),
    ("float", "floating-point"),
    ("csr", "control-status"),
    ("unknown", "special-purpose"),
];

/// Fixed-role registers: `(isa, name, purpose)`.
const PURPOSES: &[(&str, &str, &str)] = &[
    (ISA_X86_64, "RSP", "stack pointer"),
    (ISA_X86_64, "RBP", "frame pointer"),
    (ISA_X86_64, "RIP", "instruction pointer"),
    (ISA_X86_64, "RFLAGS", "status flags"),
    (ISA_X86_64, "RAX", "return value"),
    (ISA_X86_32, "ESP", "stack pointer"),
    (ISA_X86_32, "EBP", "frame pointer"),
    (ISA_X86_32, "EIP", "instruction pointer"),
    (ISA_X86_32, "EFLAGS", "status flags"),
    (ISA_X86_32, "EAX", "return value"),
    (ISA_AARCH64, "SP", "stack pointer"),
    (ISA_AARCH64, "X29", "frame pointer"),
    (ISA_AARCH64, "X30", "link register"),
    (ISA_AARCH64, "XZR", "zero register"),
    (ISA_AARCH64, "WZR", "zero register"),
    (ISA_AARCH64, "PC", "program counter"),
    (ISA_AARCH64, "PSTATE", "processor state"),
    (ISA_AARCH64, "X0", "return value"),
];

fn tables(isa: &str) -> (&'static [&'static str], &'static [&'static str]) {
    match isa {
        ISA_X86_64 => (X86_64_PRESERVED, X86_64_VOLATILE),
        ISA_X86_32 => (X86_32_PRESERVED, X86_32_VOLATILE),
        ISA_AARCH64 => (AARCH64_PRESERVED, AARCH64_VOLATILE),
        _ => (&[], &[]),
    }
}

fn contains(table: &[&str], name: &str) -> bool {
    table.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// Classifies a register under its architecture's calling convention.
///
/// # Arguments
///
/// * `isa` - Architecture key.
/// * `register_name` - Register name, any case.
/// * `override_preserved` - Stored per-register override; wins over the table when set.
pub fn preservation(isa: &str, register_name: &str, override_preserved: Option<bool>) -> Preservation {
    match override_preserved {
        Some(true) => return Preservation::Preserved,
        Some(false) => return Preservation::Volatile,
        None => {}
    }
    let (preserved, volatile) = tables(isa);
    if contains(preserved, register_name) {
        Preservation::Preserved
    } else if contains(volatile, register_name) {
        Preservation::Volatile
    } else {
        Preservation::Unspecified
    }
}

/// Maps a vendor register class to a user-facing type; unknown classes are `special-purpose`.
pub fn register_type(register_class: &str) -> &'static str {
    REGISTER_TYPES
        .iter()
        .find(|(class, _)| class.eq_ignore_ascii_case(register_class))
        .map_or("special-purpose", |&(_, ty)| ty)
}

/// Fixed role of a register, if it has one.
pub fn register_purpose(isa: &str, register_name: &str) -> Option<&'static str> {
    PURPOSES
        .iter()
        .find(|(arch, name, _)| *arch == isa && name.eq_ignore_ascii_case(register_name))
        .map(|&(_, _, purpose)| purpose)
}
