//! x86 architecture metadata from XED datafiles.
//!
//! Builds the `x86_32` and `x86_64` architectures, their register forests, and the fixed
//! addressing-mode catalog:
//! 1. **Registers:** Parsed from `xed-regs.txt` (`name class width enclosing regid [h]`), split by
//!    mode using name and width rules, and linked to their family root via the enclosing column.
//! 2. **Machine modes:** Chosen from `xed-machine-modes-enum.txt` when present.
//! 3. **Addressing modes:** Built in; available even without a register file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::abi;
use crate::common::{IsaError, Result};
use crate::model::{
    ArchIndex, ArchMetadata, Architecture, Endianness, ISA_X86_32, ISA_X86_64, Register,
};

/// Register table file name inside the datafiles directory.
pub const REGISTER_FILE: &str = "xed-regs.txt";
/// Machine-mode enumeration file name inside the datafiles directory.
pub const MACHINE_MODES_FILE: &str = "xed-machine-modes-enum.txt";

const LEGACY_32: &str = "LEGACY_32";
const LONG_64: &str = "LONG_64";
/// Candidate machine modes in preference order; the first is the default.
const MODES_32: &[&str] = &[LEGACY_32, "LONG_COMPAT_32"];
const MODES_64: &[&str] = &[LONG_64];

const BASE_GPRS_16: &[&str] = &["AX", "BX", "CX", "DX", "SP", "BP", "SI", "DI"];
const LEGACY_GPRS_8: &[&str] = &["AL", "BL", "CL", "DL", "AH", "BH", "CH", "DH"];
const REX_GPRS_8: &[&str] = &["SPL", "BPL", "SIL", "DIL"];
const MAIN_CONTROL_DEBUG: &[&str] = &[
    "CR0", "CR2", "CR3", "CR4", "DR0", "DR1", "DR2", "DR3", "DR6", "DR7",
];

/// Addressing modes shared by both x86 widths: `(name, description, example template)`.
///
/// `{A}`, `{B}`, and `{I}` stand for the accumulator, base, and index registers.
const ADDRESSING_MODES: &[(&str, &str, &str)] = &[
    ("register_direct", "Direct register addressing", "MOV {A}, {B}"),
    ("immediate", "Immediate addressing", "MOV {A}, 42"),
    ("memory_direct", "Direct memory addressing", "MOV {A}, [0x12345678]"),
    ("register_indirect", "Register indirect addressing", "MOV {A}, [{B}]"),
    ("base_displacement", "Base plus displacement addressing", "MOV {A}, [{B}+8]"),
    ("index_scale", "Index with scale addressing", "MOV {A}, [{I}*2]"),
    ("base_index", "Base plus index addressing", "MOV {A}, [{B}+{I}]"),
    (
        "base_index_displacement",
        "Base plus index plus displacement addressing",
        "MOV {A}, [{B}+{I}+8]",
    ),
    (
        "base_index_scale_displacement",
        "Base plus scaled index plus displacement addressing",
        "MOV {A}, [{B}+{I}*2+8]",
    ),
];

/// One parsed line of the register table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterLine {
    /// Register name.
    pub name: String,
    /// Vendor register class.
    pub class: String,
    /// Width in bits (first component of `a/b` widths).
    pub width: u32,
    /// Widest enclosing register in 64-bit mode.
    pub enclosing_64: String,
    /// Widest enclosing register in 32-bit mode.
    pub enclosing_32: String,
    /// Vendor register id.
    pub encoding_id: Option<u32>,
}

/// Parses one register-table line; comments and malformed lines yield `None`.
///
/// A line is skipped when it has fewer than four fields, the class is `INVALID`, the width is
/// not an integer in `1..=512`, or the name is not an identifier starting with a letter.
pub fn parse_register_line(line: &str) -> Option<RegisterLine> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return None;
    }
    let (name, class) = (parts[0], parts[1]);
    if class == "INVALID" || !is_register_name(name) {
        return None;
    }

    let width_text = parts[2].split('/').next().unwrap_or_default();
    let width = width_text.parse::<i64>().ok().filter(|w| (1..=512).contains(w))? as u32;

    let (enclosing_64, enclosing_32) = parts[3]
        .split_once('/')
        .unwrap_or((parts[3], parts[3]));
    let encoding_id = parts
        .get(4)
        .filter(|id| id.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|id| id.parse().ok());

    Some(RegisterLine {
        name: name.to_owned(),
        class: class.to_owned(),
        width,
        enclosing_64: enclosing_64.to_owned(),
        enclosing_32: enclosing_32.to_owned(),
        encoding_id,
    })
}

fn is_register_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `EAX`-style names: a width prefix followed by one of the eight base GPR names.
fn prefixed_base_gpr(name: &str, prefix: char) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| BASE_GPRS_16.contains(&rest))
}

/// Numbered extended GPR (`R8`..`R15`) with an optional width suffix, returning its number.
fn extended_gpr_number(name: &str, suffix: Option<char>) -> Option<u32> {
    let digits = name.strip_prefix('R')?;
    let digits = match suffix {
        Some(s) => digits.strip_suffix(s)?,
        None => digits,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Whether a register exists in 64-bit mode.
pub fn is_64bit_register(name: &str, class: &str, width: u32) -> bool {
    if class == "gpr" {
        return match width {
            64 => true,
            32 => {
                prefixed_base_gpr(name, 'E')
                    || prefixed_base_gpr(name, 'R')
                    || extended_gpr_number(name, Some('D')).is_some()
            }
            16 => BASE_GPRS_16.contains(&name) || extended_gpr_number(name, Some('W')).is_some(),
            8 => {
                LEGACY_GPRS_8.contains(&name)
                    || REX_GPRS_8.contains(&name)
                    || extended_gpr_number(name, Some('B')).is_some()
            }
            _ => false,
        };
    }
    name == "RFLAGS" || matches!(class, "sr" | "cr" | "dr" | "mmx" | "x87" | "xmm" | "ymm" | "zmm")
}

/// Whether a register exists in 32-bit mode.
pub fn is_32bit_register(name: &str, class: &str, width: u32) -> bool {
    if width == 64 {
        return false;
    }
    let extended = [None, Some('D'), Some('W'), Some('B')]
        .into_iter()
        .filter_map(|suffix| extended_gpr_number(name, suffix))
        .any(|n| n >= 8);
    if extended {
        return false;
    }
    if name == "EFLAGS" || matches!(class, "sr" | "cr" | "dr" | "mmx" | "x87" | "xmm") {
        return true;
    }
    if class != "gpr" {
        return false;
    }
    match width {
        32 => prefixed_base_gpr(name, 'E'),
        16 => BASE_GPRS_16.contains(&name),
        8 => LEGACY_GPRS_8.contains(&name),
        _ => false,
    }
}

/// Whether a register is a family root ("main") in the given architecture.
///
/// GPRs are main only at the architecture's full width, so `EAX` is main in `x86_32` and a
/// sub-register of `RAX` in `x86_64`.
pub fn is_main_register(isa: &str, name: &str, class: &str, width: u32) -> bool {
    match class {
        "gpr" => match (isa, width) {
            (ISA_X86_64, 64) => {
                prefixed_base_gpr(name, 'R')
                    || extended_gpr_number(name, None).is_some_and(|n| (8..=15).contains(&n))
            }
            (ISA_X86_32, 32) => prefixed_base_gpr(name, 'E'),
            _ => false,
        },
        "flags" => matches!(name, "EFLAGS" | "RFLAGS"),
        "sr" => true,
        "cr" | "dr" => MAIN_CONTROL_DEBUG.contains(&name),
        "xmm" => name.starts_with("XMM") && name.len() <= 5,
        _ => false,
    }
}

/// Reads and parses the register table.
///
/// # Returns
///
/// `Err(IsaError::SourceNotFound)` if the file does not exist and
/// `Err(IsaError::RegisterFileUnreadable)` if it exists but cannot be read. Undecodable bytes are
/// replaced, so binary garbage produces no registers rather than an error.
pub fn read_register_file(path: &Path) -> Result<Vec<RegisterLine>> {
    if !path.exists() {
        return Err(IsaError::SourceNotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|e| IsaError::RegisterFileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .filter_map(parse_register_line)
        .collect())
}

/// Machine modes for `(x86_32, x86_64)`.
///
/// Without an enumeration file the defaults are `LEGACY_32`/`LONG_64`. A present file decides:
/// each architecture takes the first of its candidate modes the file lists, and falls back to the
/// default with a warning when none is listed or the file cannot be read.
pub fn machine_modes(datafiles_dir: &Path) -> (String, String) {
    let path = datafiles_dir.join(MACHINE_MODES_FILE);
    if !path.is_file() {
        return (LEGACY_32.to_owned(), LONG_64.to_owned());
    }
    let text = match fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "cannot read machine modes; using defaults");
            return (LEGACY_32.to_owned(), LONG_64.to_owned());
        }
    };
    let listed = listed_modes(&text);
    (
        pick_mode(&listed, MODES_32, &path),
        pick_mode(&listed, MODES_64, &path),
    )
}

/// Leading token of each non-comment line of an enum file (enumerators, plus directive keywords
/// such as `namespace` that never match a mode).
fn listed_modes(content: &str) -> Vec<&str> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .collect()
}

fn pick_mode(listed: &[&str], candidates: &[&str], path: &Path) -> String {
    let default = candidates[0];
    candidates
        .iter()
        .copied()
        .find(|mode| listed.contains(mode))
        .unwrap_or_else(|| {
            warn!(file = %path.display(), mode = default, "machine mode not listed; using default");
            default
        })
        .to_owned()
}

/// The two x86 architectures, 32-bit first.
pub fn architectures(mode_32: &str, mode_64: &str) -> [Architecture; 2] {
    [
        Architecture {
            isa_name: ISA_X86_32.to_owned(),
            word_size: 32,
            endianness: Endianness::Little,
            description: "Intel x86 32-bit instruction set architecture".to_owned(),
            machine_mode: mode_32.to_owned(),
        },
        Architecture {
            isa_name: ISA_X86_64.to_owned(),
            word_size: 64,
            endianness: Endianness::Little,
            description: "Intel x86 64-bit instruction set architecture".to_owned(),
            machine_mode: mode_64.to_owned(),
        },
    ]
}

/// Adds the addressing-mode catalog for one architecture.
fn push_addressing_modes(meta: &mut ArchMetadata, arch: ArchIndex, isa: &str) {
    let (a, b, i) = if isa == ISA_X86_64 {
        ("RAX", "RBX", "RSI")
    } else {
        ("EAX", "EBX", "ESI")
    };
    for (name, description, template) in ADDRESSING_MODES {
        let example = template.replace("{A}", a).replace("{B}", b).replace("{I}", i);
        meta.push_addressing_mode(arch, name, description, &example);
    }
    if isa == ISA_X86_64 {
        meta.push_addressing_mode(
            arch,
            "rip_relative",
            "RIP-relative addressing (64-bit only)",
            "MOV RAX, [RIP+0x12345678]",
        );
    }
}

/// Adds one architecture's registers and links each to its enclosing family root.
fn push_registers(meta: &mut ArchMetadata, arch: ArchIndex, isa: &str, lines: &[RegisterLine]) {
    let is_64 = isa == ISA_X86_64;
    let members: Vec<&RegisterLine> = lines
        .iter()
        .filter(|l| {
            if is_64 {
                is_64bit_register(&l.name, &l.class, l.width)
            } else {
                is_32bit_register(&l.name, &l.class, l.width)
            }
        })
        .collect();

    let indices: Vec<_> = members
        .iter()
        .map(|l| {
            let mut register = Register::new(arch, &l.name, &l.class, l.width)
                .with_encoding(l.encoding_id)
                .main(is_main_register(isa, &l.name, &l.class, l.width));
            register.register_purpose = abi::register_purpose(isa, &l.name).map(str::to_owned);
            meta.push_register(register)
        })
        .collect();

    for (line, child) in members.iter().zip(indices) {
        let enclosing = if is_64 { &line.enclosing_64 } else { &line.enclosing_32 };
        if enclosing.eq_ignore_ascii_case(&line.name) {
            continue;
        }
        if let Some(parent) = meta.find_register(arch, enclosing) {
            let _ = meta.link(child, parent);
        }
    }
}

/// Builds the complete x86 metadata bundle from a datafiles directory.
///
/// A missing register table degrades to architectures and addressing modes only, with a warning.
/// An unreadable one is an error.
pub fn build_metadata(datafiles_dir: &Path) -> Result<ArchMetadata> {
    let register_path: PathBuf = datafiles_dir.join(REGISTER_FILE);
    let lines = match read_register_file(&register_path) {
        Ok(lines) => lines,
        Err(IsaError::SourceNotFound(path)) => {
            warn!(file = %path.display(), "register file not found; importing without registers");
            Vec::new()
        }
        Err(e) => return Err(e),
    };
    let (mode_32, mode_64) = machine_modes(datafiles_dir);

    let mut meta = ArchMetadata::new();
    for architecture in architectures(&mode_32, &mode_64) {
        let isa = architecture.isa_name.clone();
        let arch = meta.push_architecture(architecture);
        push_registers(&mut meta, arch, &isa, &lines);
        push_addressing_modes(&mut meta, arch, &isa);
    }
    debug!(
        registers = meta.registers.len(),
        modes = meta.addressing_modes.len(),
        "built x86 metadata"
    );
    Ok(meta)
}
