//! XED record classifier.
//!
//! Converts one flat [`XedRecord`] into zero or more canonical [`Instruction`]s:
//! 1. **Targeting:** Decides which of `x86_32`/`x86_64` the record belongs to; one instruction
//!    is emitted per target, identical except for `isa`.
//! 2. **Normalization:** Operands, encoding, and flags are mapped through the static tables in
//!    [`super::tables`]; unmapped values fall back to permissive defaults.
//! 3. **Naming:** Variant, description, and syntax are derived from the vendor fields.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use super::parser::XedRecord;
use super::tables;
use crate::common::{IsaError, Result};
use crate::model::{
    Access, Encoding, ISA_X86_32, ISA_X86_64, Instruction, Operand, OperandType, Visibility,
};

struct Patterns {
    hex_byte: Regex,
    flag: Regex,
}

#[allow(clippy::unwrap_used)]
static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    hex_byte: Regex::new(r"0x[0-9A-Fa-f]{2}").unwrap(),
    flag: Regex::new(r"([a-zA-Z]+\d*)-([a-zA-Z]+)").unwrap(),
});

/// Converts a record into one instruction per target architecture.
///
/// # Returns
///
/// An empty list when the record has no `ICLASS`, or `Err(IsaError::InvalidField)` when `CPL`
/// is present but not an integer.
pub fn classify(record: &XedRecord) -> Result<Vec<Instruction>> {
    let mnemonic = record.iclass().trim().to_owned();
    if mnemonic.is_empty() {
        return Ok(Vec::new());
    }

    let cpl = record
        .field("CPL")
        .map(|raw| {
            raw.parse::<u8>().map_err(|_| IsaError::InvalidField {
                field: "CPL",
                value: raw.to_owned(),
            })
        })
        .transpose()?;

    let raw_operands = record.field_or_empty("OPERANDS");
    let operands = parse_operands(raw_operands);

    let template = Instruction {
        variant: variant_name(record),
        category: record.field_or_empty("CATEGORY").to_owned(),
        extension: record.field_or_empty("EXTENSION").to_owned(),
        isa_set: record.field_or_empty("ISA_SET").to_owned(),
        description: describe(record),
        syntax: render_syntax(record.field("DISASM").unwrap_or(&mnemonic), &operands),
        encoding: parse_encoding(record.field_or_empty("PATTERN")),
        flags_affected: record.field("FLAGS").map(parse_flags).unwrap_or_default(),
        cpuid_features: tables::cpuid_features(record.field_or_empty("ISA_SET")),
        cpl,
        attributes: parse_attributes(record.field_or_empty("ATTRIBUTES")),
        operands,
        ..Instruction::new("", mnemonic)
    };

    Ok(target_architectures(record)
        .into_iter()
        .map(|isa| Instruction {
            isa: isa.to_owned(),
            ..template.clone()
        })
        .collect())
}

/// Decides the target architectures of a record; sorted and deduplicated.
///
/// A `not64` pattern marker pins the record to `x86_32`. Otherwise `mode64`/`mode32` markers,
/// long-mode tags, REX prefix requirements, and a few named mnemonics add targets; a record
/// matching none of them belongs to both.
pub fn target_architectures(record: &XedRecord) -> Vec<&'static str> {
    let pattern = record.field_or_empty("PATTERN").to_ascii_lowercase();
    if pattern.contains("not64") {
        return vec![ISA_X86_32];
    }

    let mut isas = BTreeSet::new();
    if pattern.contains("mode64") {
        let _ = isas.insert(ISA_X86_64);
    }
    if pattern.contains("mode32") {
        let _ = isas.insert(ISA_X86_32);
    }

    let attributes: Vec<String> = parse_attributes(record.field_or_empty("ATTRIBUTES"))
        .into_iter()
        .map(|a| a.to_ascii_uppercase())
        .collect();
    let has_attribute = |name: &str| attributes.iter().any(|a| a == name);

    if record.field_or_empty("EXTENSION") == "LONGMODE"
        || has_attribute("LONGMODE")
        || record.field_or_empty("ISA_SET") == "LONGMODE"
    {
        let _ = isas.insert(ISA_X86_64);
    }
    if pattern.contains("rexw_prefix") || pattern.contains("rex_prefix") {
        let _ = isas.insert(ISA_X86_64);
    }
    if has_attribute("PROTECTED_MODE") && isas.is_empty() {
        isas.extend([ISA_X86_32, ISA_X86_64]);
    }

    match record.iclass().trim().to_ascii_uppercase().as_str() {
        "SYSCALL" | "SYSRET" => {
            let _ = isas.insert(ISA_X86_64);
        }
        "SYSENTER" | "SYSEXIT" if isas.is_empty() => isas.extend([ISA_X86_32, ISA_X86_64]),
        _ => {}
    }

    if isas.is_empty() {
        isas.extend([ISA_X86_32, ISA_X86_64]);
    }
    isas.into_iter().collect()
}

/// Splits the `ATTRIBUTES` field on whitespace.
pub fn parse_attributes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}

/// Parses an `OPERANDS` field.
///
/// Two token shapes are recognized: `name=type(...):access[:size]` and
/// `name:access[:type]`. Other tokens are skipped. All operands are explicit.
pub fn parse_operands(raw: &str) -> Vec<Operand> {
    raw.split_whitespace().filter_map(parse_operand_token).collect()
}

fn parse_operand_token(token: &str) -> Option<Operand> {
    if let Some((name, rest)) = token.split_once('=') {
        if !rest.contains(':') {
            return None;
        }
        let mut parts = rest.split(':');
        let raw_type = parts.next().unwrap_or_default();
        let access = parts.next().unwrap_or("r");
        let size = parts.next().map(str::to_owned);
        return Some(Operand {
            name: name.to_owned(),
            operand_type: normalize_operand_type(raw_type),
            access: Access::from(access),
            size,
            visibility: Visibility::Explicit,
        });
    }

    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() < 2 {
        return None;
    }
    Some(Operand {
        name: parts[0].to_owned(),
        operand_type: normalize_operand_type(parts.get(2).copied().unwrap_or("unknown")),
        access: Access::from(parts[1]),
        size: None,
        visibility: Visibility::Explicit,
    })
}

/// Maps a raw vendor type to a canonical type.
///
/// Call parentheses are removed first. Unmapped types pass through lower-cased; an empty type is
/// [`OperandType::Unknown`].
pub fn normalize_operand_type(raw: &str) -> OperandType {
    let cleaned = raw.replace("()", "");
    if cleaned.is_empty() {
        return OperandType::Unknown;
    }
    match tables::operand_type(&cleaned) {
        Some(canonical) => OperandType::from(canonical.to_owned()),
        None => OperandType::from(cleaned.to_lowercase()),
    }
}

/// Parses an encoding pattern; an empty pattern has no encoding.
pub fn parse_encoding(pattern: &str) -> Option<Encoding> {
    if pattern.is_empty() {
        return None;
    }
    let bytes: Vec<&str> = PATTERNS
        .hex_byte
        .find_iter(pattern)
        .map(|m| m.as_str())
        .collect();

    Some(Encoding {
        pattern: pattern.to_owned(),
        opcode: (!bytes.is_empty()).then(|| bytes.join(" ")),
        modrm: pattern.contains("MODRM()") || pattern.contains("MOD["),
        sib: pattern.contains("SIB()"),
        displacement: pattern.contains("DISP("),
        immediate: tables::IMMEDIATE_MARKERS.iter().any(|m| pattern.contains(m)),
    })
}

/// Extracts modified flags from a `FLAGS` field, in first-appearance order.
pub fn parse_flags(raw: &str) -> Vec<String> {
    let mut flags: Vec<String> = Vec::new();
    for caps in PATTERNS.flag.captures_iter(raw) {
        if !tables::MODIFYING_FLAG_ACTIONS.contains(&&caps[2]) {
            continue;
        }
        let name = &caps[1];
        let canonical = tables::flag_name(&name.to_ascii_lowercase())
            .map_or_else(|| name.to_ascii_uppercase(), str::to_owned);
        if !flags.contains(&canonical) {
            flags.push(canonical);
        }
    }
    flags
}

/// Chooses the variant: `UNAME`, then `IFORM`, then a synthesized id from the operand string.
pub fn variant_name(record: &XedRecord) -> Option<String> {
    if let Some(uname) = record.field("UNAME") {
        return Some(uname.to_owned());
    }
    if let Some(iform) = record.field("IFORM") {
        return Some(iform.to_owned());
    }
    record.field("OPERANDS").map(synthesized_variant)
}

/// Synthesizes `var_NNNN` from a SHA-256 digest of the operand string, modulo 10000.
///
/// Identical operand strings always map to the same id. Distinct strings can collide.
pub fn synthesized_variant(operands: &str) -> String {
    let digest = Sha256::digest(operands.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    format!("var_{:04}", u64::from_be_bytes(prefix) % 10_000)
}

/// Builds `"<DISASM|ICLASS> - <category text>"`.
pub fn describe(record: &XedRecord) -> String {
    let base = record.field("DISASM").unwrap_or_else(|| record.iclass());
    let category = record.field_or_empty("CATEGORY");
    match tables::category_description(category) {
        Some(text) => format!("{base} - {text}"),
        None => format!("{base} - {category} operation"),
    }
}

/// Renders `MNEMONIC op, op` using `reg`/`mem`/`imm` for the canonical types.
pub fn render_syntax(mnemonic: &str, operands: &[Operand]) -> String {
    let rendered: Vec<&str> = operands
        .iter()
        .filter(|op| op.visibility == Visibility::Explicit)
        .map(|op| op.operand_type.syntax_token())
        .collect();
    if rendered.is_empty() {
        mnemonic.to_owned()
    } else {
        format!("{mnemonic} {}", rendered.join(", "))
    }
}
