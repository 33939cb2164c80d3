//! Static normalization tables for XED records.
//!
//! Every lookup is total: unmapped keys fall back to a permissive default at the call site.

/// Vendor operand type (with call parentheses removed) to canonical type.
const OPERAND_TYPES: &[(&str, &str)] = &[
    ("GPR8_B", "register"),
    ("GPR8_SB", "register"),
    ("GPR16_B", "register"),
    ("GPR32_B", "register"),
    ("GPR64_B", "register"),
    ("GPRv_B", "register"),
    ("GPRz_B", "register"),
    ("GPRy_B", "register"),
    ("XMM_B", "register"),
    ("XMM_R", "register"),
    ("YMM_B", "register"),
    ("YMM_R", "register"),
    ("ZMM_B", "register"),
    ("ZMM_R", "register"),
    ("MEM0", "memory"),
    ("MEM1", "memory"),
    ("AGEN", "memory"),
    ("IMM0", "immediate"),
    ("IMM1", "immediate"),
    ("UIMM8", "immediate"),
    ("SIMM8", "immediate"),
    ("UIMM16", "immediate"),
    ("SIMM16", "immediate"),
    ("UIMM32", "immediate"),
    ("SIMM32", "immediate"),
    ("SIMMz", "immediate"),
    ("b", "immediate"),
    ("d", "immediate"),
    ("w", "immediate"),
    ("z", "immediate"),
    ("mem8", "memory"),
    ("mem16", "memory"),
    ("mem32", "memory"),
    ("mem64", "memory"),
    ("mem128", "memory"),
    ("mem256", "memory"),
    ("mem512", "memory"),
    ("mem32real", "memory"),
    ("mem64real", "memory"),
    ("mem80real", "memory"),
];

/// Flag-register bit names and lower-case flag names to canonical flags.
const FLAG_NAMES: &[(&str, &str)] = &[
    ("fc0", "CF"),
    ("fc1", "PF"),
    ("fc2", "AF"),
    ("fc3", "ZF"),
    ("fc4", "SF"),
    ("fc5", "TF"),
    ("fc6", "IF"),
    ("fc7", "DF"),
    ("fc8", "OF"),
    ("fc9", "IOPL"),
    ("fc10", "NT"),
    ("fc11", "RF"),
    ("fc12", "VM"),
    ("fc13", "AC"),
    ("fc14", "VIF"),
    ("fc15", "VIP"),
    ("fc16", "ID"),
    ("of", "OF"),
    ("sf", "SF"),
    ("zf", "ZF"),
    ("af", "AF"),
    ("pf", "PF"),
    ("cf", "CF"),
];

/// Flag actions that count as a modification.
pub const MODIFYING_FLAG_ACTIONS: &[&str] = &["mod", "w", "set", "clr"];

/// Encoding-pattern markers that imply an immediate.
pub const IMMEDIATE_MARKERS: &[&str] = &[
    "UIMM8()", "SIMM8()", "UIMM16()", "SIMM16()", "UIMM32()", "SIMM32()", "SIMMz()",
];

/// ISA sets gating on a CPUID feature named exactly like the set.
const IDENTITY_FEATURES: &[&str] = &[
    "MMX", "SSE", "SSE2", "SSE3", "SSSE3", "AVX", "AVX2", "AVX512F", "AVX512CD", "AVX512ER",
    "AVX512PF", "AVX512DQ", "AVX512BW", "AVX512VL", "AVX512IFMA", "AVX512VBMI", "AVX512VBMI2",
    "AVX512VNNI", "BMI1", "BMI2", "ADX", "SHA", "AES", "PCLMULQDQ", "RDRAND", "RDSEED", "F16C",
    "FMA", "MOVBE", "POPCNT", "LZCNT", "TBM", "PREFETCHW", "CLFLUSHOPT", "CLWB", "FSGSBASE",
    "INVPCID", "RTM", "HLE", "MPX", "XSAVE", "XSAVEOPT", "XSAVEC", "XSAVES", "ENQCMD",
    "SERIALIZE", "TSXLDTRK", "AMX_BF16", "AMX_INT8", "AMX_TILE",
];

/// ISA sets whose feature name differs from the set name.
const RENAMED_FEATURES: &[(&str, &[&str])] = &[
    ("SSE4", &["SSE4.1"]),
    ("SSE42", &["SSE4.2"]),
    ("AVX512BF16", &["AVX512_BF16"]),
    ("AVX512VP2INTERSECT", &["AVX512_VP2INTERSECT"]),
    ("AVX512FP16", &["AVX512_FP16"]),
    ("CET", &["CET_IBT", "CET_SS"]),
];

/// Baseline ISA sets that need no CPUID feature.
const BASELINE_SETS: &[&str] = &["I86", "I186", "I286", "I386", "I486", "PENTIUM", "PPRO"];

/// Category to description suffix.
const CATEGORY_DESCRIPTIONS: &[(&str, &str)] = &[
    ("DATAXFER", "Data transfer operation"),
    ("BINARY", "Binary arithmetic operation"),
    ("LOGICAL", "Logical operation"),
    ("SHIFT", "Shift operation"),
    ("ROTATE", "Rotate operation"),
    ("BITBYTE", "Bit manipulation operation"),
    ("FLAGOP", "Flag operation"),
    ("COND_BR", "Conditional branch"),
    ("UNCOND_BR", "Unconditional branch"),
    ("CALL", "Subroutine call"),
    ("RET", "Return from subroutine"),
    ("PUSH", "Push to stack"),
    ("POP", "Pop from stack"),
    ("STRINGOP", "String operation"),
    ("CONVERT", "Data conversion"),
    ("COMIS", "Compare and set flags"),
    ("FCMOV", "Floating-point conditional move"),
    ("X87_ALU", "x87 floating-point arithmetic"),
    ("MMX", "MMX operation"),
    ("SSE", "SSE operation"),
    ("AVX", "AVX operation"),
    ("AVX2", "AVX2 operation"),
    ("AVX512", "AVX512 operation"),
];

/// Extension directories under `datafiles/` scanned for `*.xed.txt` files, in import order.
pub const EXTENSION_DIRS: &[&str] = &[
    "avx",
    "avx512f",
    "avx512cd",
    "avx512ifma",
    "avx512vbmi",
    "avx512-bf16",
    "avx512-fp16",
    "avx512-skx",
    "avx-vnni",
    "hsw",
    "hswavx",
    "hswbmi",
    "bdw",
    "skl",
    "knl",
    "knm",
    "cet",
    "sha",
    "gfni-vaes-vpcl",
    "clwb",
    "clflushopt",
    "movdir",
    "enqcmd",
    "serialize",
    "tsxldtrk",
    "amx-spr",
    "amx-bf16",
    "amx-int8",
    "amx-fp16",
    "amx-complex",
    "amx-tf32",
    "apx-f",
];

fn lookup<'a>(table: &'a [(&str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|&(_, v)| v)
}

/// Canonical operand type for a parenthesis-free vendor type.
pub fn operand_type(raw: &str) -> Option<&'static str> {
    lookup(OPERAND_TYPES, raw)
}

/// Canonical flag name for a vendor flag token.
pub fn flag_name(raw: &str) -> Option<&'static str> {
    lookup(FLAG_NAMES, raw)
}

/// Description suffix for a category.
pub fn category_description(category: &str) -> Option<&'static str> {
    lookup(CATEGORY_DESCRIPTIONS, category)
}

/// CPUID features gating an ISA set. Baseline and unmapped sets yield nothing.
pub fn cpuid_features(isa_set: &str) -> Vec<String> {
    if BASELINE_SETS.contains(&isa_set) {
        return Vec::new();
    }
    if IDENTITY_FEATURES.contains(&isa_set) {
        return vec![isa_set.to_owned()];
    }
    RENAMED_FEATURES
        .iter()
        .find(|(set, _)| *set == isa_set)
        .map(|(_, features)| features.iter().map(|f| (*f).to_owned()).collect())
        .unwrap_or_default()
}
