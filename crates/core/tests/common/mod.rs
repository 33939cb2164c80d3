//! Fixtures shared across the test suite.

use std::fs;
use std::path::Path;

use isadex_core::Store;
use isadex_core::model::{Encoding, Instruction, Operand, OperandType, Visibility};
use tempfile::TempDir;


/// Main XED table: two dual-mode records, one 32-bit-only, one 64-bit-only, one with an
/// unparsable CPL, and one block without ICLASS.
pub const XED_ISA: &str = "\
# XED main table fixture
{
ICLASS    : ADD
CPL       : 3
CATEGORY  : BINARY
EXTENSION : BASE
ISA_SET   : I86
FLAGS     : MUST [ of-mod sf-mod zf-mod af-mod pf-mod cf-mod ]
PATTERN   : 0x00 MOD[mm] MOD!=3 REG[rrr] RM[nnn] MODRM()
OPERANDS  : MEM0:rw:mem8 REG0=GPR8_R():r
IFORM     : ADD_MEMb_GPR8
}

{
ICLASS    : AAA
CPL       : 3
CATEGORY  : DECIMAL
EXTENSION : BASE
ISA_SET   : I86
PATTERN   : 0x37 not64
OPERANDS  : REG0=XED_REG_AL:rw:SUPP
IFORM     : AAA
}

{
ICLASS    : SYSCALL
CPL       : 3
CATEGORY  : SYSCALL
EXTENSION : LONGMODE
ISA_SET   : LONGMODE
PATTERN   : 0x0F 0x05 mode64
OPERANDS  :
IFORM     : SYSCALL
}

{
ICLASS    : HLT
CPL       : ring0
CATEGORY  : MISC
EXTENSION : BASE
ISA_SET   : I86
PATTERN   : 0xF4
}

{
CATEGORY  : ORPHAN
EXTENSION : BASE
}
";

/// AVX extension table with one dual-mode record.
pub const XED_AVX: &str = "\
{
ICLASS    : VADDPS
CPL       : 3
CATEGORY  : AVX
EXTENSION : AVX
ISA_SET   : AVX
PATTERN   : VV1 0x58 VL128 V0F MODRM()
OPERANDS  : REG0=XMM_R():w:dq REG1=XMM_N():r:dq MEM0:r:dq
IFORM     : VADDPS_XMMdq_XMMdq_MEMdq
}
";

/// Register table covering GPR families, flags, and one vector register.
pub const XED_REGS: &str = "\
# name class width enclosing-64/32 regid
RAX     gpr    64   RAX          0
EAX     gpr    32   RAX/EAX      0
AX      gpr    16   RAX/EAX      0
AL      gpr    8    RAX/EAX      0
AH      gpr    8    RAX/EAX      4  h
RSP     gpr    64   RSP          4
ESP     gpr    32   RSP/ESP      4
R8      gpr    64   R8           8
R8D     gpr    32   R8           8
RFLAGS  flags  64   RFLAGS       0
EFLAGS  flags  32   RFLAGS/EFLAGS 0
XMM0    xmm    128  XMM0         0
INVALID INVALID 0   INVALID      0
";

/// Records the XED fixture tree converts successfully.
pub const XED_FIXTURE_RECORDS: u64 = 6;

/// ARM document: a set holding a group with two instructions and an alias, a node of an
/// unknown type, a malformed node, and a nameless instruction with no usable mnemonic.
pub const ARM_INSTRUCTIONS: &str = r#"{
  "_meta": {
    "version": { "architecture": "v9Ap4", "ref": "A", "build": "1234" }
  },
  "instructions": [
    {
      "_type": "Instruction.InstructionSet",
      "name": "A64",
      "children": [
        {
          "_type": "Instruction.InstructionGroup",
          "name": "dpimm",
          "children": [
            {
              "_type": "Instruction.Instruction",
              "name": "ADD_64_addsub_imm",
              "title": "Add immediate value",
              "operation": "X[d] = result;",
              "encoding": { "pattern": "sf:1 op:0 S:0 100010 sh imm12 Rn Rd" },
              "assembly": {
                "_type": "Instruction.Assembly",
                "symbols": [
                  { "_type": "Instruction.Symbols.Literal", "value": "add " }
                ]
              }
            },
            {
              "_type": "Instruction.Instruction",
              "name": "FMLA_z_zzz",
              "description": { "after": "Floating-point fused multiply-add vectors" },
              "operation": "",
              "condition": "HaveSVE() && IsFeatureImplemented(FEAT_SVE)"
            },
            {
              "_type": "Instruction.InstructionAlias",
              "name": "MOV_add_addsub_imm",
              "title": "Move to or from SP"
            }
          ]
        },
        { "_type": "Instruction.Operation", "name": "ignored" },
        42,
        { "_type": "Instruction.Instruction", "name": "___" }
      ]
    }
  ]
}"#;

/// Source version rendered from [`ARM_INSTRUCTIONS`].
pub const ARM_SOURCE_VERSION: &str = "v9Ap4-A-1234";

/// Writes an XED source tree (`<root>/datafiles/...` plus `<root>/VERSION`).
pub fn write_xed_tree(root: &Path) {
    let datafiles = root.join("datafiles");
    fs::create_dir_all(datafiles.join("avx")).unwrap();
    fs::write(datafiles.join("xed-isa.txt"), XED_ISA).unwrap();
    fs::write(datafiles.join("avx").join("avx-isa.xed.txt"), XED_AVX).unwrap();
    fs::write(datafiles.join("avx").join("notes.txt"), "{\nICLASS : IGNORED\n}\n").unwrap();
    fs::write(datafiles.join("xed-regs.txt"), XED_REGS).unwrap();
    fs::write(root.join("VERSION"), "v2024.11.04\n").unwrap();
}

/// Creates a temporary XED source tree.
pub fn xed_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_xed_tree(dir.path());
    dir
}

/// Creates a temporary ARM source directory holding `Instructions.json`.
pub fn arm_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Instructions.json"), ARM_INSTRUCTIONS).unwrap();
    dir
}

/// Fresh in-memory catalog.
pub fn store() -> Store {
    Store::open_in_memory().unwrap()
}

/// Installs a test log writer once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// A complete, valid instruction.
pub fn instruction(isa: &str, mnemonic: &str, variant: Option<&str>) -> Instruction {
    Instruction {
        variant: variant.map(str::to_owned),
        category: "BINARY".to_owned(),
        extension: "BASE".to_owned(),
        isa_set: "I86".to_owned(),
        description: format!("{mnemonic} - Binary arithmetic operation"),
        syntax: format!("{mnemonic} reg, reg"),
        operands: vec![
            Operand {
                name: "REG0".to_owned(),
                operand_type: OperandType::Register,
                access: "rw".into(),
                size: Some("v".to_owned()),
                visibility: Visibility::Explicit,
            },
            Operand {
                name: "REG1".to_owned(),
                operand_type: OperandType::Register,
                access: "r".into(),
                size: None,
                visibility: Visibility::Explicit,
            },
        ],
        encoding: Some(Encoding {
            opcode: Some("0x01".to_owned()),
            modrm: true,
            ..Encoding::from_pattern("0x01 MOD[0b11] MODRM()")
        }),
        flags_affected: vec!["OF".to_owned(), "CF".to_owned()],
        cpuid_features: Vec::new(),
        cpl: Some(3),
        attributes: vec!["SCALABLE".to_owned()],
        ..Instruction::new(isa, mnemonic)
    }
}

/// Same as [`instruction`] with a custom category and description.
pub fn described(isa: &str, mnemonic: &str, category: &str, description: &str) -> Instruction {
    Instruction {
        category: category.to_owned(),
        description: description.to_owned(),
        ..instruction(isa, mnemonic, None)
    }
}
