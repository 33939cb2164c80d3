//! AArch64 architecture metadata.
//!
//! ARM's machine-readable release has no general-purpose register table, so this builder uses a
//! fixed AArch64 register file. Narrow views are linked under their 64- or 128-bit root:
//! `Wn -> Xn`, `WZR -> XZR`, and `Dn/Sn/Hn/Bn -> Vn`.

use crate::abi;
use crate::model::{
    ArchIndex, ArchMetadata, Architecture, Endianness, ISA_AARCH64, Register, RegisterIndex,
};

/// AArch64 addressing-mode catalog: `(name, description, example)`.
const ADDRESSING_MODES: &[(&str, &str, &str)] = &[
    ("register_direct", "Direct register addressing", "MOV X0, X1"),
    ("immediate", "Immediate addressing", "MOV X0, #42"),
    ("base_register", "Base register addressing", "LDR X0, [X1]"),
    ("base_offset", "Base plus offset addressing", "LDR X0, [X1, #8]"),
    ("pre_indexed", "Pre-indexed addressing", "LDR X0, [X1, #8]!"),
    ("post_indexed", "Post-indexed addressing", "LDR X0, [X1], #8"),
    ("register_offset", "Base plus register offset", "LDR X0, [X1, X2]"),
    ("scaled_register_offset", "Base plus scaled register offset", "LDR X0, [X1, X2, LSL #3]"),
    ("pc_relative", "PC-relative addressing", "ADR X0, label"),
    ("literal", "Literal pool addressing", "LDR X0, =value"),
];

/// Scalar views of each vector register: `(prefix, width)`.
const SIMD_VIEWS: &[(char, u32)] = &[('D', 64), ('S', 32), ('H', 16), ('B', 8)];

/// The AArch64 architecture record.
pub fn architecture() -> Architecture {
    Architecture {
        isa_name: ISA_AARCH64.to_owned(),
        word_size: 64,
        endianness: Endianness::Little,
        description: "ARM AArch64 (A64) instruction set architecture".to_owned(),
        machine_mode: "AARCH64".to_owned(),
    }
}

fn push(meta: &mut ArchMetadata, mut register: Register) -> RegisterIndex {
    register.register_purpose =
        abi::register_purpose(ISA_AARCH64, &register.register_name).map(str::to_owned);
    meta.push_register(register)
}

fn push_registers(meta: &mut ArchMetadata, arch: ArchIndex) {
    for i in 0..31 {
        let x = Register::new(arch, format!("X{i}"), "gpr", 64)
            .with_encoding(Some(i))
            .main(true);
        let x = push(meta, x);
        let w = push(meta, Register::new(arch, format!("W{i}"), "gpr", 32).with_encoding(Some(i)));
        let _ = meta.link(w, x);
    }

    let sp = Register::new(arch, "SP", "gpr", 64).with_encoding(Some(31));
    let _ = push(meta, sp.main(true));
    let xzr = Register::new(arch, "XZR", "gpr", 64).with_encoding(Some(31));
    let xzr = push(meta, xzr.main(true));
    let wzr = push(meta, Register::new(arch, "WZR", "gpr", 32).with_encoding(Some(31)));
    let _ = meta.link(wzr, xzr);

    for i in 0..32 {
        let v = Register::new(arch, format!("V{i}"), "simd", 128)
            .with_encoding(Some(i))
            .main(true);
        let v = push(meta, v);
        for &(prefix, width) in SIMD_VIEWS {
            let view = push(
                meta,
                Register::new(arch, format!("{prefix}{i}"), "simd", width).with_encoding(Some(i)),
            );
            let _ = meta.link(view, v);
        }
    }

    let _ = push(meta, Register::new(arch, "PC", "control", 64).main(true));
    let _ = push(meta, Register::new(arch, "PSTATE", "flags", 32).main(true));
}

/// Builds the AArch64 metadata bundle.
pub fn build_metadata() -> ArchMetadata {
    let mut meta = ArchMetadata::new();
    let arch = meta.push_architecture(architecture());
    push_registers(&mut meta, arch);
    for (name, description, example) in ADDRESSING_MODES {
        meta.push_addressing_mode(arch, name, description, example);
    }
    meta
}
