//! # Calling-Convention Tests

use isadex_core::abi::{Preservation, preservation, register_purpose, register_type};
use rstest::rstest;

#[rstest]
#[case("x86_64", "RBX", Preservation::Preserved)]
#[case("x86_64", "r15", Preservation::Preserved)]
#[case("x86_64", "RAX", Preservation::Volatile)]
#[case("x86_64", "R11D", Preservation::Volatile)]
#[case("x86_64", "XMM0", Preservation::Unspecified)]
#[case("x86_32", "EDI", Preservation::Preserved)]
#[case("x86_32", "ECX", Preservation::Volatile)]
#[case("aarch64", "X19", Preservation::Preserved)]
#[case("aarch64", "X30", Preservation::Preserved)]
#[case("aarch64", "X0", Preservation::Volatile)]
#[case("aarch64", "V8", Preservation::Unspecified)]
#[case("riscv64", "X1", Preservation::Unspecified)]
fn test_preservation_table(#[case] isa: &str, #[case] name: &str, #[case] expected: Preservation) {
    assert_eq!(preservation(isa, name, None), expected);
}

#[test]
fn test_override_wins_over_table() {
    assert_eq!(preservation("x86_64", "RAX", Some(true)), Preservation::Preserved);
    assert_eq!(preservation("x86_64", "RBX", Some(false)), Preservation::Volatile);
    assert_eq!(preservation("aarch64", "V0", Some(true)), Preservation::Preserved);
}

#[rstest]
#[case("gpr", "general-purpose")]
#[case("GPR", "general-purpose")]
#[case("xmm", "vector")]
#[case("simd", "vector")]
#[case("sr", "segment")]
#[case("flags", "flags")]
#[case("tmm", "special-purpose")]
fn test_register_type(#[case] class: &str, #[case] expected: &str) {
    assert_eq!(register_type(class), expected);
}

#[test]
fn test_register_purpose() {
    assert_eq!(register_purpose("x86_64", "rsp"), Some("stack pointer"));
    assert_eq!(register_purpose("x86_32", "ESP"), Some("stack pointer"));
    assert_eq!(register_purpose("aarch64", "X30"), Some("link register"));
    assert_eq!(register_purpose("x86_32", "RSP"), None);
    assert_eq!(register_purpose("x86_64", "RBX"), None);
}

#[test]
fn test_preservation_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Preservation::Volatile).unwrap(), "\"volatile\"");
    assert_eq!(Preservation::Unspecified.as_str(), "unspecified");
}
