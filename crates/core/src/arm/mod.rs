//! ARM machine-readable JSON support for AArch64.
//!
//! 1. **Walker:** Depth-first conversion of the `Instructions.json` node tree ([`walker`]).
//! 2. **Metadata:** Built-in AArch64 register file and addressing modes ([`metadata`]).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use crate::common::Result;

/// AArch64 register and addressing-mode builder.
pub mod metadata;
/// Instruction tree walker.
pub mod walker;

pub use walker::{ArmNode, ArmWalker, SkippedNode};

/// Instruction document file name inside the ARM source directory.
pub const INSTRUCTIONS_FILE: &str = "Instructions.json";

/// Reads and decodes an ARM JSON document.
pub fn load_document(path: &Path) -> Result<Value> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
