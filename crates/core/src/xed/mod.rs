//! XED block-format support for the x86 family.
//!
//! 1. **Parser:** Line-oriented block tokenizer yielding flat records ([`parser`]).
//! 2. **Classifier:** Record-to-instruction conversion with architecture targeting ([`classify`]).
//! 3. **Tables:** Immutable normalization data ([`tables`]).
//! 4. **Metadata:** Register forest and addressing modes from `xed-regs.txt` ([`metadata`]).

/// Record-to-instruction conversion.
pub mod classify;
/// Register and addressing-mode metadata builder.
pub mod metadata;
/// Block-format tokenizer.
pub mod parser;
/// Static normalization tables.
pub mod tables;

pub use classify::classify;
pub use parser::{LossyLines, XedBlocks, XedRecord, parse_file, parse_str};
