
/// XED source trees imported end to end.
pub mod xed;
