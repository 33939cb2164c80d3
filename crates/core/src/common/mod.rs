//! Common definitions shared across the catalog.
//!
//! This module currently holds the error taxonomy; see [`error`].

/// Catalog error type and `Result` alias.
pub mod error;

pub use error::{IsaError, Result};
