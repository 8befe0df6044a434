//! Text and style handling
//!
//! ## Modules
//!
//! - `ranges`: Style range normalization and slicing into per-line runs
//! - `reconcile`: Edit classification and in-place re-styling/re-wrapping

pub mod ranges;
pub mod reconcile;

// Re-exports for convenience
pub use ranges::{char_len, normalize_ranges, runs_for_span};
pub use reconcile::{classify, EditClass, PunctuationPolicy};
