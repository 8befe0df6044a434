//! Layout computation
//!
//! Pure functions that turn slide text, style ranges and template geometry into
//! positioned, styled lines.

pub mod metrics;
pub mod wrap;
pub mod placement;
pub mod block;
pub mod dual_block;
pub mod single_block;
pub mod layout_engine;

pub use layout_engine::{AutoShrinkPolicy, DeterministicLayoutComputer, LayoutComputer, LayoutRequest};
pub use metrics::{GlyphWidthTable, TextMetrics};
