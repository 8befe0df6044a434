//! Models module for the carousel layout engine
//!
//! This module contains the plain data structures shared by the layout
//! functions, the live layout queue and the JavaScript API.

pub mod core;
pub mod style;
pub mod template;
pub mod snapshot;
pub mod slide;

// Re-export commonly used types
pub use core::*;
pub use style::{StyleFlags, StyleRange};
pub use template::{FontSpec, Rect, RenderSettings, TemplateGeometry, TemplateType};
pub use snapshot::{
    EditorFlags, ImagePlacement, InputSnapshot, LayoutLine, LayoutSnapshot, LineOverride, StyleRun,
};
pub use slide::{SlideRow, SlideState};
