//! Carousel Layout WASM API
//!
//! This module provides the JavaScript-facing API for the layout engine.
//!
//! # Module Structure
//!
//! - `helpers`: Shared utilities for serialization, error handling, timing and logging
//! - `types`: Argument and result shapes crossing the boundary
//! - `bridge`: Collaborators backed by JavaScript callbacks
//! - `core`: The exported engine functions

pub mod helpers;
pub mod types;
pub mod bridge;
pub mod core;

// Re-export all public functions to keep a flat API surface
pub use core::*;
