//! Carousel Layout WASM Module
//!
//! Deterministic text layout and live reflow for six-slide carousel projects.
//! The engine owns all slide state; JavaScript supplies measurements, template
//! geometry, font readiness and storage through narrow callbacks.

pub mod config;
pub mod error;
pub mod models;
pub mod text;
pub mod renderers;
pub mod undo;
pub mod engine;
pub mod api;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::{EngineError, LayoutError, PersistError};
pub use models::*;
pub use engine::{LayoutEditor, ProjectSeed};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    init_logging();

    log::info!("Carousel layout WASM module initialized");
}

/// Install the console logger; false if it could not be installed
pub fn init_logging() -> bool {
    #[cfg(feature = "console_log")]
    let installed = match console_log::init_with_level(log::Level::Debug) {
        Ok(()) => true,
        Err(e) => {
            web_sys::console::warn_1(&format!("[carousel] console logger not installed: {}", e).into());
            false
        }
    };
    #[cfg(not(feature = "console_log"))]
    let installed = false;
    installed
}
