//! Shared types for the WASM API
//!
//! Argument and result shapes that cross the JavaScript boundary.

use serde::{Deserialize, Serialize};

use crate::engine::{RenderState, SaveStatus};
use crate::models::{StyleRange, TextBlock};
use crate::text::EditClass;

/// Arguments of `editText`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub block: TextBlock,
    pub text: String,
    #[serde(default)]
    pub ranges: Vec<StyleRange>,
}

/// Result of `editText`
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    pub class: EditClass,
    pub render: RenderState,
    pub save_status: SaveStatus,
}

/// Result of any command that may change what is drawn
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    /// Whether the command changed anything
    pub changed: bool,
    pub render: RenderState,
}
