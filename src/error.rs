//! Error types for the layout engine
//!
//! Layout errors come from the pure layout functions, engine errors from
//! commands issued against the editor, persistence errors from the storage
//! collaborator. None of them are fatal to an editing session.

use thiserror::Error;

use crate::models::SlideKey;

/// Reasons the layout functions refuse to produce a layout
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// No text to lay out (skipped by callers, not a failure)
    #[error("no text to lay out")]
    EmptyInput,

    /// Template geometry was not supplied
    #[error("template geometry unavailable")]
    MissingTemplate,

    /// Template geometry is present but unusable
    #[error("invalid template geometry: {0}")]
    InvalidGeometry(String),
}

/// Errors returned by editor commands
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("template snapshot unavailable for {0}")]
    MissingTemplate(SlideKey),

    #[error("no text to lay out for {0}")]
    EmptyInput(SlideKey),

    /// Layout functions not wired yet (startup race)
    #[error("layout computation unavailable")]
    ComputationUnavailable,

    #[error("no project loaded")]
    ProjectNotLoaded,

    #[error("project {0} is not the loaded project")]
    ProjectMismatch(String),

    #[error("slide index {0} out of range (0-5)")]
    InvalidSlideIndex(usize),

    #[error("no undo history available")]
    NoUndoHistory,

    #[error("no layout exists for {0}")]
    NoLayout(SlideKey),

    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] PersistError),
}

/// Failures reported by the storage collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistError {
    #[error("save rejected: {0}")]
    Rejected(String),

    #[error("payload encoding failed: {0}")]
    Encoding(String),
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Encoding(e.to_string())
    }
}
