//! Collaborators the engine calls out to
//!
//! Each seam is a trait so the WASM API can back it with JavaScript callbacks
//! and tests can back it with recording fakes.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::error::PersistError;
use crate::models::{FontSpec, SlideIndex, TemplateGeometry};
use crate::renderers::LayoutComputer;

use super::persist::SaveRequest;

/// Lookup into the external template registry
pub trait TemplateRegistry {
    fn template_for(&self, slide_index: SlideIndex) -> Option<TemplateGeometry>;
}

/// Whether the fonts a layout needs are usable for measurement
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum FontReadiness {
    Ready,
    Pending,
}

/// Font readiness barrier
///
/// `ensure_loaded` starts loading whatever is missing and reports whether
/// everything is ready now. The drain asks again on its next resumption.
pub trait FontLoader {
    fn ensure_loaded(&mut self, fonts: &[FontSpec]) -> FontReadiness;
}

/// External storage
///
/// `begin_save` hands the request off; the outcome is reported later through
/// `LayoutEditor::complete_save` with the request's `save_id`. An `Err` here
/// means the save could not even be started.
pub trait PersistSink {
    fn begin_save(&mut self, request: &SaveRequest) -> Result<(), PersistError>;
}

/// All collaborators, owned by the editor
pub struct Collaborators {
    /// `None` until the layout functions are wired (startup race)
    pub layout: Option<Rc<dyn LayoutComputer>>,
    pub templates: Box<dyn TemplateRegistry>,
    pub fonts: Box<dyn FontLoader>,
    pub persist: Box<dyn PersistSink>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("layout_ready", &self.layout.is_some())
            .finish_non_exhaustive()
    }
}
