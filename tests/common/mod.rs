//! Shared fakes for the integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use carousel_layout_wasm::engine::{
    Collaborators, FontLoader, FontReadiness, PersistSink, SaveRequest, TemplateRegistry,
};
use carousel_layout_wasm::renderers::{AutoShrinkPolicy, DeterministicLayoutComputer, GlyphWidthTable};
use carousel_layout_wasm::{
    EngineConfig, FontSpec, LayoutEditor, LayoutSnapshot, PersistError, ProjectId, ProjectSeed, Rect, SlideIndex,
    SlideState, TemplateGeometry, TemplateType,
};

pub const PROJECT: &str = "p1";

pub fn geometry(template_type: TemplateType) -> TemplateGeometry {
    TemplateGeometry {
        template_id: "tpl-1".to_string(),
        template_type,
        canvas: Rect::new(0.0, 0.0, 1080.0, 1350.0),
        content_rect: Rect::new(80.0, 100.0, 920.0, 1100.0),
        padding: 20.0,
        block_gap: 40.0,
        line_height_ratio: 1.2,
        min_line_span: 200.0,
    }
}

/// Same geometry for every slide, except the ones marked missing
pub struct FixedTemplates {
    pub geometry: TemplateGeometry,
    pub missing: Rc<RefCell<HashSet<usize>>>,
}

impl TemplateRegistry for FixedTemplates {
    fn template_for(&self, slide_index: SlideIndex) -> Option<TemplateGeometry> {
        if self.missing.borrow().contains(&slide_index.get()) {
            None
        } else {
            Some(self.geometry.clone())
        }
    }
}

pub struct SwitchFonts {
    pub ready: Rc<Cell<bool>>,
    pub requests: Rc<Cell<usize>>,
}

impl FontLoader for SwitchFonts {
    fn ensure_loaded(&mut self, _fonts: &[FontSpec]) -> FontReadiness {
        self.requests.set(self.requests.get() + 1);
        if self.ready.get() {
            FontReadiness::Ready
        } else {
            FontReadiness::Pending
        }
    }
}

pub struct RecordingSink {
    pub saves: Rc<RefCell<Vec<SaveRequest>>>,
    pub reject: Rc<Cell<bool>>,
}

impl PersistSink for RecordingSink {
    fn begin_save(&mut self, request: &SaveRequest) -> Result<(), PersistError> {
        if self.reject.get() {
            return Err(PersistError::Rejected("storage offline".to_string()));
        }
        self.saves.borrow_mut().push(request.clone());
        Ok(())
    }
}

pub struct Harness {
    pub editor: LayoutEditor,
    pub saves: Rc<RefCell<Vec<SaveRequest>>>,
    pub reject_saves: Rc<Cell<bool>>,
    pub fonts_ready: Rc<Cell<bool>>,
    pub font_requests: Rc<Cell<usize>>,
    pub missing_templates: Rc<RefCell<HashSet<usize>>>,
}

impl Harness {
    pub fn new(template_type: TemplateType) -> Self {
        Self::with_config(template_type, EngineConfig::default())
    }

    pub fn with_config(template_type: TemplateType, config: EngineConfig) -> Self {
        let saves = Rc::new(RefCell::new(Vec::new()));
        let reject_saves = Rc::new(Cell::new(false));
        let fonts_ready = Rc::new(Cell::new(true));
        let font_requests = Rc::new(Cell::new(0));
        let missing_templates = Rc::new(RefCell::new(HashSet::new()));

        let collaborators = Collaborators {
            layout: Some(Rc::new(DeterministicLayoutComputer::new(
                Rc::new(GlyphWidthTable::default()),
                AutoShrinkPolicy::default(),
            ))),
            templates: Box::new(FixedTemplates {
                geometry: geometry(template_type),
                missing: missing_templates.clone(),
            }),
            fonts: Box::new(SwitchFonts {
                ready: fonts_ready.clone(),
                requests: font_requests.clone(),
            }),
            persist: Box::new(RecordingSink {
                saves: saves.clone(),
                reject: reject_saves.clone(),
            }),
        };

        let mut editor = LayoutEditor::new(config, collaborators);
        editor.load_project(ProjectSeed::new(ProjectId::new(PROJECT), template_type, "tpl-1"));
        Self {
            editor,
            saves,
            reject_saves,
            fonts_ready,
            font_requests,
            missing_templates,
        }
    }

    pub fn slide(&self, index: usize) -> &SlideState {
        let index = SlideIndex::new(index).unwrap();
        self.editor.store().slide(index).unwrap()
    }

    pub fn layout(&self, index: usize) -> Option<&LayoutSnapshot> {
        self.slide(index).layout_snapshot.as_ref()
    }

    /// Saves recorded so far, in the order they were started
    pub fn saves(&self) -> Vec<SaveRequest> {
        self.saves.borrow().clone()
    }
}
