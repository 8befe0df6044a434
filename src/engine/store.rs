//! Slide State Store
//!
//! The single owned container for the loaded project's slides and the
//! render-facing projection of the active slide. Components read from here at
//! the moment they need a value; nothing caches slide state across a
//! suspension point.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{
    InputSnapshot, LayoutSnapshot, ProjectId, RenderSettings, SlideIndex, SlideKey, SlideRow, SlideState,
    TemplateType, SLIDE_COUNT,
};

/// Persisted project data used to hydrate the store
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSeed {
    pub project_id: ProjectId,
    #[serde(default)]
    pub template_type: TemplateType,
    #[serde(default)]
    pub template_id: String,
    #[serde(default)]
    pub render_settings: RenderSettings,
    /// Rows for slides that exist in storage; missing slides start empty
    #[serde(default)]
    pub slides: Vec<SlideRow>,
}

impl ProjectSeed {
    pub fn new(project_id: ProjectId, template_type: TemplateType, template_id: impl Into<String>) -> Self {
        Self {
            project_id,
            template_type,
            template_id: template_id.into(),
            render_settings: RenderSettings::default(),
            slides: Vec::new(),
        }
    }
}

/// What the canvas renderer draws for the active slide
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderState {
    pub slide_index: SlideIndex,
    pub layout_snapshot: Option<LayoutSnapshot>,
    pub input_snapshot: Option<InputSnapshot>,
    pub history_depth: usize,
    /// Bumped on every refresh so the renderer can skip unchanged frames
    pub version: u64,
}

#[derive(Debug)]
struct LoadedProject {
    project_id: ProjectId,
    template_type: TemplateType,
    template_id: String,
    render_settings: RenderSettings,
    slides: Vec<SlideState>,
}

/// Owner of all slide state for the editing session
#[derive(Debug)]
pub struct SlideStore {
    project: Option<LoadedProject>,
    active_slide: SlideIndex,
    render: RenderState,
    history_limit: usize,
    /// Bumped on every load, so state read before a reload can be told apart
    generation: u64,
}

impl SlideStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            project: None,
            active_slide: SlideIndex::default(),
            render: RenderState::default(),
            history_limit,
            generation: 0,
        }
    }

    /// Replace the loaded project with `seed`; all six slides always exist
    pub fn load(&mut self, seed: ProjectSeed) {
        for row in seed.slides.iter().filter(|row| row.slide_index >= SLIDE_COUNT) {
            log::warn!("ignoring slide row {} of project {}", row.slide_index, seed.project_id);
        }

        let slides = SlideIndex::all()
            .map(|index| {
                let mut slide = seed
                    .slides
                    .iter()
                    .find(|row| row.slide_index == index.get())
                    .map(|row| row.hydrate(index))
                    .unwrap_or_else(|| SlideState::new(index));
                slide.layout_history.set_max_size(self.history_limit);
                slide
            })
            .collect();

        log::info!("loaded project {} ({:?})", seed.project_id, seed.template_type);
        self.project = Some(LoadedProject {
            project_id: seed.project_id,
            template_type: seed.template_type,
            template_id: seed.template_id,
            render_settings: seed.render_settings,
            slides,
        });
        self.generation += 1;
        self.active_slide = SlideIndex::default();
        self.refresh_render();
    }

    /// Drop the loaded project (session teardown)
    pub fn unload(&mut self) {
        self.project = None;
        self.active_slide = SlideIndex::default();
        self.refresh_render();
    }

    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project.as_ref().map(|p| &p.project_id)
    }

    pub fn is_loaded(&self, project_id: &ProjectId) -> bool {
        self.project_id() == Some(project_id)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Slide state for `key`, only if nothing was reloaded since `generation`
    pub fn slide_at_generation(&self, key: &SlideKey, generation: u64) -> Option<&SlideState> {
        if self.generation == generation {
            self.slide_for_key(key)
        } else {
            None
        }
    }

    pub fn template_type(&self) -> TemplateType {
        self.project.as_ref().map(|p| p.template_type).unwrap_or_default()
    }

    pub fn template_id(&self) -> &str {
        self.project.as_ref().map(|p| p.template_id.as_str()).unwrap_or("")
    }

    pub fn render_settings(&self) -> RenderSettings {
        self.project
            .as_ref()
            .map(|p| p.render_settings.clone())
            .unwrap_or_default()
    }

    pub fn key_for(&self, slide_index: SlideIndex) -> Result<SlideKey, EngineError> {
        self.project_id()
            .map(|id| SlideKey::new(id.clone(), slide_index))
            .ok_or(EngineError::ProjectNotLoaded)
    }

    pub fn active_slide(&self) -> SlideIndex {
        self.active_slide
    }

    pub fn active_key(&self) -> Result<SlideKey, EngineError> {
        self.key_for(self.active_slide)
    }

    pub fn slide(&self, slide_index: SlideIndex) -> Option<&SlideState> {
        self.project.as_ref().map(|p| &p.slides[slide_index.get()])
    }

    pub fn slide_mut(&mut self, slide_index: SlideIndex) -> Option<&mut SlideState> {
        self.project.as_mut().map(|p| &mut p.slides[slide_index.get()])
    }

    /// Slide state for `key`, only while its project is the loaded one
    pub fn slide_for_key(&self, key: &SlideKey) -> Option<&SlideState> {
        if self.is_loaded(&key.project_id) {
            self.slide(key.slide_index)
        } else {
            None
        }
    }

    pub fn slide_for_key_mut(&mut self, key: &SlideKey) -> Option<&mut SlideState> {
        if self.is_loaded(&key.project_id) {
            self.slide_mut(key.slide_index)
        } else {
            None
        }
    }

    /// Switch the displayed slide; history of both slides is cleared
    pub fn set_active_slide(&mut self, slide_index: SlideIndex) -> bool {
        if slide_index == self.active_slide {
            return false;
        }
        let previous = self.active_slide;
        for index in [previous, slide_index] {
            if let Some(slide) = self.slide_mut(index) {
                slide.layout_history.clear();
            }
        }
        self.active_slide = slide_index;
        self.refresh_render();
        true
    }

    pub fn render(&self) -> &RenderState {
        &self.render
    }

    /// Refresh the projection if `slide_index` is the displayed slide
    pub fn refresh_render_if_active(&mut self, slide_index: SlideIndex) -> bool {
        if slide_index != self.active_slide {
            return false;
        }
        self.refresh_render();
        true
    }

    fn refresh_render(&mut self) {
        let version = self.render.version + 1;
        let active = self.active_slide;
        self.render = match self.slide(active) {
            Some(slide) => RenderState {
                slide_index: active,
                layout_snapshot: slide.layout_snapshot.clone(),
                input_snapshot: slide.input_snapshot.clone(),
                history_depth: slide.layout_history.depth(),
                version,
            },
            None => RenderState {
                slide_index: active,
                version,
                ..RenderState::default()
            },
        };
    }
}
