//! Live Layout Queue
//!
//! Debounced, de-duplicated, run-id gated layout scheduling. Work items are
//! immutable snapshots taken at enqueue time; the drain re-reads live state
//! only for the checks that must see the present (run id, project, lock,
//! primary image) and for the secondary images merged into the result.
//!
//! Items outlive a project switch. Once their project is no longer the loaded
//! one they are still computed from the snapshot and saved under their own
//! key, but never written into the store.
//!
//! The drain never blocks. Waiting for fonts and yielding between items are
//! reported as [`DrainStep`] values and the owner resumes on its next tick.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::error::EngineError;
use crate::models::{
    ImagePlacement, InputSnapshot, LayoutSnapshot, ProjectId, RenderSettings, SlideIndex, SlideKey, SlideState,
    TemplateGeometry, TemplateType,
};
use crate::renderers::LayoutRequest;

use super::host::{Collaborators, FontReadiness, TemplateRegistry};
use super::persist::{PersistenceCoordinator, SavePayload, SavePurpose};
use super::store::SlideStore;
use super::timers::DebounceTimers;

/// Everything needed to compute one slide's layout, captured at enqueue time
#[derive(Clone, Debug, PartialEq)]
pub struct LiveLayoutWorkItem {
    pub key: SlideKey,
    pub run_id: u64,
    pub template_type: TemplateType,
    pub template_id: String,
    pub template: Option<TemplateGeometry>,
    /// Drafts, ranges, sizes, alignments, overrides and flags
    pub input: InputSnapshot,
    pub image: Option<ImagePlacement>,
    pub extra_images: Vec<ImagePlacement>,
    pub existing_layout: Option<LayoutSnapshot>,
    pub render_settings: RenderSettings,
    /// Store load generation the snapshot was taken under
    pub generation: u64,
}

impl LiveLayoutWorkItem {
    /// Snapshot the current state of `slide` for a computation under `run_id`
    pub fn capture(
        key: SlideKey,
        run_id: u64,
        store: &SlideStore,
        slide: &SlideState,
        templates: &dyn TemplateRegistry,
    ) -> Self {
        let template_type = store.template_type();
        let layout = slide.layout_snapshot.clone();
        Self {
            template: templates.template_for(key.slide_index),
            key,
            run_id,
            template_type,
            template_id: store.template_id().to_string(),
            input: slide.to_input_snapshot(template_type),
            image: layout.as_ref().and_then(|l| l.image.clone()),
            extra_images: layout.as_ref().map(|l| l.extra_images.clone()).unwrap_or_default(),
            existing_layout: layout,
            render_settings: store.render_settings(),
            generation: store.generation(),
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.key.project_id
    }

    pub fn slide_index(&self) -> SlideIndex {
        self.key.slide_index
    }

    pub fn has_text(&self) -> bool {
        match self.template_type {
            TemplateType::Dual => !self.input.headline.is_empty() || !self.input.body.is_empty(),
            TemplateType::Single => !self.input.body.is_empty(),
        }
    }

    /// Zero-line layout for a slide whose text was all deleted
    ///
    /// Images stay where they are. None if the slide was never laid out.
    pub fn cleared_layout(&self) -> Option<LayoutSnapshot> {
        self.existing_layout.as_ref()?;
        Some(LayoutSnapshot {
            template_id: self.template_id.clone(),
            lines: Vec::new(),
            image: self.image.clone(),
            extra_images: self.extra_images.clone(),
            headline_font_size: self.input.headline_font_size_px,
            body_font_size: self.input.body_font_size_px,
            overflow: false,
        })
    }

    pub fn to_request(&self) -> LayoutRequest {
        LayoutRequest {
            template: self.template.clone(),
            headline: self.input.headline.clone(),
            body: self.input.body.clone(),
            headline_ranges: self.input.headline_ranges.clone(),
            body_ranges: self.input.body_ranges.clone(),
            headline_font_size_px: self.input.headline_font_size_px,
            body_font_size_px: self.input.body_font_size_px,
            headline_text_align: self.input.headline_text_align,
            body_text_align: self.input.body_text_align,
            line_overrides: self.input.line_overrides.clone(),
            image: self.image.clone(),
            extra_images: self.extra_images.clone(),
        }
    }
}

/// Result of one call into the drain
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "step")]
pub enum DrainStep {
    /// Nothing queued
    Idle,
    /// A drain is already active; it continues on the next resume
    AlreadyDraining,
    /// Fonts are still loading; nothing was computed
    AwaitingFonts,
    /// Processed a slice and gave control back; more items remain
    Yielded { processed: usize },
    /// Queue emptied
    Drained { processed: usize },
}

/// What happened to a single work item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    Applied,
    Stale,
    ProjectChanged,
    /// The primary image moved after the snapshot; a fresh item replaced it
    Requeued,
    Locked,
    EmptyInput,
    ComputationUnavailable,
    MissingTemplate,
    Failed,
}

/// Cumulative counters, mostly for diagnostics and tests
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DrainStats {
    pub computed: usize,
    pub applied: usize,
    pub stale: usize,
    pub skipped: usize,
}

/// Mutable state a drain step works against
pub struct DrainContext<'a> {
    pub store: &'a mut SlideStore,
    pub collaborators: &'a mut Collaborators,
    pub persist: &'a mut PersistenceCoordinator,
    pub now_ms: f64,
}

#[derive(Debug)]
pub struct LiveLayoutQueue {
    items: VecDeque<LiveLayoutWorkItem>,
    timers: DebounceTimers<SlideKey>,
    run_ids: HashMap<SlideKey, u64>,
    draining: bool,
    debounce_ms: f64,
    slice_items: usize,
    stats: DrainStats,
}

impl LiveLayoutQueue {
    pub fn new(debounce_ms: f64, slice_items: usize) -> Self {
        Self {
            items: VecDeque::new(),
            timers: DebounceTimers::new(),
            run_ids: HashMap::new(),
            draining: false,
            debounce_ms,
            slice_items: slice_items.max(1),
            stats: DrainStats::default(),
        }
    }

    /// (Re)start the debounce timer for a slide of the loaded project
    ///
    /// Returns false when the slide is locked and already laid out.
    pub fn schedule(&mut self, slide_index: SlideIndex, now_ms: f64, store: &SlideStore) -> Result<bool, EngineError> {
        let key = store.key_for(slide_index)?;
        if store.slide(slide_index).is_some_and(|s| s.is_locked_with_layout()) {
            log::debug!("live layout for {} skipped: slide locked", key);
            return Ok(false);
        }
        self.timers.arm(key, now_ms, self.debounce_ms);
        Ok(true)
    }

    pub fn is_scheduled(&self, key: &SlideKey) -> bool {
        self.timers.is_armed(key)
    }

    pub fn cancel(&mut self, key: &SlideKey) -> bool {
        self.timers.cancel(key)
    }

    /// Enqueue every slide whose debounce window has elapsed
    pub fn fire_due(&mut self, now_ms: f64, store: &SlideStore, templates: &dyn TemplateRegistry) -> usize {
        let mut fired = 0;
        for key in self.timers.take_due(now_ms) {
            match self.enqueue_for_project(&key.project_id, &[key.slide_index], store, templates) {
                Ok(_) => fired += 1,
                Err(e) => log::warn!("dropping live layout for {}: {}", key, e),
            }
        }
        fired
    }

    /// Enqueue every slide still inside its debounce window, due or not
    pub fn flush_scheduled(&mut self, store: &SlideStore, templates: &dyn TemplateRegistry) -> usize {
        self.fire_due(f64::INFINITY, store, templates)
    }

    /// Snapshot and enqueue the given slides, superseding older work per key
    ///
    /// Returns the run id assigned to each slide.
    pub fn enqueue_for_project(
        &mut self,
        project_id: &ProjectId,
        indices: &[SlideIndex],
        store: &SlideStore,
        templates: &dyn TemplateRegistry,
    ) -> Result<Vec<u64>, EngineError> {
        if !store.is_loaded(project_id) {
            return Err(EngineError::ProjectMismatch(project_id.to_string()));
        }

        let mut run_ids = Vec::with_capacity(indices.len());

        for &slide_index in indices {
            let key = SlideKey::new(project_id.clone(), slide_index);
            let Some(slide) = store.slide(slide_index) else {
                continue;
            };
            let run_id = self.bump_run_id(&key);
            let item = LiveLayoutWorkItem::capture(key.clone(), run_id, store, slide, templates);

            self.items.retain(|queued| queued.key != key);
            self.items.push_back(item);
            log::debug!("enqueued {} (run {})", key, run_id);
            run_ids.push(run_id);
        }
        Ok(run_ids)
    }

    pub fn current_run_id(&self, key: &SlideKey) -> u64 {
        self.run_ids.get(key).copied().unwrap_or(0)
    }

    /// Invalidate any queued or in-progress work for `key`
    pub fn bump_run_id(&mut self, key: &SlideKey) -> u64 {
        let run_id = self.run_ids.entry(key.clone()).or_insert(0);
        *run_id += 1;
        *run_id
    }

    pub fn items(&self) -> impl Iterator<Item = &LiveLayoutWorkItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn stats(&self) -> DrainStats {
        self.stats
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    /// Start a drain; a no-op while one is already active
    pub fn process_queue(&mut self, ctx: &mut DrainContext<'_>) -> DrainStep {
        if self.draining {
            return DrainStep::AlreadyDraining;
        }
        self.drain(ctx)
    }

    /// Continue an active drain, or start one if work is waiting
    pub fn resume(&mut self, ctx: &mut DrainContext<'_>) -> DrainStep {
        if !self.draining && self.items.is_empty() {
            return DrainStep::Idle;
        }
        self.drain(ctx)
    }

    /// Drop all queued work, timers and run ids
    pub fn clear(&mut self) {
        self.items.clear();
        self.timers.clear();
        self.run_ids.clear();
        self.draining = false;
    }

    fn drain(&mut self, ctx: &mut DrainContext<'_>) -> DrainStep {
        if self.items.is_empty() {
            self.draining = false;
            return DrainStep::Idle;
        }
        self.draining = true;

        let fonts = ctx.store.render_settings().font_specs();
        if ctx.collaborators.fonts.ensure_loaded(&fonts) == FontReadiness::Pending {
            log::debug!("drain waiting for {} font(s)", fonts.len());
            return DrainStep::AwaitingFonts;
        }

        let mut processed = 0;
        while let Some(item) = self.items.pop_front() {
            self.process_item(item, ctx);
            processed += 1;
            if processed >= self.slice_items && !self.items.is_empty() {
                return DrainStep::Yielded { processed };
            }
        }
        self.draining = false;
        DrainStep::Drained { processed }
    }

    fn process_item(&mut self, item: LiveLayoutWorkItem, ctx: &mut DrainContext<'_>) -> ItemOutcome {
        let outcome = self.try_apply(&item, ctx);
        match outcome {
            ItemOutcome::Applied => self.stats.applied += 1,
            ItemOutcome::Stale => self.stats.stale += 1,
            _ => self.stats.skipped += 1,
        }
        outcome
    }

    fn try_apply(&mut self, item: &LiveLayoutWorkItem, ctx: &mut DrainContext<'_>) -> ItemOutcome {
        let key = &item.key;
        if item.run_id != self.current_run_id(key) {
            log::debug!("discarding stale run {} for {}", item.run_id, key);
            return ItemOutcome::Stale;
        }

        let attached = match ctx.store.slide_at_generation(key, item.generation) {
            Some(slide) if slide.is_locked_with_layout() => {
                log::debug!("skipping {}: slide locked", key);
                return ItemOutcome::Locked;
            }
            Some(slide) => {
                let image = slide.layout_snapshot.as_ref().and_then(|l| l.image.as_ref());
                if image != item.image.as_ref() {
                    log::debug!("image of {} moved after run {} was queued", key, item.run_id);
                    return self.requeue(key, ctx);
                }
                true
            }
            None if item.input.flags.layout_locked && item.existing_layout.is_some() => {
                log::debug!("skipping {}: slide locked", key);
                return ItemOutcome::Locked;
            }
            None => {
                log::debug!("project of {} no longer loaded; result is only saved", key);
                false
            }
        };

        let layout = if item.has_text() {
            let Some(computer) = ctx.collaborators.layout.clone() else {
                log::warn!("skipping {}: {}", key, EngineError::ComputationUnavailable);
                return ItemOutcome::ComputationUnavailable;
            };
            if item.template.is_none() {
                log::warn!("skipping {}: {}", key, EngineError::MissingTemplate(key.clone()));
                return ItemOutcome::MissingTemplate;
            }

            self.stats.computed += 1;
            match computer.compute(item.template_type, &item.to_request()) {
                Ok(layout) => layout,
                Err(e) => {
                    log::warn!("layout for {} failed: {}", key, e);
                    return ItemOutcome::Failed;
                }
            }
        } else {
            match item.cleared_layout() {
                Some(layout) => layout,
                None => {
                    log::debug!("skipping {}: no text", key);
                    return ItemOutcome::EmptyInput;
                }
            }
        };

        if attached {
            if !apply_layout(item, layout, ctx.store, ctx.persist, ctx.now_ms) {
                return ItemOutcome::ProjectChanged;
            }
            log::info!("applied layout for {} (run {})", key, item.run_id);
        } else {
            let payload = result_payload(item, layout).0;
            ctx.persist.schedule(SavePurpose::Layout, key.clone(), payload, ctx.now_ms);
            log::info!("saved-only layout for {} (run {})", key, item.run_id);
        }
        ItemOutcome::Applied
    }

    /// Replace `key`'s item with one captured from the slide as it is now
    fn requeue(&mut self, key: &SlideKey, ctx: &mut DrainContext<'_>) -> ItemOutcome {
        let templates = ctx.collaborators.templates.as_ref();
        match self.enqueue_for_project(&key.project_id, &[key.slide_index], ctx.store, templates) {
            Ok(_) => ItemOutcome::Requeued,
            Err(e) => {
                log::warn!("could not re-capture {}: {}", key, e);
                ItemOutcome::ProjectChanged
            }
        }
    }
}

/// Save payload for a computed layout, plus the input it was computed from
///
/// Single-block layouts may shrink the body; the input records the size used.
fn result_payload(item: &LiveLayoutWorkItem, layout: LayoutSnapshot) -> (SavePayload, InputSnapshot) {
    let mut input = item.input.clone();
    if item.template_type == TemplateType::Single {
        input.body_font_size_px = layout.body_font_size;
    }
    let payload = SavePayload {
        layout_snapshot: Some(layout),
        input_snapshot: Some(input.clone()),
        generation: item.generation,
    };
    (payload, input)
}

/// Write a computed layout into the store and schedule its save
///
/// Secondary images are taken from the slide as it is now, not from the
/// snapshot the layout was computed from. Returns false when the item's
/// project is no longer loaded.
pub(super) fn apply_layout(
    item: &LiveLayoutWorkItem,
    mut layout: LayoutSnapshot,
    store: &mut SlideStore,
    persist: &mut PersistenceCoordinator,
    now_ms: f64,
) -> bool {
    let key = &item.key;
    let Some(slide) = store.slide_for_key_mut(key) else {
        return false;
    };
    if let Some(current) = &slide.layout_snapshot {
        layout.extra_images = current.extra_images.clone();
    }
    if item.template_type == TemplateType::Single {
        slide.draft_body_font_size_px = layout.body_font_size;
    }
    let (payload, input) = result_payload(item, layout.clone());
    slide.layout_snapshot = Some(layout);
    slide.input_snapshot = Some(input);
    slide.layout_stale = false;

    store.refresh_render_if_active(key.slide_index);
    persist.schedule(SavePurpose::Layout, key.clone(), payload, now_ms);
    true
}
