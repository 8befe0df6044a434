//! Editor facade
//!
//! Command/query interface over the single owned state container. Every
//! command takes the current time explicitly; nothing here reads a clock.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::config::EngineConfig;
use crate::error::{EngineError, PersistError};
use crate::models::{
    clamp_font_size, ImagePlacement, LineOverride, ProjectId, SlideIndex, SlideKey, StyleRange, TextAlign, TextBlock,
};
use crate::renderers::LayoutComputer;
use crate::text::reconcile::{realign_in_place, restyle_in_place, wrap_into_existing_lines};
use crate::text::{char_len, classify, normalize_ranges, EditClass};
use crate::undo::UndoEntry;

use super::host::{Collaborators, FontReadiness};
use super::persist::{PersistenceCoordinator, SavePayload, SavePurpose, SaveStatus};
use super::queue::{apply_layout, DrainContext, DrainStep, LiveLayoutQueue, LiveLayoutWorkItem};
use super::store::{ProjectSeed, RenderState, SlideStore};

/// Which image of the active slide a drag applies to
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind", content = "index")]
pub enum ImageTarget {
    Primary,
    /// Index into the layout's extra images (stickers)
    Extra(usize),
}

#[derive(Debug)]
struct ImageDrag {
    slide_index: SlideIndex,
    target: ImageTarget,
    origin: ImagePlacement,
    before: UndoEntry,
}

/// What one call to [`LayoutEditor::tick`] did
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub live_layouts_enqueued: usize,
    pub drain: DrainStep,
    pub saves_fired: usize,
    pub save_status: SaveStatus,
    /// When the next timer is due, if any is pending
    pub next_deadline_ms: Option<f64>,
}

pub struct LayoutEditor {
    config: EngineConfig,
    store: SlideStore,
    queue: LiveLayoutQueue,
    persist: PersistenceCoordinator,
    collaborators: Collaborators,
    drag: Option<ImageDrag>,
}

impl LayoutEditor {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        Self {
            store: SlideStore::new(config.undo_limit),
            queue: LiveLayoutQueue::new(config.live_layout_debounce_ms, config.drain_slice_items),
            persist: PersistenceCoordinator::new(&config),
            collaborators,
            drag: None,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &SlideStore {
        &self.store
    }

    pub fn queue(&self) -> &LiveLayoutQueue {
        &self.queue
    }

    pub fn has_layout_computer(&self) -> bool {
        self.collaborators.layout.is_some()
    }

    /// Wire (or unwire) the layout functions
    pub fn set_layout_computer(&mut self, computer: Option<Rc<dyn LayoutComputer>>) {
        self.collaborators.layout = computer;
    }

    // ------------------------------------------------------------------
    // Project and slide selection
    // ------------------------------------------------------------------

    /// Load a project
    ///
    /// Work for the previous project is kept: edits still inside their
    /// debounce window are snapshotted now, and everything queued is computed
    /// and saved for its own project later without touching the new one.
    pub fn load_project(&mut self, seed: ProjectSeed) {
        let flushed = self
            .queue
            .flush_scheduled(&self.store, self.collaborators.templates.as_ref());
        if flushed > 0 {
            log::debug!("snapshotted {} pending layout(s) before switching project", flushed);
        }
        self.drag = None;
        self.store.load(seed);
    }

    pub fn set_active_slide(&mut self, slide_index: usize) -> Result<bool, EngineError> {
        let slide_index = SlideIndex::new(slide_index)?;
        if self.store.project_id().is_none() {
            return Err(EngineError::ProjectNotLoaded);
        }
        self.drag = None;
        Ok(self.store.set_active_slide(slide_index))
    }

    pub fn render_state(&self) -> &RenderState {
        self.store.render()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.persist.status()
    }

    // ------------------------------------------------------------------
    // Text, size and alignment
    // ------------------------------------------------------------------

    /// Apply a text/style edit of one block of the active slide
    pub fn edit_text(
        &mut self,
        block: TextBlock,
        text: String,
        ranges: Vec<StyleRange>,
        now_ms: f64,
    ) -> Result<EditClass, EngineError> {
        let key = self.store.active_key()?;
        let template_type = self.store.template_type();
        let slide = self.active_slide()?;
        let class = classify(slide.text(block), slide.ranges(block), &text, &ranges, &self.config.punctuation);
        let ranges = normalize_ranges(&ranges, char_len(&text));
        let locked = slide.is_locked_with_layout();
        let layout = slide.layout_snapshot.clone();
        let prev_text = slide.text(block).to_string();
        log::debug!("edit of {:?} on {} classified {:?}", block, key, class);

        match class {
            EditClass::Unchanged => {}
            EditClass::FormattingOnly => match layout.filter(|l| l.block_text(block) == text) {
                Some(layout) => {
                    let next = restyle_in_place(&layout, block, &ranges);
                    let slide = self.active_slide_mut()?;
                    slide.set_ranges(block, ranges);
                    slide.layout_snapshot = Some(next);
                    slide.input_snapshot = Some(slide.to_input_snapshot(template_type));
                    self.store_changed_without_reflow(&key, now_ms);
                }
                None => {
                    self.active_slide_mut()?.set_ranges(block, ranges);
                    self.reflow_or_mark_stale(&key, locked, now_ms)?;
                }
            },
            EditClass::PunctuationOnly | EditClass::ContentChanged => {
                let fitted = match (&layout, &self.collaborators.layout) {
                    (Some(layout), Some(computer)) if class == EditClass::PunctuationOnly => {
                        wrap_into_existing_lines(
                            layout,
                            block,
                            &prev_text,
                            &text,
                            &ranges,
                            &self.config.punctuation,
                            computer.metrics(),
                        )
                    }
                    _ => None,
                };

                match fitted {
                    Some(next) => {
                        let slide = self.active_slide_mut()?;
                        slide.set_text(block, text, ranges);
                        slide.layout_snapshot = Some(next);
                        slide.input_snapshot = Some(slide.to_input_snapshot(template_type));
                        self.store_changed_without_reflow(&key, now_ms);
                    }
                    None => {
                        if !locked && !self.queue.is_scheduled(&key) {
                            self.push_undo_snapshot()?;
                        }
                        self.active_slide_mut()?.set_text(block, text, ranges);
                        self.reflow_or_mark_stale(&key, locked, now_ms)?;
                    }
                }
            }
        }
        Ok(class)
    }

    /// Change a block's font size (clamped to 24-120 px)
    pub fn set_font_size(&mut self, block: TextBlock, px: f32, now_ms: f64) -> Result<bool, EngineError> {
        let key = self.store.active_key()?;
        let slide = self.active_slide()?;
        let locked = slide.is_locked_with_layout();
        if clamp_font_size(px) == slide.font_size(block) {
            return Ok(false);
        }
        if !locked && !self.queue.is_scheduled(&key) {
            self.push_undo_snapshot()?;
        }
        self.active_slide_mut()?.set_font_size(block, px);
        self.reflow_or_mark_stale(&key, locked, now_ms)?;
        Ok(true)
    }

    /// Change a block's alignment; line breaks are kept, x positions re-derived
    pub fn set_text_align(&mut self, block: TextBlock, align: TextAlign, now_ms: f64) -> Result<bool, EngineError> {
        let key = self.store.active_key()?;
        let template_type = self.store.template_type();
        if self.active_slide()?.text_align(block) == align {
            return Ok(false);
        }
        self.push_undo_snapshot()?;

        let slide = self.active_slide_mut()?;
        slide.set_text_align(block, align);
        match slide.layout_snapshot.clone() {
            Some(layout) => {
                slide.layout_snapshot = Some(realign_in_place(&layout, block, align, &slide.line_overrides));
                slide.input_snapshot = Some(slide.to_input_snapshot(template_type));
                self.store_changed_without_reflow(&key, now_ms);
            }
            None => {
                self.queue.schedule(key.slide_index, now_ms, &self.store)?;
            }
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Flags
    // ------------------------------------------------------------------

    /// Lock or unlock auto-reflow; unlocking a stale slide reflows it
    pub fn set_layout_locked(&mut self, locked: bool, now_ms: f64) -> Result<(), EngineError> {
        let key = self.store.active_key()?;
        let slide = self.active_slide_mut()?;
        slide.layout_locked = locked;
        let stale = slide.layout_stale;
        Self::sync_flags(slide);
        self.store_changed_without_reflow(&key, now_ms);
        if locked {
            self.queue.cancel(&key);
        } else if stale {
            self.queue.schedule(key.slide_index, now_ms, &self.store)?;
        }
        Ok(())
    }

    pub fn set_auto_realign_on_image_release(&mut self, enabled: bool, now_ms: f64) -> Result<(), EngineError> {
        let key = self.store.active_key()?;
        let slide = self.active_slide_mut()?;
        slide.auto_realign_on_image_release = enabled;
        Self::sync_flags(slide);
        self.store_changed_without_reflow(&key, now_ms);
        Ok(())
    }

    fn sync_flags(slide: &mut crate::models::SlideState) {
        let flags = slide.flags();
        if let Some(input) = slide.input_snapshot.as_mut() {
            input.flags = flags;
        }
    }

    // ------------------------------------------------------------------
    // Images
    // ------------------------------------------------------------------

    pub fn begin_image_drag(&mut self, target: ImageTarget) -> Result<(), EngineError> {
        let key = self.store.active_key()?;
        let slide = self.active_slide()?;
        let layout = slide.layout_snapshot.as_ref().ok_or_else(|| EngineError::NoLayout(key.clone()))?;
        let origin = Self::image_of(layout, target)
            .cloned()
            .ok_or(EngineError::NoLayout(key.clone()))?;
        let before = UndoEntry::new(slide.layout_snapshot.clone(), slide.input_snapshot.clone())
            .with_drafts(slide.to_input_snapshot(self.store.template_type()));
        self.drag = Some(ImageDrag {
            slide_index: key.slide_index,
            target,
            origin,
            before,
        });
        Ok(())
    }

    /// Move/resize/rotate the dragged image; no history, no save
    pub fn drag_image(&mut self, placement: ImagePlacement) -> Result<(), EngineError> {
        let Some(drag) = &self.drag else {
            return Ok(());
        };
        let (slide_index, target) = (drag.slide_index, drag.target);
        let key = self.store.key_for(slide_index)?;
        let slide = self.store.slide_mut(slide_index).ok_or(EngineError::ProjectNotLoaded)?;
        let mut next = slide.layout_snapshot.clone().ok_or(EngineError::NoLayout(key))?;
        match target {
            ImageTarget::Primary => next.image = Some(placement),
            ImageTarget::Extra(index) => {
                if let Some(image) = next.extra_images.get_mut(index) {
                    *image = placement;
                }
            }
        }
        slide.layout_snapshot = Some(next);
        self.store.refresh_render_if_active(slide_index);
        Ok(())
    }

    /// Finish a drag; returns whether it moved beyond the epsilon
    ///
    /// A significant move records the pre-drag state in history and saves.
    /// Releasing the primary image with auto-realign on reflows immediately.
    pub fn end_image_drag(&mut self, now_ms: f64) -> Result<bool, EngineError> {
        let Some(drag) = self.drag.take() else {
            return Ok(false);
        };
        let key = self.store.key_for(drag.slide_index)?;
        let slide = self.store.slide_mut(drag.slide_index).ok_or(EngineError::ProjectNotLoaded)?;
        let current = slide
            .layout_snapshot
            .as_ref()
            .and_then(|layout| Self::image_of(layout, drag.target))
            .cloned();
        let Some(current) = current else {
            return Ok(false);
        };
        if !current.differs_beyond(
            &drag.origin,
            self.config.image_move_epsilon_px,
            self.config.image_rotate_epsilon_deg,
        ) {
            return Ok(false);
        }

        slide.layout_history.push(drag.before);
        let auto_realign = slide.auto_realign_on_image_release && drag.target == ImageTarget::Primary;
        self.store.refresh_render_if_active(drag.slide_index);
        if auto_realign && drag.slide_index == self.store.active_slide() {
            self.run_realign_text_for_active_slide(false, now_ms)?;
        } else {
            self.schedule_save(SavePurpose::Layout, &key, now_ms);
        }
        Ok(true)
    }

    /// Place, replace or remove the primary image; text reflows around it
    pub fn set_image(&mut self, image: Option<ImagePlacement>, now_ms: f64) -> Result<(), EngineError> {
        let key = self.store.active_key()?;
        let slide = self.active_slide()?;
        let locked = slide.is_locked_with_layout();
        let mut next = slide.layout_snapshot.clone().ok_or_else(|| EngineError::NoLayout(key.clone()))?;
        if next.image == image {
            return Ok(());
        }
        self.push_undo_snapshot()?;
        next.image = image;
        self.active_slide_mut()?.layout_snapshot = Some(next);
        if locked {
            self.store_changed_without_reflow(&key, now_ms);
        } else {
            self.store.refresh_render_if_active(key.slide_index);
            self.queue.schedule(key.slide_index, now_ms, &self.store)?;
        }
        Ok(())
    }

    /// Replace the stickers of the active slide
    pub fn set_extra_images(&mut self, images: Vec<ImagePlacement>, now_ms: f64) -> Result<(), EngineError> {
        let key = self.store.active_key()?;
        let slide = self.active_slide_mut()?;
        let mut next = slide.layout_snapshot.clone().ok_or_else(|| EngineError::NoLayout(key.clone()))?;
        next.extra_images = images;
        slide.layout_snapshot = Some(next);
        self.store_changed_without_reflow(&key, now_ms);
        Ok(())
    }

    fn image_of(layout: &crate::models::LayoutSnapshot, target: ImageTarget) -> Option<&ImagePlacement> {
        match target {
            ImageTarget::Primary => layout.image.as_ref(),
            ImageTarget::Extra(index) => layout.extra_images.get(index),
        }
    }

    // ------------------------------------------------------------------
    // Manual line positions
    // ------------------------------------------------------------------

    /// Set (or replace) the manual override for one line
    pub fn set_line_override(&mut self, line_override: LineOverride, now_ms: f64) -> Result<(), EngineError> {
        let key = self.store.active_key()?;
        let template_type = self.store.template_type();
        self.push_undo_snapshot()?;

        let slide = self.active_slide_mut()?;
        slide
            .line_overrides
            .retain(|o| !o.targets(line_override.block, line_override.line_index));
        slide.line_overrides.push(line_override.clone());
        if let Some(layout) = slide.layout_snapshot.clone() {
            let mut next = layout;
            crate::renderers::dual_block::apply_line_overrides(&mut next.lines, &[line_override]);
            slide.layout_snapshot = Some(next);
        }
        slide.input_snapshot = Some(slide.to_input_snapshot(template_type));
        self.store.refresh_render_if_active(key.slide_index);
        self.schedule_save(SavePurpose::Layout, &key, now_ms);
        Ok(())
    }

    /// Drop every manual override on the active slide and recompute
    pub fn wipe_line_overrides_for_active_slide(&mut self, now_ms: f64) -> Result<bool, EngineError> {
        if self.active_slide()?.line_overrides.is_empty() {
            return Ok(false);
        }
        self.push_undo_snapshot()?;
        self.active_slide_mut()?.line_overrides.clear();
        self.run_realign_text_for_active_slide(false, now_ms)?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Live layout
    // ------------------------------------------------------------------

    pub fn schedule_live_layout(&mut self, slide_index: usize, now_ms: f64) -> Result<bool, EngineError> {
        let slide_index = SlideIndex::new(slide_index)?;
        self.queue.schedule(slide_index, now_ms, &self.store)
    }

    pub fn enqueue_live_layout_for_project(
        &mut self,
        project_id: &ProjectId,
        indices: &[usize],
    ) -> Result<Vec<u64>, EngineError> {
        let indices = indices
            .iter()
            .map(|&index| SlideIndex::new(index))
            .collect::<Result<Vec<_>, _>>()?;
        self.queue
            .enqueue_for_project(project_id, &indices, &self.store, self.collaborators.templates.as_ref())
    }

    pub fn process_queue(&mut self, now_ms: f64) -> DrainStep {
        let mut ctx = DrainContext {
            store: &mut self.store,
            collaborators: &mut self.collaborators,
            persist: &mut self.persist,
            now_ms,
        };
        self.queue.process_queue(&mut ctx)
    }

    /// Advance every timer-driven component to `now_ms`
    pub fn tick(&mut self, now_ms: f64) -> TickReport {
        let live_layouts_enqueued =
            self.queue
                .fire_due(now_ms, &self.store, self.collaborators.templates.as_ref());

        let mut ctx = DrainContext {
            store: &mut self.store,
            collaborators: &mut self.collaborators,
            persist: &mut self.persist,
            now_ms,
        };
        let drain = self.queue.resume(&mut ctx);

        let saves_fired = self
            .persist
            .fire_due(now_ms, &self.store, self.collaborators.persist.as_mut());
        self.persist.expire(now_ms);

        let next_deadline_ms = match (self.queue.next_deadline(), self.persist.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        TickReport {
            live_layouts_enqueued,
            drain,
            saves_fired,
            save_status: self.persist.status(),
            next_deadline_ms,
        }
    }

    /// Recompute the active slide's layout now, ignoring the lock
    ///
    /// Returns Ok(false) when fonts are still loading; nothing changes then.
    pub fn run_realign_text_for_active_slide(&mut self, push_history: bool, now_ms: f64) -> Result<bool, EngineError> {
        let key = self.store.active_key()?;
        let computer = self
            .collaborators
            .layout
            .clone()
            .ok_or(EngineError::ComputationUnavailable)?;

        let fonts = self.store.render_settings().font_specs();
        if self.collaborators.fonts.ensure_loaded(&fonts) == FontReadiness::Pending {
            log::warn!("realign of {} deferred: fonts loading", key);
            return Ok(false);
        }

        let slide = self.active_slide()?;
        let item = LiveLayoutWorkItem::capture(
            key.clone(),
            self.queue.current_run_id(&key) + 1,
            &self.store,
            slide,
            self.collaborators.templates.as_ref(),
        );
        let layout = if item.has_text() {
            if item.template.is_none() {
                return Err(EngineError::MissingTemplate(key));
            }
            computer.compute(item.template_type, &item.to_request())?
        } else {
            item.cleared_layout().ok_or_else(|| EngineError::EmptyInput(key.clone()))?
        };

        if push_history {
            self.push_undo_snapshot()?;
        }
        self.queue.cancel(&key);
        self.queue.bump_run_id(&key);
        apply_layout(&item, layout, &mut self.store, &mut self.persist, now_ms);
        log::info!("realigned {}", key);
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Undo
    // ------------------------------------------------------------------

    /// Record the active slide's current state in its history
    pub fn push_undo_snapshot(&mut self) -> Result<(), EngineError> {
        let key = self.store.active_key()?;
        let template_type = self.store.template_type();
        let slide = self.active_slide_mut()?;
        let entry = UndoEntry::new(slide.layout_snapshot.clone(), slide.input_snapshot.clone())
            .with_drafts(slide.to_input_snapshot(template_type));
        slide.layout_history.push(entry);
        self.store.refresh_render_if_active(key.slide_index);
        Ok(())
    }

    /// Restore the most recent history entry of the active slide and save it
    pub fn undo(&mut self, now_ms: f64) -> Result<(), EngineError> {
        let key = self.store.active_key()?;
        let slide = self.active_slide_mut()?;
        let entry = slide.layout_history.pop().ok_or(EngineError::NoUndoHistory)?;

        if let Some(drafts) = entry.restore_drafts() {
            slide.hydrate_from_input(drafts);
        }
        slide.layout_snapshot = entry.layout_snapshot;
        slide.input_snapshot = entry.input_snapshot;
        slide.layout_stale = false;

        self.drag = None;
        self.queue.cancel(&key);
        self.queue.bump_run_id(&key);
        self.store.refresh_render_if_active(key.slide_index);
        self.schedule_save(SavePurpose::Layout, &key, now_ms);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Report the outcome of a save started through the persist sink
    pub fn complete_save(&mut self, save_id: u64, result: Result<(), PersistError>, now_ms: f64) -> bool {
        self.persist
            .complete_save(save_id, result, now_ms, &self.store, self.collaborators.persist.as_mut())
    }

    /// End the session: all queued work, timers and unsaved state is dropped
    pub fn teardown(&mut self) {
        self.queue.clear();
        self.persist.clear();
        self.store.unload();
        self.drag = None;
        log::info!("editor session torn down");
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn active_slide(&self) -> Result<&crate::models::SlideState, EngineError> {
        self.store
            .slide(self.store.active_slide())
            .ok_or(EngineError::ProjectNotLoaded)
    }

    fn active_slide_mut(&mut self) -> Result<&mut crate::models::SlideState, EngineError> {
        let index = self.store.active_slide();
        self.store.slide_mut(index).ok_or(EngineError::ProjectNotLoaded)
    }

    /// Schedule a reflow, or on a locked slide keep the layout and mark it stale
    fn reflow_or_mark_stale(&mut self, key: &SlideKey, locked: bool, now_ms: f64) -> Result<(), EngineError> {
        if locked {
            self.active_slide_mut()?.layout_stale = true;
            log::debug!("{} locked; layout left stale", key);
            return Ok(());
        }
        self.queue.schedule(key.slide_index, now_ms, &self.store)?;
        Ok(())
    }

    /// Refresh the projection and save a change that needed no reflow
    fn store_changed_without_reflow(&mut self, key: &SlideKey, now_ms: f64) {
        self.store.refresh_render_if_active(key.slide_index);
        self.schedule_save(SavePurpose::StyleOnly, key, now_ms);
    }

    fn schedule_save(&mut self, purpose: SavePurpose, key: &SlideKey, now_ms: f64) {
        let payload = match self.store.slide_for_key(key) {
            Some(slide) => SavePayload {
                layout_snapshot: slide.layout_snapshot.clone(),
                input_snapshot: slide.input_snapshot.clone(),
                generation: self.store.generation(),
            },
            None => SavePayload::default(),
        };
        self.persist.schedule(purpose, key.clone(), payload, now_ms);
    }
}

impl std::fmt::Debug for LayoutEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutEditor")
            .field("project", &self.store.project_id())
            .field("active_slide", &self.store.active_slide())
            .field("queued", &self.queue.len())
            .field("save_status", &self.persist.status())
            .finish()
    }
}
