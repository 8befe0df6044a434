//! Core WASM API functions
//!
//! The engine is a single WASM-owned session (the canonical source of truth
//! for slide state). JavaScript drives it with commands and a periodic
//! `tick`, and reads back the render state.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;

use crate::config::EngineConfig;
use crate::engine::{Collaborators, ImageTarget, LayoutEditor, ProjectSeed};
use crate::error::PersistError;
use crate::models::{ImagePlacement, LineOverride, ProjectId, TextAlign, TextBlock};
use crate::renderers::{DeterministicLayoutComputer, GlyphWidthTable, LayoutComputer};
use crate::{wasm_error, wasm_info, wasm_warn};

use super::bridge::{flush_outbox, JsFontLoader, JsTemplateRegistry, Outbox, OutboxPersistSink};
use super::helpers::{deserialize, deserialize_or_default, engine_error, now_ms, serialize};
use super::types::{CommandResult, EditResult, TextEdit};

struct EngineSession {
    editor: LayoutEditor,
    outbox: Outbox,
    persist_callback: Function,
}

// WASM-owned engine session
thread_local! {
    static ENGINE: RefCell<Option<EngineSession>> = RefCell::new(None);
}

/// Run `f` against the editor, then hand any new saves to JavaScript
fn with_editor<T>(f: impl FnOnce(&mut LayoutEditor, f64) -> Result<T, JsValue>) -> Result<T, JsValue> {
    let now = now_ms();
    let (result, outbox, callback) = ENGINE.with(|cell| {
        let mut guard = cell.borrow_mut();
        let session = guard
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Engine not initialized"))?;
        let result = f(&mut session.editor, now);
        Ok::<_, JsValue>((result, session.outbox.clone(), session.persist_callback.clone()))
    })?;
    flush_saves(&outbox, &callback, now);
    result
}

/// Deliver queued saves; saves whose callback threw are failed immediately
fn flush_saves(outbox: &Outbox, callback: &Function, now: f64) {
    loop {
        let failed = flush_outbox(outbox, callback);
        if failed.is_empty() {
            return;
        }
        ENGINE.with(|cell| {
            if let Some(session) = cell.borrow_mut().as_mut() {
                for (save_id, e) in failed {
                    wasm_warn!("persist callback failed for save {}: {}", save_id, e);
                    session.editor.complete_save(save_id, Err(e), now);
                }
            }
        });
    }
}

fn layout_computer(glyph_widths: JsValue) -> Result<Option<Rc<dyn LayoutComputer>>, JsValue> {
    if glyph_widths.is_undefined() || glyph_widths.is_null() {
        return Ok(None);
    }
    let table: GlyphWidthTable = deserialize(glyph_widths, "Glyph width deserialization error")?;
    let computer: Rc<dyn LayoutComputer> =
        Rc::new(DeterministicLayoutComputer::new(Rc::new(table), Default::default()));
    Ok(Some(computer))
}

fn command_result(editor: &LayoutEditor, changed: bool) -> Result<JsValue, JsValue> {
    serialize(
        &CommandResult {
            changed,
            render: editor.render_state().clone(),
        },
        "CommandResult serialization error",
    )
}

// ============================================================================
// Session lifecycle
// ============================================================================

/// Create the engine session
///
/// # Parameters
/// - `config_js`: `EngineConfig` (any subset of fields, or undefined)
/// - `template_for`: `(slideIndex) => TemplateGeometry | null`
/// - `ensure_fonts`: `(fonts) => boolean`, true once all fonts are usable
///
/// `template_for` and `ensure_fonts` run while the engine is busy and must not
/// call back into it.
/// - `persist`: `(saveId, payloadJson) => void`, report back with `completeSave`
/// - `glyph_widths_js`: measured `GlyphWidthTable`, or undefined to wire later
#[wasm_bindgen(js_name = initEngine)]
pub fn init_engine(
    config_js: JsValue,
    template_for: Function,
    ensure_fonts: Function,
    persist: Function,
    glyph_widths_js: JsValue,
) -> Result<(), JsValue> {
    let config: EngineConfig = deserialize_or_default(config_js, "Config deserialization error")?;
    let layout = layout_computer(glyph_widths_js)?;
    let outbox: Outbox = Rc::new(RefCell::new(Vec::new()));

    let collaborators = Collaborators {
        layout,
        templates: Box::new(JsTemplateRegistry::new(template_for)),
        fonts: Box::new(JsFontLoader::new(ensure_fonts)),
        persist: Box::new(OutboxPersistSink::new(outbox.clone())),
    };
    let editor = LayoutEditor::new(config, collaborators);
    wasm_info!(
        "initEngine: layout {}",
        if editor.has_layout_computer() { "ready" } else { "pending" }
    );

    ENGINE.with(|cell| {
        *cell.borrow_mut() = Some(EngineSession {
            editor,
            outbox,
            persist_callback: persist,
        });
    });
    Ok(())
}

/// Wire the layout functions once glyph widths are measured
#[wasm_bindgen(js_name = setGlyphWidths)]
pub fn set_glyph_widths(glyph_widths_js: JsValue) -> Result<(), JsValue> {
    let computer = layout_computer(glyph_widths_js)?;
    with_editor(|editor, _| {
        editor.set_layout_computer(computer);
        Ok(())
    })
}

/// End the editing session; queued work and unsaved changes are dropped
#[wasm_bindgen(js_name = teardown)]
pub fn teardown() -> Result<(), JsValue> {
    with_editor(|editor, _| {
        editor.teardown();
        Ok(())
    })
}

// ============================================================================
// Project and slide selection
// ============================================================================

#[wasm_bindgen(js_name = loadProject)]
pub fn load_project(seed_js: JsValue) -> Result<JsValue, JsValue> {
    let seed: ProjectSeed = deserialize(seed_js, "ProjectSeed deserialization error")?;
    wasm_info!("loadProject: {} ({} stored slides)", seed.project_id, seed.slides.len());
    with_editor(|editor, _| {
        editor.load_project(seed);
        command_result(editor, true)
    })
}

#[wasm_bindgen(js_name = setActiveSlide)]
pub fn set_active_slide(slide_index: usize) -> Result<JsValue, JsValue> {
    with_editor(|editor, _| {
        let changed = editor.set_active_slide(slide_index).map_err(engine_error)?;
        command_result(editor, changed)
    })
}

#[wasm_bindgen(js_name = getRenderState)]
pub fn get_render_state() -> Result<JsValue, JsValue> {
    with_editor(|editor, _| serialize(editor.render_state(), "RenderState serialization error"))
}

#[wasm_bindgen(js_name = getSaveStatus)]
pub fn get_save_status() -> Result<JsValue, JsValue> {
    with_editor(|editor, _| serialize(&editor.save_status(), "SaveStatus serialization error"))
}

// ============================================================================
// Text, size and alignment
// ============================================================================

/// Apply a text/style edit to a block of the active slide
#[wasm_bindgen(js_name = editText)]
pub fn edit_text(edit_js: JsValue) -> Result<JsValue, JsValue> {
    let edit: TextEdit = deserialize(edit_js, "TextEdit deserialization error")?;
    with_editor(|editor, now| {
        let class = editor
            .edit_text(edit.block, edit.text, edit.ranges, now)
            .map_err(engine_error)?;
        serialize(
            &EditResult {
                class,
                render: editor.render_state().clone(),
                save_status: editor.save_status(),
            },
            "EditResult serialization error",
        )
    })
}

#[wasm_bindgen(js_name = setFontSize)]
pub fn set_font_size(block_js: JsValue, px: f32) -> Result<JsValue, JsValue> {
    let block: TextBlock = deserialize(block_js, "TextBlock deserialization error")?;
    with_editor(|editor, now| {
        let changed = editor.set_font_size(block, px, now).map_err(engine_error)?;
        command_result(editor, changed)
    })
}

#[wasm_bindgen(js_name = setTextAlign)]
pub fn set_text_align(block_js: JsValue, align_js: JsValue) -> Result<JsValue, JsValue> {
    let block: TextBlock = deserialize(block_js, "TextBlock deserialization error")?;
    let align: TextAlign = deserialize(align_js, "TextAlign deserialization error")?;
    with_editor(|editor, now| {
        let changed = editor.set_text_align(block, align, now).map_err(engine_error)?;
        command_result(editor, changed)
    })
}

// ============================================================================
// Flags
// ============================================================================

#[wasm_bindgen(js_name = setLayoutLocked)]
pub fn set_layout_locked(locked: bool) -> Result<JsValue, JsValue> {
    with_editor(|editor, now| {
        editor.set_layout_locked(locked, now).map_err(engine_error)?;
        command_result(editor, true)
    })
}

#[wasm_bindgen(js_name = setAutoRealignOnImageRelease)]
pub fn set_auto_realign_on_image_release(enabled: bool) -> Result<JsValue, JsValue> {
    with_editor(|editor, now| {
        editor
            .set_auto_realign_on_image_release(enabled, now)
            .map_err(engine_error)?;
        command_result(editor, true)
    })
}

// ============================================================================
// Images
// ============================================================================

/// Place or remove (`null`) the primary image of the active slide
#[wasm_bindgen(js_name = setImage)]
pub fn set_image(image_js: JsValue) -> Result<JsValue, JsValue> {
    let image: Option<ImagePlacement> = deserialize_or_default(image_js, "ImagePlacement deserialization error")?;
    with_editor(|editor, now| {
        editor.set_image(image, now).map_err(engine_error)?;
        command_result(editor, true)
    })
}

#[wasm_bindgen(js_name = beginImageDrag)]
pub fn begin_image_drag(target_js: JsValue) -> Result<(), JsValue> {
    let target: ImageTarget = deserialize(target_js, "ImageTarget deserialization error")?;
    with_editor(|editor, _| editor.begin_image_drag(target).map_err(engine_error))
}

#[wasm_bindgen(js_name = dragImage)]
pub fn drag_image(placement_js: JsValue) -> Result<JsValue, JsValue> {
    let placement: ImagePlacement = deserialize(placement_js, "ImagePlacement deserialization error")?;
    with_editor(|editor, _| {
        editor.drag_image(placement).map_err(engine_error)?;
        command_result(editor, true)
    })
}

#[wasm_bindgen(js_name = endImageDrag)]
pub fn end_image_drag() -> Result<JsValue, JsValue> {
    with_editor(|editor, now| {
        let moved = editor.end_image_drag(now).map_err(engine_error)?;
        command_result(editor, moved)
    })
}

#[wasm_bindgen(js_name = setExtraImages)]
pub fn set_extra_images(images_js: JsValue) -> Result<JsValue, JsValue> {
    let images: Vec<ImagePlacement> = deserialize(images_js, "Extra images deserialization error")?;
    with_editor(|editor, now| {
        editor.set_extra_images(images, now).map_err(engine_error)?;
        command_result(editor, true)
    })
}

// ============================================================================
// Manual line positions
// ============================================================================

#[wasm_bindgen(js_name = setLineOverride)]
pub fn set_line_override(override_js: JsValue) -> Result<JsValue, JsValue> {
    let line_override: LineOverride = deserialize(override_js, "LineOverride deserialization error")?;
    with_editor(|editor, now| {
        editor.set_line_override(line_override, now).map_err(engine_error)?;
        command_result(editor, true)
    })
}

#[wasm_bindgen(js_name = wipeLineOverridesForActiveSlide)]
pub fn wipe_line_overrides_for_active_slide() -> Result<JsValue, JsValue> {
    with_editor(|editor, now| {
        let changed = editor
            .wipe_line_overrides_for_active_slide(now)
            .map_err(engine_error)?;
        command_result(editor, changed)
    })
}

// ============================================================================
// Live layout
// ============================================================================

#[wasm_bindgen(js_name = scheduleLiveLayout)]
pub fn schedule_live_layout(slide_index: usize) -> Result<bool, JsValue> {
    with_editor(|editor, now| editor.schedule_live_layout(slide_index, now).map_err(engine_error))
}

/// Enqueue slides for layout now (e.g. after bulk content generation)
#[wasm_bindgen(js_name = enqueueLiveLayoutForProject)]
pub fn enqueue_live_layout_for_project(project_id: String, indices: Vec<u32>) -> Result<JsValue, JsValue> {
    let project_id = ProjectId::new(project_id);
    let indices: Vec<usize> = indices.into_iter().map(|i| i as usize).collect();
    with_editor(|editor, _| {
        let run_ids = editor
            .enqueue_live_layout_for_project(&project_id, &indices)
            .map_err(engine_error)?;
        serialize(&run_ids, "Run id serialization error")
    })
}

#[wasm_bindgen(js_name = processQueue)]
pub fn process_queue() -> Result<JsValue, JsValue> {
    with_editor(|editor, now| serialize(&editor.process_queue(now), "DrainStep serialization error"))
}

/// Advance timers, the drain and pending saves; call from requestAnimationFrame
#[wasm_bindgen(js_name = tick)]
pub fn tick() -> Result<JsValue, JsValue> {
    with_editor(|editor, now| serialize(&editor.tick(now), "TickReport serialization error"))
}

#[wasm_bindgen(js_name = realignTextForActiveSlide)]
pub fn realign_text_for_active_slide(push_history: bool) -> Result<JsValue, JsValue> {
    with_editor(|editor, now| {
        let changed = editor
            .run_realign_text_for_active_slide(push_history, now)
            .map_err(engine_error)?;
        command_result(editor, changed)
    })
}

// ============================================================================
// Undo
// ============================================================================

#[wasm_bindgen(js_name = pushUndoSnapshot)]
pub fn push_undo_snapshot() -> Result<(), JsValue> {
    with_editor(|editor, _| editor.push_undo_snapshot().map_err(engine_error))
}

#[wasm_bindgen(js_name = undo)]
pub fn undo() -> Result<JsValue, JsValue> {
    wasm_info!("undo called");
    with_editor(|editor, now| {
        editor.undo(now).map_err(engine_error)?;
        command_result(editor, true)
    })
}

// ============================================================================
// Persistence
// ============================================================================

/// Report the outcome of a save handed out through the persist callback
#[wasm_bindgen(js_name = completeSave)]
pub fn complete_save(save_id: f64, ok: bool, message: Option<String>) -> Result<bool, JsValue> {
    let result = if ok {
        Ok(())
    } else {
        let reason = message.unwrap_or_else(|| "save failed".to_string());
        wasm_error!("save {} failed: {}", save_id, reason);
        Err(PersistError::Rejected(reason))
    };
    with_editor(|editor, now| Ok(editor.complete_save(save_id as u64, result, now)))
}
