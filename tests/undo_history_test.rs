// Undo history round trips and image drag history

mod common;

use carousel_layout_wasm::engine::ImageTarget;
use carousel_layout_wasm::{
    EngineConfig, EngineError, ImagePlacement, LineOverride, TemplateType, TextAlign, TextBlock,
};
use common::Harness;

fn laid_out_with_headline() -> Harness {
    let mut h = Harness::new(TemplateType::Dual);
    h.editor
        .edit_text(TextBlock::Headline, "Build momentum".to_string(), vec![], 0.0)
        .unwrap();
    h.editor
        .edit_text(
            TextBlock::Body,
            "Small wins every day add up to something you can be proud of.".to_string(),
            vec![],
            10.0,
        )
        .unwrap();
    h.editor.tick(400.0);
    assert!(h.layout(0).is_some());
    h
}

#[test]
fn test_undo_restores_exact_pre_mutation_state() {
    let mut h = laid_out_with_headline();
    let layout_before = h.slide(0).layout_snapshot.clone();
    let input_before = h.slide(0).input_snapshot.clone();

    assert!(h.editor.set_font_size(TextBlock::Headline, 110.0, 500.0).unwrap());
    h.editor.tick(900.0);
    assert_ne!(h.slide(0).layout_snapshot, layout_before);

    h.editor.undo(1000.0).unwrap();
    assert_eq!(h.slide(0).layout_snapshot, layout_before);
    assert_eq!(h.slide(0).input_snapshot, input_before);
    assert_eq!(h.slide(0).draft_headline_font_size_px, 72.0);
    assert_eq!(h.editor.render_state().layout_snapshot, layout_before);
}

#[test]
fn test_undo_wins_over_queued_reflow() {
    let mut h = laid_out_with_headline();
    let layout_before = h.slide(0).layout_snapshot.clone();

    h.editor.set_font_size(TextBlock::Body, 60.0, 500.0).unwrap();
    h.editor.undo(600.0).unwrap();
    h.editor.tick(2000.0);

    assert_eq!(h.slide(0).layout_snapshot, layout_before);
    assert_eq!(h.slide(0).draft_body_font_size_px, 40.0);
}

#[test]
fn test_undo_is_persisted() {
    let mut h = laid_out_with_headline();
    h.editor.push_undo_snapshot().unwrap();
    h.editor.set_text_align(TextBlock::Body, TextAlign::Right, 500.0).unwrap();
    h.editor.undo(600.0).unwrap();
    h.editor.tick(1500.0);

    let last = h.saves().pop().unwrap();
    assert_eq!(last.input_snapshot.unwrap().body_text_align, TextAlign::Left);
}

#[test]
fn test_empty_history_reports_error() {
    let mut h = Harness::new(TemplateType::Dual);
    assert_eq!(h.editor.undo(0.0), Err(EngineError::NoUndoHistory));
}

#[test]
fn test_history_is_cleared_on_slide_switch() {
    let mut h = laid_out_with_headline();
    assert!(h.slide(0).layout_history.depth() > 0);

    h.editor.set_active_slide(1).unwrap();
    h.editor.set_active_slide(0).unwrap();
    assert_eq!(h.slide(0).layout_history.depth(), 0);
    assert_eq!(h.editor.undo(0.0), Err(EngineError::NoUndoHistory));
}

#[test]
fn test_history_is_bounded() {
    let config = EngineConfig {
        undo_limit: 3,
        ..Default::default()
    };
    let mut h = Harness::with_config(TemplateType::Dual, config);
    h.editor.edit_text(TextBlock::Body, "Bounded".to_string(), vec![], 0.0).unwrap();
    h.editor.tick(350.0);
    for (i, align) in [TextAlign::Center, TextAlign::Right, TextAlign::Left, TextAlign::Center]
        .into_iter()
        .enumerate()
    {
        h.editor.set_text_align(TextBlock::Body, align, 400.0 + i as f64).unwrap();
    }
    assert_eq!(h.slide(0).layout_history.depth(), 3);
}

#[test]
fn test_small_image_nudge_adds_no_history() {
    let mut h = laid_out_with_headline();
    h.editor
        .set_image(Some(ImagePlacement::new(600.0, 600.0, 300.0, 300.0)), 500.0)
        .unwrap();
    h.editor.tick(900.0);
    let depth = h.slide(0).layout_history.depth();

    h.editor.begin_image_drag(ImageTarget::Primary).unwrap();
    h.editor
        .drag_image(ImagePlacement::new(600.3, 600.2, 300.0, 300.0))
        .unwrap();
    assert!(!h.editor.end_image_drag(1000.0).unwrap());
    assert_eq!(h.slide(0).layout_history.depth(), depth);
}

#[test]
fn test_image_move_records_history_and_undo_restores_position() {
    let mut h = laid_out_with_headline();
    h.editor
        .set_image(Some(ImagePlacement::new(600.0, 600.0, 300.0, 300.0)), 500.0)
        .unwrap();
    h.editor.tick(900.0);
    let before = h.slide(0).layout_snapshot.clone();

    h.editor.begin_image_drag(ImageTarget::Primary).unwrap();
    h.editor
        .drag_image(ImagePlacement::new(100.0, 650.0, 300.0, 300.0))
        .unwrap();
    assert_eq!(h.editor.render_state().layout_snapshot.as_ref().unwrap().image.as_ref().unwrap().x, 100.0);
    assert!(h.editor.end_image_drag(1000.0).unwrap());

    h.editor.undo(1100.0).unwrap();
    assert_eq!(h.slide(0).layout_snapshot, before);
}

#[test]
fn test_auto_realign_on_release_reflows_around_image() {
    let mut h = laid_out_with_headline();
    h.editor.set_auto_realign_on_image_release(true, 450.0).unwrap();
    h.editor
        .set_image(Some(ImagePlacement::new(560.0, 100.0, 440.0, 400.0)), 500.0)
        .unwrap();
    h.editor.tick(900.0);
    let narrowed = h.layout(0).unwrap().lines[0].max_width;
    assert!(narrowed < 920.0);

    h.editor.begin_image_drag(ImageTarget::Primary).unwrap();
    h.editor
        .drag_image(ImagePlacement::new(560.0, 900.0, 440.0, 300.0))
        .unwrap();
    assert!(h.editor.end_image_drag(1000.0).unwrap());

    let layout = h.layout(0).unwrap();
    assert_eq!(layout.lines[0].max_width, 920.0);
    assert_eq!(layout.image.as_ref().unwrap().y, 900.0);
}

#[test]
fn test_extra_images_survive_concurrent_reflow() {
    let mut h = laid_out_with_headline();
    h.editor.edit_text(TextBlock::Body, "A fresh body".to_string(), vec![], 500.0).unwrap();
    let sticker = ImagePlacement::new(40.0, 40.0, 80.0, 80.0);
    h.editor.set_extra_images(vec![sticker.clone()], 600.0).unwrap();
    h.editor.tick(850.0);

    let layout = h.layout(0).unwrap();
    assert_eq!(layout.block_text(TextBlock::Body), "A fresh body");
    assert_eq!(layout.extra_images, vec![sticker]);
}

#[test]
fn test_line_override_and_wipe() {
    let mut h = laid_out_with_headline();
    let original_x = h.layout(0).unwrap().lines_for(TextBlock::Body).next().unwrap().x;

    h.editor
        .set_line_override(
            LineOverride {
                block: TextBlock::Body,
                line_index: 0,
                x: Some(300.0),
                y: None,
                align: None,
            },
            500.0,
        )
        .unwrap();
    let moved = h.layout(0).unwrap().lines_for(TextBlock::Body).next().unwrap().clone();
    assert_eq!(moved.x, 300.0);
    assert!(moved.manual_position);

    assert!(h.editor.wipe_line_overrides_for_active_slide(600.0).unwrap());
    let restored = h.layout(0).unwrap().lines_for(TextBlock::Body).next().unwrap();
    assert_eq!(restored.x, original_x);
    assert!(!restored.manual_position);
    assert!(h.slide(0).line_overrides.is_empty());
    assert!(!h.editor.wipe_line_overrides_for_active_slide(700.0).unwrap());
}

#[test]
fn test_realign_ignores_lock_and_clears_stale_flag() {
    let mut h = laid_out_with_headline();
    h.editor.set_layout_locked(true, 450.0).unwrap();
    h.editor.edit_text(TextBlock::Headline, "Changed title".to_string(), vec![], 500.0).unwrap();
    assert!(h.slide(0).layout_stale);

    assert!(h.editor.run_realign_text_for_active_slide(true, 600.0).unwrap());
    let layout = h.layout(0).unwrap();
    assert_eq!(layout.block_text(TextBlock::Headline), "Changed title");
    assert!(!h.slide(0).layout_stale);
    assert!(h.slide(0).layout_locked);
}

#[test]
fn test_realign_waits_for_fonts() {
    let mut h = laid_out_with_headline();
    h.fonts_ready.set(false);
    assert_eq!(h.editor.run_realign_text_for_active_slide(true, 500.0), Ok(false));
}
