//! Flowing one text block into positioned lines

use crate::models::{LayoutLine, Rect, StyleRange, TextAlign, TextBlock};
use crate::text::ranges::{normalize_ranges, runs_for_span};

use super::metrics::TextMetrics;
use super::placement::slot_for_band;
use super::wrap::{aligned_x, LineBreaker};

/// What to lay out
pub struct BlockSpec<'a> {
    pub block: TextBlock,
    pub text: &'a str,
    pub ranges: &'a [StyleRange],
    pub font_size_px: f32,
    pub align: TextAlign,
}

/// Where to lay it out
pub struct BlockFrame<'a> {
    pub content: &'a Rect,
    pub obstacle: Option<&'a Rect>,
    pub line_height_ratio: f32,
    pub min_line_span: f32,
    pub metrics: &'a dyn TextMetrics,
}

/// Flow `spec` downward from `top`, appending lines to `out`
///
/// Returns the y coordinate just below the last line (or `top` for an empty
/// block).
pub fn layout_block(spec: &BlockSpec<'_>, frame: &BlockFrame<'_>, top: f32, out: &mut Vec<LayoutLine>) -> f32 {
    if spec.text.is_empty() {
        return top;
    }

    let chars: Vec<char> = spec.text.chars().collect();
    let ranges = normalize_ranges(spec.ranges, chars.len());
    let line_height = frame.metrics.line_height(spec.font_size_px, frame.line_height_ratio);
    let mut breaker = LineBreaker::new(&chars, &ranges, spec.font_size_px, frame.metrics);
    let mut y = top;

    loop {
        let slot = slot_for_band(frame.content, y, line_height, frame.obstacle, frame.min_line_span);
        let Some(wrapped) = breaker.next_line(slot.width) else {
            break;
        };
        out.push(LayoutLine {
            block: spec.block,
            text: chars[wrapped.start..wrapped.end].iter().collect(),
            start: wrapped.start,
            end: wrapped.end,
            x: aligned_x(slot.x, slot.width, wrapped.width, spec.align),
            y: slot.y,
            width: wrapped.width,
            slot_x: slot.x,
            max_width: slot.width,
            line_height,
            base_size: spec.font_size_px,
            align: spec.align,
            runs: runs_for_span(&ranges, wrapped.start, wrapped.end),
            manual_position: false,
        });
        y = slot.y + line_height;
    }
    y
}
