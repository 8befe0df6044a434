//! Body-only text box layout with auto-shrink
//!
//! When the wrapped body runs past the bottom of the content rect the font size
//! is reduced step by step until the text fits or the floor is reached. The
//! chosen size is reported in `body_font_size` so the editor input can show
//! the authoritative value.

use crate::error::LayoutError;
use crate::models::{clamp_font_size, LayoutSnapshot, TextBlock};

use super::block::{layout_block, BlockFrame, BlockSpec};
use super::layout_engine::{AutoShrinkPolicy, LayoutRequest};
use super::metrics::TextMetrics;

/// Compute the single-block layout for `request`
pub fn compute_single_block_layout(
    request: &LayoutRequest,
    metrics: &dyn TextMetrics,
    policy: &AutoShrinkPolicy,
) -> Result<LayoutSnapshot, LayoutError> {
    let template = request.template.as_ref().ok_or(LayoutError::MissingTemplate)?;
    template.validate()?;
    if request.body.is_empty() {
        return Err(LayoutError::EmptyInput);
    }

    let obstacle = request.image.as_ref().map(|image| image.bounds().inflate(template.padding));
    let frame = BlockFrame {
        content: &template.content_rect,
        obstacle: obstacle.as_ref(),
        line_height_ratio: template.line_height_ratio,
        min_line_span: template.min_line_span,
        metrics,
    };

    let mut size = clamp_font_size(request.body_font_size_px);
    let floor = clamp_font_size(policy.min_font_size_px).min(size);
    let step = if policy.step_px.is_finite() && policy.step_px > 0.0 { policy.step_px } else { 1.0 };

    loop {
        let spec = BlockSpec {
            block: TextBlock::Body,
            text: &request.body,
            ranges: &request.body_ranges,
            font_size_px: size,
            align: request.body_text_align,
        };
        let mut lines = Vec::new();
        let bottom = layout_block(&spec, &frame, template.content_rect.y, &mut lines);
        let overflow = bottom > template.content_rect.bottom();

        if !overflow || size <= floor {
            log::debug!("single-block layout settled at {}px ({} lines)", size, lines.len());
            return Ok(LayoutSnapshot {
                template_id: template.template_id.clone(),
                lines,
                image: request.image.clone(),
                extra_images: request.extra_images.clone(),
                headline_font_size: clamp_font_size(request.headline_font_size_px),
                body_font_size: size,
                overflow,
            });
        }
        size = (size - step).max(floor);
    }
}
