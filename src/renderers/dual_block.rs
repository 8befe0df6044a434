//! Headline + body layout
//!
//! The headline flows from the top of the content rect, the body follows after
//! the template's block gap. Both blocks wrap around the primary image. Manual
//! per-line overrides are applied last so they never influence line breaks.

use crate::error::LayoutError;
use crate::models::{clamp_font_size, LayoutLine, LayoutSnapshot, LineOverride, TextBlock};

use super::block::{layout_block, BlockFrame, BlockSpec};
use super::layout_engine::LayoutRequest;
use super::metrics::TextMetrics;

/// Compute the dual-block layout for `request`
pub fn compute_dual_block_layout(
    request: &LayoutRequest,
    metrics: &dyn TextMetrics,
) -> Result<LayoutSnapshot, LayoutError> {
    let template = request.template.as_ref().ok_or(LayoutError::MissingTemplate)?;
    template.validate()?;
    if request.headline.is_empty() && request.body.is_empty() {
        return Err(LayoutError::EmptyInput);
    }

    let headline_font_size = clamp_font_size(request.headline_font_size_px);
    let body_font_size = clamp_font_size(request.body_font_size_px);
    let obstacle = request.image.as_ref().map(|image| image.bounds().inflate(template.padding));
    let frame = BlockFrame {
        content: &template.content_rect,
        obstacle: obstacle.as_ref(),
        line_height_ratio: template.line_height_ratio,
        min_line_span: template.min_line_span,
        metrics,
    };

    let mut lines = Vec::new();
    let headline = BlockSpec {
        block: TextBlock::Headline,
        text: &request.headline,
        ranges: &request.headline_ranges,
        font_size_px: headline_font_size,
        align: request.headline_text_align,
    };
    let mut y = layout_block(&headline, &frame, template.content_rect.y, &mut lines);

    if !request.headline.is_empty() && !request.body.is_empty() {
        y += template.block_gap;
    }

    let body = BlockSpec {
        block: TextBlock::Body,
        text: &request.body,
        ranges: &request.body_ranges,
        font_size_px: body_font_size,
        align: request.body_text_align,
    };
    y = layout_block(&body, &frame, y, &mut lines);

    apply_line_overrides(&mut lines, &request.line_overrides);

    Ok(LayoutSnapshot {
        template_id: template.template_id.clone(),
        lines,
        image: request.image.clone(),
        extra_images: request.extra_images.clone(),
        headline_font_size,
        body_font_size,
        overflow: y > template.content_rect.bottom(),
    })
}

/// Apply manual overrides by (block, line index within block)
pub fn apply_line_overrides(lines: &mut [LayoutLine], overrides: &[LineOverride]) {
    if overrides.is_empty() {
        return;
    }
    for block in [TextBlock::Headline, TextBlock::Body] {
        let block_lines = lines.iter_mut().filter(|line| line.block == block);
        for (index, line) in block_lines.enumerate() {
            for line_override in overrides.iter().filter(|o| o.targets(block, index)) {
                line_override.apply(line);
            }
        }
    }
}
