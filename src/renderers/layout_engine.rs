//! Layout Engine - computes slide layouts from text, styles and template geometry
//!
//! The two layout functions are pure: identical requests always produce
//! identical snapshots. Nothing here reads a clock, draws randomness or iterates
//! a hash map, so results can be diffed and stored in undo history.

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::error::LayoutError;
use crate::models::{
    ImagePlacement, LayoutSnapshot, LineOverride, StyleRange, TemplateGeometry, TemplateType, TextAlign,
    MIN_FONT_SIZE_PX,
};

use super::dual_block::compute_dual_block_layout;
use super::metrics::TextMetrics;
use super::single_block::compute_single_block_layout;

/// Everything a layout function reads
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub template: Option<TemplateGeometry>,
    pub headline: String,
    pub body: String,
    #[serde(default)]
    pub headline_ranges: Vec<StyleRange>,
    #[serde(default)]
    pub body_ranges: Vec<StyleRange>,
    pub headline_font_size_px: f32,
    pub body_font_size_px: f32,
    #[serde(default)]
    pub headline_text_align: TextAlign,
    #[serde(default)]
    pub body_text_align: TextAlign,
    #[serde(default)]
    pub line_overrides: Vec<LineOverride>,
    #[serde(default)]
    pub image: Option<ImagePlacement>,
    #[serde(default)]
    pub extra_images: Vec<ImagePlacement>,
}

fn default_shrink_step() -> f32 {
    2.0
}

fn default_shrink_floor() -> f32 {
    MIN_FONT_SIZE_PX
}

/// How the single-block layout shrinks text that overflows
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutoShrinkPolicy {
    #[serde(default = "default_shrink_step")]
    pub step_px: f32,
    #[serde(default = "default_shrink_floor")]
    pub min_font_size_px: f32,
}

impl Default for AutoShrinkPolicy {
    fn default() -> Self {
        Self {
            step_px: default_shrink_step(),
            min_font_size_px: default_shrink_floor(),
        }
    }
}

/// The layout functions the live layout queue calls
pub trait LayoutComputer {
    fn compute_dual_block_layout(&self, request: &LayoutRequest) -> Result<LayoutSnapshot, LayoutError>;

    fn compute_single_block_layout(&self, request: &LayoutRequest) -> Result<LayoutSnapshot, LayoutError>;

    /// Metrics used for incremental re-measurement outside a full layout
    fn metrics(&self) -> &dyn TextMetrics;

    /// Dispatch on template type
    fn compute(&self, template_type: TemplateType, request: &LayoutRequest) -> Result<LayoutSnapshot, LayoutError> {
        match template_type {
            TemplateType::Dual => self.compute_dual_block_layout(request),
            TemplateType::Single => self.compute_single_block_layout(request),
        }
    }
}

/// Shipped implementation over a [`TextMetrics`] source
pub struct DeterministicLayoutComputer {
    metrics: Rc<dyn TextMetrics>,
    shrink: AutoShrinkPolicy,
}

impl DeterministicLayoutComputer {
    pub fn new(metrics: Rc<dyn TextMetrics>, shrink: AutoShrinkPolicy) -> Self {
        Self { metrics, shrink }
    }
}

impl LayoutComputer for DeterministicLayoutComputer {
    fn compute_dual_block_layout(&self, request: &LayoutRequest) -> Result<LayoutSnapshot, LayoutError> {
        compute_dual_block_layout(request, self.metrics.as_ref())
    }

    fn compute_single_block_layout(&self, request: &LayoutRequest) -> Result<LayoutSnapshot, LayoutError> {
        compute_single_block_layout(request, self.metrics.as_ref(), &self.shrink)
    }

    fn metrics(&self) -> &dyn TextMetrics {
        self.metrics.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rect, TextBlock};
    use crate::renderers::metrics::GlyphWidthTable;

    fn template(template_type: TemplateType) -> TemplateGeometry {
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

    fn request(headline: &str, body: &str) -> LayoutRequest {
        LayoutRequest {
            template: Some(template(TemplateType::Dual)),
            headline: headline.to_string(),
            body: body.to_string(),
            headline_ranges: vec![StyleRange::bold(0, 5)],
            body_ranges: Vec::new(),
            headline_font_size_px: 72.0,
            body_font_size_px: 40.0,
            headline_text_align: TextAlign::Center,
            body_text_align: TextAlign::Left,
            line_overrides: Vec::new(),
            image: None,
            extra_images: Vec::new(),
        }
    }

    fn computer() -> DeterministicLayoutComputer {
        DeterministicLayoutComputer::new(Rc::new(GlyphWidthTable::default()), AutoShrinkPolicy::default())
    }

    const BODY: &str = "Consistency beats intensity. Show up every single day and the results will compound faster than you expect.";

    #[test]
    fn test_dual_block_is_deterministic() {
        let mut req = request("Hello World", BODY);
        req.image = Some(ImagePlacement::new(600.0, 500.0, 400.0, 400.0));
        let a = computer().compute_dual_block_layout(&req).unwrap();
        let b = computer().compute_dual_block_layout(&req).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[test]
    fn test_dual_block_is_lossless() {
        let headline = "Ship it\nthen iterate";
        let body = "Trailing spaces   stay.\n\nBlank lines too\n";
        let layout = computer().compute_dual_block_layout(&request(headline, body)).unwrap();

        assert_eq!(layout.block_text(TextBlock::Headline), headline);
        assert_eq!(layout.block_text(TextBlock::Body), body);
        for line in &layout.lines {
            let run_chars: usize = line.runs.iter().map(|r| r.len()).sum();
            assert_eq!(run_chars, line.text.chars().count());
            assert!(line.width <= line.max_width);
        }
    }

    #[test]
    fn test_body_follows_headline_with_gap() {
        let layout = computer().compute_dual_block_layout(&request("Hello World", "Body")).unwrap();
        let last_headline = layout.lines_for(TextBlock::Headline).last().unwrap();
        let first_body = layout.lines_for(TextBlock::Body).next().unwrap();
        assert_eq!(first_body.y, last_headline.y + last_headline.line_height + 40.0);
        assert!(first_body.runs.iter().all(|r| !r.bold));
    }

    #[test]
    fn test_lines_avoid_image() {
        let mut req = request("", BODY);
        let image = ImagePlacement::new(560.0, 100.0, 440.0, 300.0);
        req.image = Some(image.clone());
        let layout = computer().compute_dual_block_layout(&req).unwrap();
        let obstacle = image.bounds().inflate(20.0);

        for line in &layout.lines {
            if obstacle.overlaps_band(line.y, line.y + line.line_height) {
                assert!(line.slot_x + line.max_width <= obstacle.x);
            }
        }
        assert!(layout.lines[0].max_width < 920.0);
    }

    #[test]
    fn test_line_overrides_applied_after_wrap() {
        let mut req = request("Hello World", BODY);
        let plain = computer().compute_dual_block_layout(&req).unwrap();
        req.line_overrides = vec![LineOverride {
            block: TextBlock::Body,
            line_index: 1,
            x: Some(12.0),
            y: None,
            align: None,
        }];
        let overridden = computer().compute_dual_block_layout(&req).unwrap();

        let plain_body: Vec<_> = plain.lines_for(TextBlock::Body).collect();
        let body: Vec<_> = overridden.lines_for(TextBlock::Body).collect();
        assert_eq!(plain_body.len(), body.len());
        assert_eq!(body[1].x, 12.0);
        assert!(body[1].manual_position);
        assert_eq!(body[1].text, plain_body[1].text);
        assert_eq!(body[0], plain_body[0]);
    }

    #[test]
    fn test_missing_template_refused() {
        let mut req = request("Hello", "");
        req.template = None;
        assert_eq!(computer().compute_dual_block_layout(&req), Err(LayoutError::MissingTemplate));
    }

    #[test]
    fn test_empty_input_refused() {
        assert_eq!(computer().compute_dual_block_layout(&request("", "")), Err(LayoutError::EmptyInput));
        assert_eq!(computer().compute_single_block_layout(&request("Headline only", "")), Err(LayoutError::EmptyInput));
    }

    #[test]
    fn test_single_block_auto_shrinks() {
        let mut req = request("", &BODY.repeat(8));
        req.template = Some(template(TemplateType::Single));
        req.body_font_size_px = 120.0;
        let layout = computer().compute_single_block_layout(&req).unwrap();

        assert!(layout.body_font_size < 120.0);
        assert!(layout.body_font_size >= MIN_FONT_SIZE_PX);
        assert!(layout.lines.iter().all(|l| l.base_size == layout.body_font_size));
        assert_eq!(layout.block_text(TextBlock::Body), req.body);
        if !layout.overflow {
            let last = layout.lines.last().unwrap();
            assert!(last.y + last.line_height <= 1200.0);
        }
    }

    #[test]
    fn test_single_block_keeps_size_when_text_fits() {
        let mut req = request("", "Short body");
        req.template = Some(template(TemplateType::Single));
        req.body_font_size_px = 64.0;
        let layout = computer().compute(TemplateType::Single, &req).unwrap();
        assert_eq!(layout.body_font_size, 64.0);
        assert!(!layout.overflow);
        assert_eq!(layout.line_count(TextBlock::Headline), 0);
    }

    #[cfg(not(target_arch = "wasm32"))]
    mod proptests {
        use super::*;
        use crate::renderers::dual_block::compute_dual_block_layout;
        use crate::renderers::single_block::compute_single_block_layout;
        use proptest::prelude::*;

        fn placements() -> impl Strategy<Value = Option<ImagePlacement>> {
            proptest::option::of(
                (80.0f32..900.0, 100.0f32..1100.0, 60.0f32..500.0, 60.0f32..500.0)
                    .prop_map(|(x, y, w, h)| ImagePlacement::new(x, y, w, h)),
            )
        }

        proptest! {
            #[test]
            fn dual_block_is_deterministic_and_lossless(
                headline in "[a-zA-Z ,.!]{0,60}",
                body in "[a-zA-Z ,.!?\n]{1,300}",
                size in 24.0f32..120.0,
                image in placements(),
            ) {
                let mut req = request(&headline, &body);
                req.body_font_size_px = size;
                req.image = image;
                let metrics = GlyphWidthTable::default();

                let a = compute_dual_block_layout(&req, &metrics).unwrap();
                let b = compute_dual_block_layout(&req, &metrics).unwrap();
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(a.block_text(TextBlock::Headline), headline);
                prop_assert_eq!(a.block_text(TextBlock::Body), body);
                for line in &a.lines {
                    let run_chars: usize = line.runs.iter().map(|r| r.len()).sum();
                    prop_assert_eq!(run_chars, line.text.chars().count());
                }
            }

            #[test]
            fn single_block_is_deterministic_and_lossless(
                body in "[a-zA-Z ,.!?\n]{1,600}",
                size in 24.0f32..120.0,
                image in placements(),
            ) {
                let mut req = request("", &body);
                req.template = Some(template(TemplateType::Single));
                req.body_font_size_px = size;
                req.image = image;
                let metrics = GlyphWidthTable::default();
                let policy = AutoShrinkPolicy::default();

                let a = compute_single_block_layout(&req, &metrics, &policy).unwrap();
                let b = compute_single_block_layout(&req, &metrics, &policy).unwrap();
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(a.block_text(TextBlock::Body), body);
                prop_assert!(a.body_font_size <= size.max(MIN_FONT_SIZE_PX));
                prop_assert!(a.lines.iter().all(|l| l.base_size == a.body_font_size));
            }
        }
    }
}
