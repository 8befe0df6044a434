//! Layout and input snapshots
//!
//! A [`LayoutSnapshot`] is the renderable geometry of a slide. An
//! [`InputSnapshot`] is the declarative request that produced it. Both are
//! value types: every new layout is a fresh value, never an in-place mutation
//! of one that history may still reference.

use serde::{Deserialize, Serialize};

use super::core::{TextAlign, TextBlock};
use super::style::{StyleFlags, StyleRange};
use super::template::{Rect, TemplateType};

/// A styled run of characters within one line
///
/// Offsets are relative to the start of the line.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyleRun {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl StyleRun {
    pub fn new(start: usize, end: usize, flags: StyleFlags) -> Self {
        Self {
            start,
            end,
            bold: flags.bold,
            italic: flags.italic,
            underline: flags.underline,
        }
    }

    pub fn flags(&self) -> StyleFlags {
        StyleFlags {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// One wrapped line of a text block
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayoutLine {
    pub block: TextBlock,
    /// Exact characters of the block covered by this line, including the
    /// whitespace or newline the line ends with
    pub text: String,
    /// Char offset of the first character within the block text
    pub start: usize,
    /// Char offset one past the last character
    pub end: usize,
    pub x: f32,
    pub y: f32,
    /// Visible width (trailing whitespace excluded)
    pub width: f32,
    /// Left edge of the horizontal slot the line was placed in
    pub slot_x: f32,
    /// Width of that slot; the line never exceeds it
    pub max_width: f32,
    pub line_height: f32,
    pub base_size: f32,
    pub align: TextAlign,
    pub runs: Vec<StyleRun>,
    /// Position came from a manual override
    #[serde(default)]
    pub manual_position: bool,
}

impl LayoutLine {
    /// Re-derive `x` from the slot, width and alignment
    pub fn realign(&mut self) {
        if !self.manual_position {
            self.x = self.slot_x + self.align.offset(self.max_width, self.width);
        }
    }
}

/// Placement of the primary image or a sticker
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Clockwise rotation in degrees around the image center
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub background_removed: bool,
    #[serde(default)]
    pub url: Option<String>,
}

impl ImagePlacement {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
            background_removed: false,
            url: None,
        }
    }

    /// Axis-aligned bounds of the (possibly rotated) image
    pub fn bounds(&self) -> Rect {
        if self.rotation == 0.0 {
            return Rect::new(self.x, self.y, self.width, self.height);
        }
        let radians = self.rotation.to_radians();
        let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
        let w = self.width * cos + self.height * sin;
        let h = self.width * sin + self.height * cos;
        let cx = self.x + self.width / 2.0;
        let cy = self.y + self.height / 2.0;
        Rect::new(cx - w / 2.0, cy - h / 2.0, w, h)
    }

    /// Whether position, size or rotation differ by more than the thresholds
    pub fn differs_beyond(&self, other: &ImagePlacement, epsilon_px: f32, epsilon_deg: f32) -> bool {
        (self.x - other.x).abs() > epsilon_px
            || (self.y - other.y).abs() > epsilon_px
            || (self.width - other.width).abs() > epsilon_px
            || (self.height - other.height).abs() > epsilon_px
            || (self.rotation - other.rotation).abs() > epsilon_deg
    }
}

/// Manual position/alignment for one line of a block
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineOverride {
    pub block: TextBlock,
    /// Index of the line within its block
    pub line_index: usize,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub align: Option<TextAlign>,
}

impl LineOverride {
    pub fn targets(&self, block: TextBlock, line_index: usize) -> bool {
        self.block == block && self.line_index == line_index
    }

    /// Apply to a computed line; returns whether anything changed
    pub fn apply(&self, line: &mut LayoutLine) -> bool {
        let before = (line.x, line.y, line.align);
        if let Some(align) = self.align {
            line.align = align;
            line.realign();
        }
        if let Some(x) = self.x {
            line.x = x;
            line.manual_position = true;
        }
        if let Some(y) = self.y {
            line.y = y;
            line.manual_position = true;
        }
        before != (line.x, line.y, line.align)
    }
}

/// Editor flags recorded with an input snapshot
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorFlags {
    pub layout_locked: bool,
    pub auto_realign_on_image_release: bool,
}

/// Computed, renderable geometry of one slide
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub template_id: String,
    pub lines: Vec<LayoutLine>,
    #[serde(default)]
    pub image: Option<ImagePlacement>,
    #[serde(default)]
    pub extra_images: Vec<ImagePlacement>,
    pub headline_font_size: f32,
    pub body_font_size: f32,
    /// Text runs past the bottom of the content rect
    #[serde(default)]
    pub overflow: bool,
}

impl LayoutSnapshot {
    pub fn lines_for(&self, block: TextBlock) -> impl Iterator<Item = &LayoutLine> {
        self.lines.iter().filter(move |line| line.block == block)
    }

    /// Concatenated text of a block's lines
    pub fn block_text(&self, block: TextBlock) -> String {
        self.lines_for(block).map(|line| line.text.as_str()).collect()
    }

    pub fn line_count(&self, block: TextBlock) -> usize {
        self.lines_for(block).count()
    }
}

/// Declarative request that produced a layout snapshot
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InputSnapshot {
    #[serde(default)]
    pub template_type: TemplateType,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
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
    pub flags: EditorFlags,
}
