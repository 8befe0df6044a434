//! Per-slide editing state
//!
//! Drafts are the source of truth for what the user typed. The layout and input
//! snapshots record the last computed geometry and the request that produced it.

use serde::{Deserialize, Serialize};

use super::core::{clamp_font_size, SlideIndex, TextAlign, TextBlock};
use super::snapshot::{EditorFlags, InputSnapshot, LayoutSnapshot, LineOverride};
use super::style::StyleRange;
use super::template::TemplateType;
use crate::undo::UndoHistory;

pub const DEFAULT_HEADLINE_FONT_SIZE_PX: f32 = 72.0;
pub const DEFAULT_BODY_FONT_SIZE_PX: f32 = 40.0;

/// Mutable record for one slide of the loaded project
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlideState {
    pub slide_index: SlideIndex,
    pub draft_headline: String,
    pub draft_body: String,
    pub draft_headline_ranges: Vec<StyleRange>,
    pub draft_body_ranges: Vec<StyleRange>,
    pub draft_headline_font_size_px: f32,
    pub draft_body_font_size_px: f32,
    pub draft_headline_text_align: TextAlign,
    pub draft_body_text_align: TextAlign,
    pub layout_locked: bool,
    pub auto_realign_on_image_release: bool,
    pub line_overrides: Vec<LineOverride>,
    pub layout_snapshot: Option<LayoutSnapshot>,
    pub input_snapshot: Option<InputSnapshot>,
    #[serde(skip)]
    pub layout_history: UndoHistory,
    /// Drafts changed on a locked slide and the layout was left untouched
    #[serde(skip)]
    pub layout_stale: bool,
}

impl SlideState {
    pub fn new(slide_index: SlideIndex) -> Self {
        Self {
            slide_index,
            draft_headline: String::new(),
            draft_body: String::new(),
            draft_headline_ranges: Vec::new(),
            draft_body_ranges: Vec::new(),
            draft_headline_font_size_px: DEFAULT_HEADLINE_FONT_SIZE_PX,
            draft_body_font_size_px: DEFAULT_BODY_FONT_SIZE_PX,
            draft_headline_text_align: TextAlign::Left,
            draft_body_text_align: TextAlign::Left,
            layout_locked: false,
            auto_realign_on_image_release: false,
            line_overrides: Vec::new(),
            layout_snapshot: None,
            input_snapshot: None,
            layout_history: UndoHistory::default(),
            layout_stale: false,
        }
    }

    pub fn text(&self, block: TextBlock) -> &str {
        match block {
            TextBlock::Headline => &self.draft_headline,
            TextBlock::Body => &self.draft_body,
        }
    }

    pub fn ranges(&self, block: TextBlock) -> &[StyleRange] {
        match block {
            TextBlock::Headline => &self.draft_headline_ranges,
            TextBlock::Body => &self.draft_body_ranges,
        }
    }

    pub fn font_size(&self, block: TextBlock) -> f32 {
        match block {
            TextBlock::Headline => self.draft_headline_font_size_px,
            TextBlock::Body => self.draft_body_font_size_px,
        }
    }

    pub fn text_align(&self, block: TextBlock) -> TextAlign {
        match block {
            TextBlock::Headline => self.draft_headline_text_align,
            TextBlock::Body => self.draft_body_text_align,
        }
    }

    pub fn set_text(&mut self, block: TextBlock, text: String, ranges: Vec<StyleRange>) {
        match block {
            TextBlock::Headline => {
                self.draft_headline = text;
                self.draft_headline_ranges = ranges;
            }
            TextBlock::Body => {
                self.draft_body = text;
                self.draft_body_ranges = ranges;
            }
        }
    }

    pub fn set_ranges(&mut self, block: TextBlock, ranges: Vec<StyleRange>) {
        match block {
            TextBlock::Headline => self.draft_headline_ranges = ranges,
            TextBlock::Body => self.draft_body_ranges = ranges,
        }
    }

    /// Set a font size, clamped; returns whether the value changed
    pub fn set_font_size(&mut self, block: TextBlock, px: f32) -> bool {
        let px = clamp_font_size(px);
        let slot = match block {
            TextBlock::Headline => &mut self.draft_headline_font_size_px,
            TextBlock::Body => &mut self.draft_body_font_size_px,
        };
        let changed = *slot != px;
        *slot = px;
        changed
    }

    pub fn set_text_align(&mut self, block: TextBlock, align: TextAlign) -> bool {
        let slot = match block {
            TextBlock::Headline => &mut self.draft_headline_text_align,
            TextBlock::Body => &mut self.draft_body_text_align,
        };
        let changed = *slot != align;
        *slot = align;
        changed
    }

    pub fn has_layout(&self) -> bool {
        self.layout_snapshot.is_some()
    }

    /// Locked slides never auto-reflow once they have a layout
    pub fn is_locked_with_layout(&self) -> bool {
        self.layout_locked && self.has_layout()
    }

    pub fn flags(&self) -> EditorFlags {
        EditorFlags {
            layout_locked: self.layout_locked,
            auto_realign_on_image_release: self.auto_realign_on_image_release,
        }
    }

    /// Describe the current drafts as an input snapshot
    pub fn to_input_snapshot(&self, template_type: TemplateType) -> InputSnapshot {
        InputSnapshot {
            template_type,
            headline: self.draft_headline.clone(),
            body: self.draft_body.clone(),
            headline_ranges: self.draft_headline_ranges.clone(),
            body_ranges: self.draft_body_ranges.clone(),
            headline_font_size_px: self.draft_headline_font_size_px,
            body_font_size_px: self.draft_body_font_size_px,
            headline_text_align: self.draft_headline_text_align,
            body_text_align: self.draft_body_text_align,
            line_overrides: self.line_overrides.clone(),
            flags: self.flags(),
        }
    }

    /// Restore drafts from a previously recorded input snapshot
    pub fn hydrate_from_input(&mut self, input: &InputSnapshot) {
        self.draft_headline = input.headline.clone();
        self.draft_body = input.body.clone();
        self.draft_headline_ranges = input.headline_ranges.clone();
        self.draft_body_ranges = input.body_ranges.clone();
        self.draft_headline_font_size_px = clamp_font_size(input.headline_font_size_px);
        self.draft_body_font_size_px = clamp_font_size(input.body_font_size_px);
        self.draft_headline_text_align = input.headline_text_align;
        self.draft_body_text_align = input.body_text_align;
        self.line_overrides = input.line_overrides.clone();
        self.layout_locked = input.flags.layout_locked;
        self.auto_realign_on_image_release = input.flags.auto_realign_on_image_release;
    }
}

/// A persisted slide row used to hydrate state on project load
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SlideRow {
    pub slide_index: usize,
    /// Raw copy for slides that have never been laid out
    pub headline: Option<String>,
    pub body: Option<String>,
    pub layout_snapshot: Option<LayoutSnapshot>,
    pub input_snapshot: Option<InputSnapshot>,
    pub layout_locked: bool,
    pub auto_realign_on_image_release: bool,
}

impl SlideRow {
    /// Build slide state from this row; input snapshot wins over raw copy
    pub fn hydrate(&self, slide_index: SlideIndex) -> SlideState {
        let mut slide = SlideState::new(slide_index);
        if let Some(input) = &self.input_snapshot {
            slide.hydrate_from_input(input);
        } else {
            slide.draft_headline = self.headline.clone().unwrap_or_default();
            slide.draft_body = self.body.clone().unwrap_or_default();
        }
        slide.layout_locked = self.layout_locked || slide.layout_locked;
        slide.auto_realign_on_image_release =
            self.auto_realign_on_image_release || slide.auto_realign_on_image_release;
        slide.layout_snapshot = self.layout_snapshot.clone();
        slide.input_snapshot = self.input_snapshot.clone();
        slide
    }
}
