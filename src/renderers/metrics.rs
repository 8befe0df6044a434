//! Text metrics used for line wrapping
//!
//! Glyph shaping and kerning belong to the browser. The layout functions only
//! need per-character advances, which JavaScript measures once per font and
//! hands over as a [`GlyphWidthTable`]. Characters without a measurement fall
//! back to a fixed category table so results stay deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::StyleFlags;

/// Source of character advances and line heights
pub trait TextMetrics {
    /// Horizontal advance of `ch` at `font_size_px` in the given style
    fn advance(&self, ch: char, font_size_px: f32, style: StyleFlags) -> f32;

    /// Height of one line of text
    fn line_height(&self, font_size_px: f32, ratio: f32) -> f32 {
        font_size_px * ratio
    }
}

fn default_bold_scale() -> f32 {
    1.06
}

fn default_italic_scale() -> f32 {
    1.0
}

/// Advances in em units measured by JavaScript
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GlyphWidthTable {
    /// Measured advances keyed by character, in em
    #[serde(default)]
    pub widths: BTreeMap<char, f32>,
    /// Multiplier applied to bold characters
    #[serde(default = "default_bold_scale")]
    pub bold_scale: f32,
    #[serde(default = "default_italic_scale")]
    pub italic_scale: f32,
}

impl Default for GlyphWidthTable {
    fn default() -> Self {
        Self {
            widths: BTreeMap::new(),
            bold_scale: default_bold_scale(),
            italic_scale: default_italic_scale(),
        }
    }
}

impl GlyphWidthTable {
    pub fn with_widths(widths: impl IntoIterator<Item = (char, f32)>) -> Self {
        Self {
            widths: widths.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Em advance for characters JavaScript did not measure
    pub fn fallback_em(ch: char) -> f32 {
        match ch {
            '\n' | '\r' => 0.0,
            ' ' | '\t' => 0.28,
            '.' | ',' | ';' | ':' | '!' | '\'' | '|' | 'i' | 'l' | 'j' => 0.28,
            '-' | '(' | ')' | '"' | 'f' | 't' | 'r' => 0.34,
            'm' | 'w' => 0.82,
            'M' | 'W' => 0.9,
            c if c.is_ascii_uppercase() => 0.66,
            c if c.is_ascii_digit() => 0.56,
            c if c.is_ascii_lowercase() => 0.52,
            c if is_wide(c) => 1.0,
            _ => 0.6,
        }
    }

    fn em(&self, ch: char) -> f32 {
        self.widths.get(&ch).copied().unwrap_or_else(|| Self::fallback_em(ch))
    }
}

impl TextMetrics for GlyphWidthTable {
    fn advance(&self, ch: char, font_size_px: f32, style: StyleFlags) -> f32 {
        let mut advance = self.em(ch) * font_size_px;
        if style.bold {
            advance *= self.bold_scale;
        }
        if style.italic {
            advance *= self.italic_scale;
        }
        advance
    }
}

/// East Asian wide and emoji ranges
fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1FAFF
        | 0x20000..=0x3FFFD)
}
