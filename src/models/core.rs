//! Core identity types for carousel projects
//!
//! A project always has exactly six slides. Every per-slide map in the engine
//! (debounce timers, run ids, queued work, save tracking) is keyed by the typed
//! composite [`SlideKey`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EngineError;

/// Number of slides in every carousel project
pub const SLIDE_COUNT: usize = 6;

/// Smallest font size a text block may use
pub const MIN_FONT_SIZE_PX: f32 = 24.0;

/// Largest font size a text block may use
pub const MAX_FONT_SIZE_PX: f32 = 120.0;

/// Clamp a requested font size into the supported range
///
/// Non-finite input falls back to the minimum size.
pub fn clamp_font_size(px: f32) -> f32 {
    if !px.is_finite() {
        return MIN_FONT_SIZE_PX;
    }
    px.clamp(MIN_FONT_SIZE_PX, MAX_FONT_SIZE_PX)
}

/// Identifier of a project in backend storage
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position of a slide within its project (0-5)
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct SlideIndex(u8);

impl SlideIndex {
    pub fn new(index: usize) -> Result<Self, EngineError> {
        if index < SLIDE_COUNT {
            Ok(Self(index as u8))
        } else {
            Err(EngineError::InvalidSlideIndex(index))
        }
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }

    /// All six slide positions in order
    pub fn all() -> impl Iterator<Item = SlideIndex> {
        (0..SLIDE_COUNT as u8).map(SlideIndex)
    }
}

impl Default for SlideIndex {
    fn default() -> Self {
        Self(0)
    }
}

impl TryFrom<u8> for SlideIndex {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        SlideIndex::new(value as usize).map_err(|e| e.to_string())
    }
}

impl From<SlideIndex> for u8 {
    fn from(index: SlideIndex) -> u8 {
        index.0
    }
}

impl fmt::Display for SlideIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of one slide: (project, slide index)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct SlideKey {
    pub project_id: ProjectId,
    pub slide_index: SlideIndex,
}

impl SlideKey {
    pub fn new(project_id: ProjectId, slide_index: SlideIndex) -> Self {
        Self { project_id, slide_index }
    }
}

impl fmt::Display for SlideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_id, self.slide_index)
    }
}

/// The two text blocks of a slide
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum TextBlock {
    Headline,
    Body,
}

/// Horizontal alignment of a text block
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// X offset of a line of `width` inside a slot of `slot_width`
    pub fn offset(self, slot_width: f32, width: f32) -> f32 {
        let free = (slot_width - width).max(0.0);
        match self {
            TextAlign::Left => 0.0,
            TextAlign::Center => free / 2.0,
            TextAlign::Right => free,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_index_bounds() {
        assert!(SlideIndex::new(5).is_ok());
        assert_eq!(SlideIndex::new(6), Err(EngineError::InvalidSlideIndex(6)));
        assert_eq!(SlideIndex::all().count(), SLIDE_COUNT);
    }

    #[test]
    fn test_slide_key_display() {
        let key = SlideKey::new(ProjectId::new("p1"), SlideIndex::new(2).unwrap());
        assert_eq!(key.to_string(), "p1:2");
    }

    #[test]
    fn test_clamp_font_size() {
        assert_eq!(clamp_font_size(10.0), MIN_FONT_SIZE_PX);
        assert_eq!(clamp_font_size(500.0), MAX_FONT_SIZE_PX);
        assert_eq!(clamp_font_size(48.0), 48.0);
        assert_eq!(clamp_font_size(f32::NAN), MIN_FONT_SIZE_PX);
    }

    #[test]
    fn test_align_offset() {
        assert_eq!(TextAlign::Left.offset(100.0, 40.0), 0.0);
        assert_eq!(TextAlign::Center.offset(100.0, 40.0), 30.0);
        assert_eq!(TextAlign::Right.offset(100.0, 40.0), 60.0);
        assert_eq!(TextAlign::Right.offset(100.0, 140.0), 0.0);
    }

    #[test]
    fn test_slide_index_serde() {
        let index: SlideIndex = serde_json::from_str("3").unwrap();
        assert_eq!(index.get(), 3);
        assert!(serde_json::from_str::<SlideIndex>("9").is_err());
    }
}
