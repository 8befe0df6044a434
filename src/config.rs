//! Engine configuration
//!
//! Passed from JavaScript when the engine is created. Every field has a
//! default, so `{}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::renderers::AutoShrinkPolicy;
use crate::text::PunctuationPolicy;

/// Tunables for scheduling, persistence and layout heuristics
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Quiet period before a live layout for a slide is enqueued
    pub live_layout_debounce_ms: f64,
    /// Quiet period before saving a style-only (no reflow) edit
    pub style_save_debounce_ms: f64,
    /// Quiet period before saving a full layout change
    pub layout_save_debounce_ms: f64,
    /// How long the save error indicator stays up
    pub save_error_reset_ms: f64,
    /// Work items processed before the drain yields
    pub drain_slice_items: usize,
    /// Undo entries kept per slide
    pub undo_limit: usize,
    /// Image moves/resizes at or below this many pixels add no history
    pub image_move_epsilon_px: f32,
    pub image_rotate_epsilon_deg: f32,
    pub punctuation: PunctuationPolicy,
    pub auto_shrink: AutoShrinkPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            live_layout_debounce_ms: 350.0,
            style_save_debounce_ms: 500.0,
            layout_save_debounce_ms: 800.0,
            save_error_reset_ms: 2500.0,
            drain_slice_items: 1,
            undo_limit: 50,
            image_move_epsilon_px: 0.5,
            image_rotate_epsilon_deg: 0.5,
            punctuation: PunctuationPolicy::default(),
            auto_shrink: AutoShrinkPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"liveLayoutDebounceMs": 100, "punctuation": ".!", "autoShrink": {"stepPx": 4}}"#)
                .unwrap();
        assert_eq!(config.live_layout_debounce_ms, 100.0);
        assert_eq!(config.punctuation, PunctuationPolicy::new(".!"));
        assert_eq!(config.auto_shrink.step_px, 4.0);
        assert_eq!(config.auto_shrink.min_font_size_px, 24.0);
        assert_eq!(config.undo_limit, 50);
    }
}
