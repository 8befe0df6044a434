//! Edit triage between re-styling, wrap-in-place and full reflow
//!
//! A full reflow repositions every line and re-runs image avoidance, which is
//! visually disruptive. Toggling bold or fixing a comma does not need that: the
//! existing line structure is reused whenever the edit cannot move a wrap
//! boundary.

use serde::{Deserialize, Serialize};

use crate::models::{LayoutSnapshot, LineOverride, StyleRange, TextAlign, TextBlock};
use crate::renderers::dual_block::apply_line_overrides;
use crate::renderers::metrics::TextMetrics;
use crate::renderers::wrap::{fits, measure_span};

use super::ranges::{char_len, normalize_ranges, runs_for_span};

/// Default set of characters treated as wrap-neutral punctuation
pub const DEFAULT_PUNCTUATION: &str = ".,;:!?'\"…-–—()";

/// How an edit relates to the previous text and ranges
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EditClass {
    /// Same text, same effective styles
    Unchanged,
    /// Same text, different styles: re-paint runs in place
    FormattingOnly,
    /// Only punctuation was inserted or removed: wrap into existing lines
    PunctuationOnly,
    /// Anything else: full reflow
    ContentChanged,
}

/// Characters whose insertion or removal never moves a word boundary
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct PunctuationPolicy {
    chars: String,
}

impl Default for PunctuationPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PUNCTUATION)
    }
}

impl PunctuationPolicy {
    pub fn new(chars: impl Into<String>) -> Self {
        Self { chars: chars.into() }
    }

    pub fn is_punctuation(&self, ch: char) -> bool {
        !ch.is_whitespace() && self.chars.contains(ch)
    }

    fn strip(&self, text: &str) -> String {
        text.chars().filter(|&ch| !self.is_punctuation(ch)).collect()
    }
}

/// Classify an edit of one text field
pub fn classify(
    prev_text: &str,
    prev_ranges: &[StyleRange],
    next_text: &str,
    next_ranges: &[StyleRange],
    policy: &PunctuationPolicy,
) -> EditClass {
    if prev_text == next_text {
        let len = char_len(next_text);
        if normalize_ranges(prev_ranges, len) == normalize_ranges(next_ranges, len) {
            EditClass::Unchanged
        } else {
            EditClass::FormattingOnly
        }
    } else if policy.strip(prev_text) == policy.strip(next_text) {
        EditClass::PunctuationOnly
    } else {
        EditClass::ContentChanged
    }
}

/// Rebuild the style runs of `block` without touching line geometry
pub fn restyle_in_place(layout: &LayoutSnapshot, block: TextBlock, ranges: &[StyleRange]) -> LayoutSnapshot {
    let text_len = char_len(&layout.block_text(block));
    let normalized = normalize_ranges(ranges, text_len);
    let mut next = layout.clone();
    for line in next.lines.iter_mut().filter(|line| line.block == block) {
        line.runs = runs_for_span(&normalized, line.start, line.end);
    }
    next
}

/// Change the alignment of `block` and re-derive x positions
///
/// Line breaks are unaffected by alignment, so no re-wrap is needed. Lines
/// with manual positions keep them; per-line overrides are re-applied.
pub fn realign_in_place(
    layout: &LayoutSnapshot,
    block: TextBlock,
    align: TextAlign,
    overrides: &[LineOverride],
) -> LayoutSnapshot {
    let mut next = layout.clone();
    for line in next.lines.iter_mut().filter(|line| line.block == block) {
        line.align = align;
        line.realign();
    }
    apply_line_overrides(&mut next.lines, overrides);
    next
}

/// Fit a punctuation-only edit into the existing line structure
///
/// Returns `None` when the layout does not match `prev_text`, the edit is not
/// punctuation-only, or an edited line no longer fits its slot. Callers fall
/// back to a full reflow in that case.
pub fn wrap_into_existing_lines(
    layout: &LayoutSnapshot,
    block: TextBlock,
    prev_text: &str,
    next_text: &str,
    ranges: &[StyleRange],
    policy: &PunctuationPolicy,
    metrics: &dyn TextMetrics,
) -> Option<LayoutSnapshot> {
    if layout.line_count(block) == 0 || layout.block_text(block) != prev_text {
        return None;
    }

    let prev: Vec<char> = prev_text.chars().collect();
    let next: Vec<char> = next_text.chars().collect();
    let boundary = map_boundaries(&prev, &next, policy)?;
    let normalized = normalize_ranges(ranges, next.len());

    let mut out = layout.clone();
    for line in out.lines.iter_mut().filter(|line| line.block == block) {
        let start = boundary[line.start];
        let end = boundary[line.end];
        let text: String = next[start..end].iter().collect();
        if text != line.text {
            let width = measure_span(&next, &normalized, start, end, line.base_size, metrics);
            if !fits(width, line.max_width) {
                log::debug!("punctuation edit overflows line {}..{}, needs reflow", start, end);
                return None;
            }
            line.text = text;
            line.width = width;
            line.realign();
        }
        line.start = start;
        line.end = end;
        line.runs = runs_for_span(&normalized, start, end);
    }
    Some(out)
}

/// Map every old char boundary to its position in the new text
///
/// Inserted punctuation attaches to the line before it, except when it follows
/// whitespace (an opening quote), where it joins the line after.
fn map_boundaries(prev: &[char], next: &[char], policy: &PunctuationPolicy) -> Option<Vec<usize>> {
    let mut boundary = vec![0; prev.len() + 1];
    let (mut i, mut j) = (0, 0);
    let mut leading_insert: Option<usize> = None;

    while i < prev.len() {
        if j < next.len() && prev[i] == next[j] {
            boundary[i] = leading_insert.take().unwrap_or(j);
            i += 1;
            j += 1;
        } else if j < next.len() && policy.is_punctuation(next[j]) {
            if leading_insert.is_none() && (j == 0 || next[j - 1].is_whitespace()) {
                leading_insert = Some(j);
            }
            j += 1;
        } else if policy.is_punctuation(prev[i]) {
            boundary[i] = leading_insert.take().unwrap_or(j);
            i += 1;
        } else {
            return None;
        }
    }
    if next[j..].iter().any(|&ch| !policy.is_punctuation(ch)) {
        return None;
    }
    boundary[prev.len()] = next.len();
    Some(boundary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_formatting_only() {
        let class = classify(
            "Hello World",
            &[StyleRange::bold(0, 5)],
            "Hello World",
            &[StyleRange::bold(0, 11)],
            &PunctuationPolicy::default(),
        );
        assert_eq!(class, EditClass::FormattingOnly);
    }

    #[test]
    fn test_classify_equivalent_ranges_unchanged() {
        let class = classify(
            "Hello",
            &[StyleRange::bold(0, 2), StyleRange::bold(2, 5)],
            "Hello",
            &[StyleRange::bold(0, 5)],
            &PunctuationPolicy::default(),
        );
        assert_eq!(class, EditClass::Unchanged);
    }

    #[test]
    fn test_classify_punctuation_only() {
        let policy = PunctuationPolicy::default();
        assert_eq!(classify("Great job!", &[], "Great job!!", &[], &policy), EditClass::PunctuationOnly);
        assert_eq!(classify("Great job", &[], "Great, job", &[], &policy), EditClass::PunctuationOnly);
        assert_eq!(classify("Great job", &[], "Great jobs", &[], &policy), EditClass::ContentChanged);
        assert_eq!(classify("Great job", &[], "Great  job", &[], &policy), EditClass::ContentChanged);
    }

    #[test]
    fn test_custom_policy() {
        let policy = PunctuationPolicy::new("#");
        assert_eq!(classify("tag", &[], "#tag", &[], &policy), EditClass::PunctuationOnly);
        assert_eq!(classify("job", &[], "job!", &[], &policy), EditClass::ContentChanged);
    }

    #[test]
    fn test_map_boundaries_attaches_trailing_insert_to_previous_line() {
        let policy = PunctuationPolicy::default();
        let prev: Vec<char> = "ab cd".chars().collect();
        let next: Vec<char> = "ab! cd".chars().collect();
        let boundary = map_boundaries(&prev, &next, &policy).unwrap();
        // line "ab " / "cd" split at old offset 3
        assert_eq!(boundary[3], 4);
        assert_eq!(boundary[5], 6);
    }

    #[test]
    fn test_map_boundaries_attaches_opening_quote_to_next_line() {
        let policy = PunctuationPolicy::default();
        let prev: Vec<char> = "ab cd".chars().collect();
        let next: Vec<char> = "ab \"cd".chars().collect();
        let boundary = map_boundaries(&prev, &next, &policy).unwrap();
        assert_eq!(boundary[3], 3);
    }

    #[test]
    fn test_map_boundaries_handles_removal() {
        let policy = PunctuationPolicy::default();
        let prev: Vec<char> = "a, b".chars().collect();
        let next: Vec<char> = "a b".chars().collect();
        let boundary = map_boundaries(&prev, &next, &policy).unwrap();
        assert_eq!(boundary[3], 2);
        assert_eq!(boundary[4], 3);
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod proptests {
    use super::*;
    use crate::models::{Rect, TemplateGeometry, TemplateType};
    use crate::renderers::dual_block::compute_dual_block_layout;
    use crate::renderers::{GlyphWidthTable, LayoutRequest};
    use proptest::prelude::*;
    use proptest::sample::{select, Index};

    /// Narrow column so most texts wrap onto several lines
    fn laid_out(body: &str) -> LayoutSnapshot {
        let request = LayoutRequest {
            template: Some(TemplateGeometry {
                template_id: "tpl".to_string(),
                template_type: TemplateType::Dual,
                canvas: Rect::new(0.0, 0.0, 1080.0, 1350.0),
                content_rect: Rect::new(80.0, 100.0, 400.0, 1100.0),
                padding: 20.0,
                block_gap: 40.0,
                line_height_ratio: 1.2,
                min_line_span: 120.0,
            }),
            headline: String::new(),
            body: body.to_string(),
            headline_ranges: Vec::new(),
            body_ranges: Vec::new(),
            headline_font_size_px: 72.0,
            body_font_size_px: 40.0,
            headline_text_align: TextAlign::Left,
            body_text_align: TextAlign::Left,
            line_overrides: Vec::new(),
            image: None,
            extra_images: Vec::new(),
        };
        compute_dual_block_layout(&request, &GlyphWidthTable::default()).unwrap()
    }

    fn words() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-z]{1,8}[,.!]?", 1..30).prop_map(|words| words.join(" "))
    }

    fn insertions() -> impl Strategy<Value = Vec<(Index, char)>> {
        prop::collection::vec((any::<Index>(), select(vec![',', '.', '!', '?', '\''])), 1..5)
    }

    fn insert_all(text: &str, insertions: &[(Index, char)]) -> String {
        let mut chars: Vec<char> = text.chars().collect();
        for (at, ch) in insertions {
            let at = at.index(chars.len() + 1);
            chars.insert(at, *ch);
        }
        chars.into_iter().collect()
    }

    proptest! {
        #[test]
        fn boundaries_survive_punctuation_insertions(prev in words(), inserts in insertions()) {
            let policy = PunctuationPolicy::default();
            let next = insert_all(&prev, &inserts);
            let prev: Vec<char> = prev.chars().collect();
            let next: Vec<char> = next.chars().collect();

            let boundary = map_boundaries(&prev, &next, &policy);
            prop_assert!(boundary.is_some());
            let boundary = boundary.unwrap();
            prop_assert_eq!(boundary.len(), prev.len() + 1);
            prop_assert_eq!(boundary[0], 0);
            prop_assert_eq!(boundary[prev.len()], next.len());
            for i in 0..prev.len() {
                prop_assert!(boundary[i] <= boundary[i + 1]);
                let old: String = prev[i..i + 1].iter().collect();
                let new: String = next[boundary[i]..boundary[i + 1]].iter().collect();
                prop_assert_eq!(policy.strip(&old), policy.strip(&new));
            }
        }

        #[test]
        fn punctuation_edits_keep_line_structure(prev in words(), inserts in insertions()) {
            let policy = PunctuationPolicy::default();
            let metrics = GlyphWidthTable::default();
            let next = insert_all(&prev, &inserts);
            prop_assert_eq!(classify(&prev, &[], &next, &[], &policy), EditClass::PunctuationOnly);

            // Insertion into the layout of `prev`, removal from the layout of `next`
            for (from, to) in [(&prev, &next), (&next, &prev)] {
                let layout = laid_out(from);
                let wrapped = wrap_into_existing_lines(&layout, TextBlock::Body, from, to, &[], &policy, &metrics);
                if let Some(out) = wrapped {
                    prop_assert_eq!(out.line_count(TextBlock::Body), layout.line_count(TextBlock::Body));
                    prop_assert_eq!(out.block_text(TextBlock::Body), to.clone());
                    for (before, after) in layout.lines.iter().zip(&out.lines) {
                        prop_assert_eq!(before.y, after.y);
                        prop_assert_eq!(before.slot_x, after.slot_x);
                        prop_assert_eq!(before.max_width, after.max_width);
                        prop_assert!(fits(after.width, after.max_width));
                    }
                }
            }
        }
    }
}
