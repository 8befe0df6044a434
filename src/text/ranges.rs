//! Style range normalization and slicing
//!
//! Ranges arrive from the rich-text input in whatever shape the editor produced
//! them. Normalized ranges are sorted, clamped to the text, non-overlapping and
//! never plain, so every character has exactly one effective style.

use crate::models::{StyleFlags, StyleRange, StyleRun};

/// Number of chars in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Clamp, split and merge ranges so that none overlap
///
/// Where input ranges overlap, the covered characters get the union of their
/// flags. Adjacent segments with identical flags are merged.
pub fn normalize_ranges(ranges: &[StyleRange], text_len: usize) -> Vec<StyleRange> {
    let mut bounds: Vec<usize> = Vec::with_capacity(ranges.len() * 2);
    for range in ranges {
        let start = range.start.min(text_len);
        let end = range.end.min(text_len);
        if end > start && !range.flags().is_plain() {
            bounds.push(start);
            bounds.push(end);
        }
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut normalized: Vec<StyleRange> = Vec::new();
    for pair in bounds.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let flags = ranges
            .iter()
            .filter(|r| r.start.min(text_len) <= start && r.end.min(text_len) >= end)
            .fold(StyleFlags::PLAIN, |acc, r| acc.union(r.flags()));
        if flags.is_plain() {
            continue;
        }
        match normalized.last_mut() {
            Some(last) if last.end == start && last.flags() == flags => last.end = end,
            _ => normalized.push(StyleRange::new(start, end, flags)),
        }
    }
    normalized
}

/// Effective style of the char at `offset` (ranges must be normalized)
pub fn style_at(ranges: &[StyleRange], offset: usize) -> StyleFlags {
    ranges
        .iter()
        .find(|r| r.contains(offset))
        .map(|r| r.flags())
        .unwrap_or(StyleFlags::PLAIN)
}

/// Split `[start, end)` into style runs relative to `start`
///
/// Every character of the span lands in exactly one run; unstyled gaps become
/// plain runs. `ranges` must be normalized.
pub fn runs_for_span(ranges: &[StyleRange], start: usize, end: usize) -> Vec<StyleRun> {
    let mut runs = Vec::new();
    let mut cursor = start;
    while cursor < end {
        let covering = ranges.iter().find(|r| r.contains(cursor));
        let (run_end, flags) = match covering {
            Some(range) => (range.end.min(end), range.flags()),
            None => {
                let next_start = ranges
                    .iter()
                    .map(|r| r.start)
                    .filter(|&s| s > cursor)
                    .min()
                    .unwrap_or(end);
                (next_start.min(end), StyleFlags::PLAIN)
            }
        };
        runs.push(StyleRun::new(cursor - start, run_end - start, flags));
        cursor = run_end;
    }
    runs
}
