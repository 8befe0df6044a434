//! Greedy word wrapping over char offsets
//!
//! The breaker hands out one line at a time because the available width of a
//! line depends on where it lands vertically (an image may narrow it). Lines
//! are lossless: trailing whitespace and the newline that ends a paragraph stay
//! in the line they terminate, so concatenating line texts rebuilds the input.

use crate::models::{StyleRange, TextAlign};
use crate::text::ranges::style_at;

use super::metrics::TextMetrics;

/// Widths are compared after rounding up to this fraction of a pixel
const WIDTH_QUANTUM: f32 = 64.0;

/// Whether a line of `width` fits in `available`
///
/// The width is rounded *up* to 1/64 px first, so a line that would overflow
/// by a sub-pixel margin breaks earlier instead.
pub fn fits(width: f32, available: f32) -> bool {
    (width * WIDTH_QUANTUM).ceil() / WIDTH_QUANTUM <= available
}

fn is_inline_space(ch: char) -> bool {
    ch.is_whitespace() && ch != '\n'
}

/// A line produced by the breaker
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WrappedLine {
    pub start: usize,
    pub end: usize,
    /// Visible width, trailing whitespace excluded
    pub width: f32,
}

/// Visible width of `chars[start..end]` (trailing whitespace excluded)
pub fn measure_span(
    chars: &[char],
    ranges: &[StyleRange],
    start: usize,
    end: usize,
    font_size_px: f32,
    metrics: &dyn TextMetrics,
) -> f32 {
    let mut visible_end = end.min(chars.len());
    while visible_end > start && chars[visible_end - 1].is_whitespace() {
        visible_end -= 1;
    }
    (start..visible_end)
        .map(|i| metrics.advance(chars[i], font_size_px, style_at(ranges, i)))
        .sum()
}

/// Hands out wrapped lines of one text block
pub struct LineBreaker<'a> {
    chars: &'a [char],
    ranges: &'a [StyleRange],
    font_size_px: f32,
    metrics: &'a dyn TextMetrics,
    pos: usize,
    /// Text ended with a newline: one empty line is still owed
    trailing_empty: bool,
}

impl<'a> LineBreaker<'a> {
    pub fn new(
        chars: &'a [char],
        ranges: &'a [StyleRange],
        font_size_px: f32,
        metrics: &'a dyn TextMetrics,
    ) -> Self {
        Self {
            chars,
            ranges,
            font_size_px,
            metrics,
            pos: 0,
            trailing_empty: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.chars.len() && !self.trailing_empty
    }

    fn advance_at(&self, index: usize) -> f32 {
        self.metrics
            .advance(self.chars[index], self.font_size_px, style_at(self.ranges, index))
    }

    /// Break the next line so that it fits in `max_width`
    ///
    /// Returns `None` once the text is exhausted. Always makes progress: a
    /// single character wider than the line still gets a line of its own.
    pub fn next_line(&mut self, max_width: f32) -> Option<WrappedLine> {
        let len = self.chars.len();
        if self.pos >= len {
            if self.trailing_empty {
                self.trailing_empty = false;
                return Some(WrappedLine { start: len, end: len, width: 0.0 });
            }
            return None;
        }

        let start = self.pos;
        let mut pen = 0.0f32;
        let mut visible = 0.0f32;
        // (end offset, visible width) of the last legal break
        let mut last_break: Option<(usize, f32)> = None;
        let mut index = start;

        while index < len {
            let ch = self.chars[index];
            if ch == '\n' {
                return Some(self.finish(start, index + 1, visible));
            }

            let advance = self.advance_at(index);
            if is_inline_space(ch) {
                pen += advance;
                index += 1;
                if index >= len || !is_inline_space(self.chars[index]) {
                    last_break = Some((index, visible));
                }
                continue;
            }

            let next_visible = pen + advance;
            if !fits(next_visible, max_width) {
                if let Some((end, width)) = last_break {
                    return Some(self.finish(start, end, width));
                }
                // Word wider than the line: break inside it
                return Some(if index > start {
                    self.finish(start, index, visible)
                } else {
                    self.finish(start, index + 1, next_visible)
                });
            }
            pen = next_visible;
            visible = next_visible;
            index += 1;
        }

        Some(self.finish(start, len, visible))
    }

    fn finish(&mut self, start: usize, end: usize, width: f32) -> WrappedLine {
        self.pos = end;
        if end == self.chars.len() && end > 0 && self.chars[end - 1] == '\n' {
            self.trailing_empty = true;
        }
        WrappedLine { start, end, width }
    }
}

/// Wrap a whole block into lines of a single fixed width
pub fn wrap_fixed_width(
    chars: &[char],
    ranges: &[StyleRange],
    font_size_px: f32,
    max_width: f32,
    metrics: &dyn TextMetrics,
) -> Vec<WrappedLine> {
    let mut breaker = LineBreaker::new(chars, ranges, font_size_px, metrics);
    let mut lines = Vec::new();
    while let Some(line) = breaker.next_line(max_width) {
        lines.push(line);
    }
    lines
}

/// X position of a line inside its slot
pub fn aligned_x(slot_x: f32, slot_width: f32, width: f32, align: TextAlign) -> f32 {
    slot_x + align.offset(slot_width, width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderers::metrics::GlyphWidthTable;

    /// Every char is 10px wide at size 10
    fn mono() -> GlyphWidthTable {
        let mut table = GlyphWidthTable::default();
        for ch in (' '..='~').chain(['\n']) {
            table.widths.insert(ch, if ch == '\n' { 0.0 } else { 1.0 });
        }
        table
    }

    fn texts(text: &str, lines: &[WrappedLine]) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        lines.iter().map(|l| chars[l.start..l.end].iter().collect()).collect()
    }

    #[test]
    fn test_word_wrap_keeps_trailing_space() {
        let text = "Hello world foo";
        let chars: Vec<char> = text.chars().collect();
        let lines = wrap_fixed_width(&chars, &[], 10.0, 110.0, &mono());

        assert_eq!(texts(text, &lines), vec!["Hello world ", "foo"]);
        assert_eq!(lines[0].width, 110.0);
    }

    #[test]
    fn test_sub_pixel_overflow_breaks_early() {
        let text = "ab cd";
        let chars: Vec<char> = text.chars().collect();
        // "ab cd" is exactly 50px; 49.99 must not fit
        let lines = wrap_fixed_width(&chars, &[], 10.0, 49.99, &mono());
        assert_eq!(texts(text, &lines), vec!["ab ", "cd"]);

        let lines = wrap_fixed_width(&chars, &[], 10.0, 50.0, &mono());
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_long_word_breaks_by_char() {
        let text = "abcdefgh";
        let chars: Vec<char> = text.chars().collect();
        let lines = wrap_fixed_width(&chars, &[], 10.0, 30.0, &mono());
        assert_eq!(texts(text, &lines), vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_newlines_are_kept_and_trailing_newline_adds_line() {
        let text = "ab\n\ncd\n";
        let chars: Vec<char> = text.chars().collect();
        let lines = wrap_fixed_width(&chars, &[], 10.0, 500.0, &mono());
        assert_eq!(texts(text, &lines), vec!["ab\n", "\n", "cd\n", ""]);
        assert_eq!(texts(text, &lines).concat(), text);
    }

    #[test]
    fn test_zero_width_still_progresses() {
        let text = "abc";
        let chars: Vec<char> = text.chars().collect();
        let lines = wrap_fixed_width(&chars, &[], 10.0, 0.0, &mono());
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_empty_text_has_no_lines() {
        assert!(wrap_fixed_width(&[], &[], 10.0, 100.0, &mono()).is_empty());
    }

    #[test]
    fn test_measure_span_ignores_trailing_space() {
        let chars: Vec<char> = "ab  ".chars().collect();
        assert_eq!(measure_span(&chars, &[], 0, 4, 10.0, &mono()), 20.0);
    }
}
