//! Character style ranges
//!
//! Offsets are counted in Unicode scalar values (Rust `char`s) of the text
//! field the range belongs to. A range covers `[start, end)`.

use serde::{Deserialize, Serialize};

/// Bold/italic/underline flags of a span of text
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(default)]
pub struct StyleFlags {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl StyleFlags {
    pub const PLAIN: StyleFlags = StyleFlags { bold: false, italic: false, underline: false };

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline
    }

    /// Flags set in either operand
    pub fn union(self, other: StyleFlags) -> StyleFlags {
        StyleFlags {
            bold: self.bold || other.bold,
            italic: self.italic || other.italic,
            underline: self.underline || other.underline,
        }
    }
}

/// A styled `[start, end)` interval over a text field
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StyleRange {
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl StyleRange {
    pub fn new(start: usize, end: usize, flags: StyleFlags) -> Self {
        Self {
            start,
            end,
            bold: flags.bold,
            italic: flags.italic,
            underline: flags.underline,
        }
    }

    /// Bold-only range
    pub fn bold(start: usize, end: usize) -> Self {
        Self::new(start, end, StyleFlags { bold: true, ..StyleFlags::PLAIN })
    }

    pub fn flags(&self) -> StyleFlags {
        StyleFlags {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}
