use crate::models::{InputSnapshot, LayoutSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A full (layout, input) pair captured before a layout-altering action
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoEntry {
    pub layout_snapshot: Option<LayoutSnapshot>,
    pub input_snapshot: Option<InputSnapshot>,
    /// Draft fields at capture time, which may be ahead of `input_snapshot`
    #[serde(default)]
    pub drafts: Option<InputSnapshot>,
}

impl UndoEntry {
    pub fn new(layout_snapshot: Option<LayoutSnapshot>, input_snapshot: Option<InputSnapshot>) -> Self {
        Self {
            layout_snapshot,
            input_snapshot,
            drafts: None,
        }
    }

    pub fn with_drafts(mut self, drafts: InputSnapshot) -> Self {
        self.drafts = Some(drafts);
        self
    }

    /// The drafts to restore: captured drafts, else the input snapshot
    pub fn restore_drafts(&self) -> Option<&InputSnapshot> {
        self.drafts.as_ref().or(self.input_snapshot.as_ref())
    }
}

/// Bounded append-only stack of snapshots for one slide
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UndoHistory {
    entries: VecDeque<UndoEntry>,
    /// Maximum number of entries to keep in history
    max_size: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(50)
    }
}

impl PartialEq for UndoHistory {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl UndoHistory {
    /// Create a new history with specified maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size: max_size.max(1),
        }
    }

    /// Push an entry, dropping the oldest once the limit is reached
    pub fn push(&mut self, entry: UndoEntry) {
        // Consecutive identical snapshots add nothing to undo
        if self.entries.back() == Some(&entry) {
            return;
        }
        self.entries.push_back(entry);
        if self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
    }

    /// Remove and return the most recent entry
    pub fn pop(&mut self) -> Option<UndoEntry> {
        self.entries.pop_back()
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entries.back()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size.max(1);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> UndoEntry {
        UndoEntry::new(
            Some(LayoutSnapshot {
                template_id: id.to_string(),
                ..Default::default()
            }),
            None,
        )
    }

    #[test]
    fn test_push_pop_order() {
        let mut history = UndoHistory::new(10);
        history.push(entry("a"));
        history.push(entry("b"));

        assert_eq!(history.depth(), 2);
        assert_eq!(history.pop(), Some(entry("b")));
        assert_eq!(history.pop(), Some(entry("a")));
        assert!(!history.can_undo());
        assert_eq!(history.pop(), None);
    }

    #[test]
    fn test_duplicate_push_collapses() {
        let mut history = UndoHistory::new(10);
        history.push(entry("a"));
        history.push(entry("a"));
        assert_eq!(history.depth(), 1);
    }

    #[test]
    fn test_max_size_enforcement() {
        let mut history = UndoHistory::new(3);
        for id in ["a", "b", "c", "d", "e"] {
            history.push(entry(id));
        }

        assert_eq!(history.depth(), 3);
        assert_eq!(history.peek(), Some(&entry("e")));
        history.pop();
        history.pop();
        assert_eq!(history.pop(), Some(entry("c")));
    }

    #[test]
    fn test_shrinking_limit_drops_oldest() {
        let mut history = UndoHistory::new(5);
        for id in ["a", "b", "c"] {
            history.push(entry(id));
        }
        history.set_max_size(1);
        assert_eq!(history.depth(), 1);
        assert_eq!(history.peek(), Some(&entry("c")));
    }
}
