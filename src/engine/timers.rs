//! Keyed debounce timers on an explicit clock
//!
//! Timers never fire on their own: the owner calls [`DebounceTimers::take_due`]
//! with the current time. That keeps every firing order reproducible in tests.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Deadline {
    at_ms: f64,
    /// Arm order, used to break ties between equal deadlines
    seq: u64,
}

/// One pending deadline per key; re-arming a key resets it
#[derive(Debug)]
pub struct DebounceTimers<K> {
    deadlines: HashMap<K, Deadline>,
    next_seq: u64,
}

impl<K> Default for DebounceTimers<K> {
    fn default() -> Self {
        Self {
            deadlines: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<K: Clone + Eq + Hash> DebounceTimers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer for `key`
    pub fn arm(&mut self, key: K, now_ms: f64, window_ms: f64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.deadlines.insert(key, Deadline { at_ms: now_ms + window_ms.max(0.0), seq });
    }

    /// Cancel the timer for `key`; returns whether one was pending
    pub fn cancel(&mut self, key: &K) -> bool {
        self.deadlines.remove(key).is_some()
    }

    pub fn is_armed(&self, key: &K) -> bool {
        self.deadlines.contains_key(key)
    }

    pub fn deadline(&self, key: &K) -> Option<f64> {
        self.deadlines.get(key).map(|d| d.at_ms)
    }

    /// Remove and return every key whose deadline is at or before `now_ms`
    ///
    /// Ordered by deadline, then by arm order.
    pub fn take_due(&mut self, now_ms: f64) -> Vec<K> {
        let mut due: Vec<(K, Deadline)> = self
            .deadlines
            .iter()
            .filter(|(_, d)| d.at_ms <= now_ms)
            .map(|(k, d)| (k.clone(), *d))
            .collect();
        due.sort_by(|a, b| a.1.at_ms.total_cmp(&b.1.at_ms).then(a.1.seq.cmp(&b.1.seq)));
        for (key, _) in &due {
            self.deadlines.remove(key);
        }
        due.into_iter().map(|(key, _)| key).collect()
    }

    /// Earliest pending deadline, if any
    pub fn next_deadline(&self) -> Option<f64> {
        self.deadlines.values().map(|d| d.at_ms).min_by(|a, b| a.total_cmp(b))
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}
