//! Bounded per-agent task history
//!
//! History is a ring buffer: once `capacity` entries are held, each new entry
//! evicts the oldest. The completed-task counter is kept separately and never
//! decreases, so it equals the history length only until the first eviction.

use crate::protocol::messages::HistoryEntry;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct TaskHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
    completed: u64,
}

impl TaskHistory {
    /// Create an empty history; a zero capacity is treated as one
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            completed: 0,
        }
    }

    /// Append an entry, evicting the oldest when full
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.completed += 1;
    }

    /// Total entries ever appended
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Entries currently retained
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retained entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
