//! Working memory: a short FIFO of raw interaction text.
//!
//! Independent of long-term memory; nothing here is persisted.

use std::collections::VecDeque;

/// Entries rendered by [`WorkingMemory::to_context_string`].
const CONTEXT_ENTRIES: usize = 5;

/// Bounded buffer of the latest interactions, oldest first.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    capacity: usize,
    entries: VecDeque<String>,
}

impl WorkingMemory {
    /// Create an empty buffer. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an entry, evicting the oldest when full.
    pub fn add(&mut self, entry: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.into());
    }

    /// The last `n` entries, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<String> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Every entry, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Render the latest entries for a prompt.
    #[must_use]
    pub fn to_context_string(&self) -> String {
        if self.entries.is_empty() {
            return "No recent memories.".to_string();
        }
        self.recent(CONTEXT_ENTRIES)
            .iter()
            .map(|e| format!("- {e}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for WorkingMemory {
    fn default() -> Self {
        Self::new(10)
    }
}
