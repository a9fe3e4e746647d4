//! Bounded in-memory log of daemon output and lifecycle events.
//!
//! Entries are prefixed with local wall-clock time (`[HH:MM:SS] ...`). When
//! full, the oldest entry is dropped. Readers take the lock shared, so the
//! status view and a log tail never block each other.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock};
use tickfy_types::constants::LOG_CAPACITY;

struct Entries {
    lines: VecDeque<String>,
    /// Total entries ever pushed; the sequence number of the next entry.
    pushed: u64,
}

pub struct LogBuffer {
    entries: RwLock<Entries>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(LOG_CAPACITY)
    }
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(Entries {
                lines: VecDeque::with_capacity(capacity),
                pushed: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a timestamped entry, evicting the oldest when full.
    pub fn push(&self, message: &str) {
        let entry = format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), message);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        while entries.lines.len() >= self.capacity {
            entries.lines.pop_front();
        }
        entries.lines.push_back(entry);
        entries.pushed += 1;
    }

    /// The newest `n` entries, oldest first. `0`, or more than are held,
    /// returns everything.
    pub fn tail(&self, n: usize) -> Vec<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let len = entries.lines.len();
        let n = if n == 0 || n > len { len } else { n };
        entries.lines.iter().skip(len - n).cloned().collect()
    }

    /// Entries pushed since `cursor`, plus the cursor to pass next time.
    /// Start from `0`. Entries already evicted are skipped.
    pub fn since(&self, cursor: u64) -> (Vec<String>, u64) {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let oldest = entries.pushed - entries.lines.len() as u64;
        let skip = cursor.saturating_sub(oldest).min(entries.lines.len() as u64) as usize;
        let lines = entries.lines.iter().skip(skip).cloned().collect();
        (lines, entries.pushed)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .lines
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
