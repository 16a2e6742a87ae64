//! Storage port for Profile Generic row buffers.
//!
//! The profile core only talks to this trait; a file- or database-backed
//! adaptor can be injected in place of the in-memory default. Callers hold
//! the profile's buffer mutex around every call, so implementations need
//! no locking of their own.

use cosem_core::Value;
use std::collections::VecDeque;

#[cfg(test)]
use mockall::automock;

/// One captured row: one value per configured capture object.
pub type Row = Vec<Value>;

/// Abstract row store with append/evict/range access.
#[cfg_attr(test, automock)]
pub trait ProfileBuffer: Send {
    fn append(&mut self, row: Row);

    /// Drop the oldest row, if any.
    fn evict_oldest(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    /// Up to `count` rows starting at the 0-based index `start`, clamped
    /// at the end of the buffer. Rows come back in capture order.
    fn range(&self, start: usize, count: usize) -> Vec<Row>;

    fn all(&self) -> Vec<Row> {
        self.range(0, self.len())
    }
}

/// The in-memory reference store.
#[derive(Debug, Default)]
pub struct MemoryBuffer {
    rows: VecDeque<Row>,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileBuffer for MemoryBuffer {
    fn append(&mut self, row: Row) {
        self.rows.push_back(row);
    }

    fn evict_oldest(&mut self) {
        self.rows.pop_front();
    }

    fn len(&self) -> usize {
        self.rows.len()
    }

    fn clear(&mut self) {
        self.rows.clear();
    }

    fn range(&self, start: usize, count: usize) -> Vec<Row> {
        if start >= self.rows.len() {
            return Vec::new();
        }
        let end = start.saturating_add(count).min(self.rows.len());
        self.rows.range(start..end).cloned().collect()
    }
}
