//! Bounded query history
//!
//! Accepted queries, most recent first, capped at a fixed capacity.
//! In-memory only; nothing outlives the process.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One accepted query
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub query: String,
    pub at: DateTime<Utc>,
}

/// Append-bounded, newest-first query log
#[derive(Debug)]
pub struct QueryHistory {
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl QueryHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn append(&mut self, query: &str) {
        self.entries.insert(
            0,
            HistoryEntry {
                query: query.to_string(),
                at: Utc::now(),
            },
        );
        self.entries.truncate(self.capacity);
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.clone()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut history = QueryHistory::new(20);
        history.append("first");
        history.append("second");

        let entries = history.list();
        assert_eq!(entries[0].query, "second");
        assert_eq!(entries[1].query, "first");
    }

    #[test]
    fn test_capped_at_capacity() {
        let mut history = QueryHistory::new(20);
        for i in 0..25 {
            history.append(&format!("query {i}"));
        }

        assert_eq!(history.len(), 20);
        assert_eq!(history.list()[0].query, "query 24");
        // The five oldest fell off the end.
        assert_eq!(history.list()[19].query, "query 5");
    }

    #[test]
    fn test_clear() {
        let mut history = QueryHistory::new(20);
        history.append("q");
        history.clear();
        assert!(history.is_empty());
    }
}
