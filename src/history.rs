//! Snapshot-based undo/redo history.
//!
//! A snapshot is pushed *before* each mutation, named after the action about
//! to be applied. Entry 0 is the most recent. Restoring an entry makes its
//! snapshot the present and moves everything newer onto the redo stack;
//! pushing anything new discards the redo stack.

use std::collections::VecDeque;

use crate::constants::DEFAULT_HISTORY_LIMIT;

/// A named snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<T> {
    /// Human-readable name of the action applied after this snapshot
    pub name: String,
    pub state: T,
}

/// Bounded past snapshots plus a redo stack.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T: Clone> {
    /// Past snapshots, most recent first
    entries: VecDeque<HistoryEntry<T>>,
    /// Undone states, next to redo at the end
    redo: Vec<HistoryEntry<T>>,
    /// Maximum history size
    limit: usize,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl<T: Clone> History<T> {
    /// Create a new history with the given maximum size.
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Push a snapshot (call this BEFORE making the change).
    ///
    /// This clears the redo stack since a new change invalidates the redo history.
    pub fn push(&mut self, name: impl Into<String>, state: T) {
        let name = name.into();
        log::debug!("📝 History: pushed '{}'", name);
        self.entries.push_front(HistoryEntry { name, state });
        self.redo.clear();

        // Limit history size
        self.entries.truncate(self.limit);
    }

    /// Make entry `index` the present.
    ///
    /// `present` and every entry newer than `index` move onto the redo stack,
    /// the one closest to the restored state on top. Returns `None` (and
    /// changes nothing) if there is no such entry.
    pub fn restore(&mut self, index: usize, present: T) -> Option<T> {
        if index >= self.entries.len() {
            return None;
        }
        let mut newer: Vec<HistoryEntry<T>> = self.entries.drain(..=index).collect();
        let target = newer.pop()?;

        // Each redo entry carries the name of the action that produced its state
        let mut produced = present;
        for entry in newer {
            self.redo.push(HistoryEntry {
                name: entry.name,
                state: produced,
            });
            produced = entry.state;
        }
        self.redo.push(HistoryEntry {
            name: target.name,
            state: produced,
        });

        Some(target.state)
    }

    /// Redo: returns the next state, or None if nothing to redo.
    ///
    /// The current state goes back onto the past; the rest of the redo stack is kept.
    pub fn redo(&mut self, present: T) -> Option<T> {
        let next = self.redo.pop()?;
        self.entries.push_front(HistoryEntry {
            name: next.name,
            state: present,
        });
        self.entries.truncate(self.limit);
        Some(next.state)
    }

    /// Withdraw the most recent entry without restoring it.
    pub fn pop_latest(&mut self) -> Option<HistoryEntry<T>> {
        self.entries.pop_front()
    }

    /// Past entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry<T>> {
        self.entries.iter()
    }

    /// Names of past entries, most recent first.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Get number of redo steps available
    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Simulate a session: push the old value, then apply a new one.
    fn apply(history: &mut History<i32>, present: &mut i32, name: &str, value: i32) {
        history.push(name, *present);
        *present = value;
    }

    #[test]
    fn test_push_and_limit() {
        let mut history = History::new(3);
        let mut present = 0;
        for i in 1..=5 {
            apply(&mut history, &mut present, &format!("Set {}", i), i);
        }
        assert_eq!(history.len(), 3);
        // Oldest entries (0 and 1) were dropped
        let states: Vec<i32> = history.entries().map(|e| e.state).collect();
        assert_eq!(states, vec![4, 3, 2]);
        assert_eq!(history.names(), vec!["Set 5", "Set 4", "Set 3"]);
    }

    #[test]
    fn test_restore_moves_newer_to_redo() {
        let mut history = History::new(10);
        let mut present = 0;
        apply(&mut history, &mut present, "a", 1);
        apply(&mut history, &mut present, "b", 2);
        apply(&mut history, &mut present, "c", 3);

        // Entry 1 is the state before "b"
        let restored = history.restore(1, present).expect("entry exists");
        assert_eq!(restored, 1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.redo_count(), 2);

        // Redo walks forward one step at a time
        assert_eq!(history.redo(restored), Some(2));
        assert_eq!(history.redo(2), Some(3));
        assert_eq!(history.redo(3), None);
        assert_eq!(history.names(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_restore_missing_entry_changes_nothing() {
        let mut history = History::new(10);
        history.push("a", 0);
        assert_eq!(history.restore(1, 5), None);
        assert_eq!(history.len(), 1);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_push_after_restore_discards_redo() {
        let mut history = History::new(10);
        let mut present = 0;
        apply(&mut history, &mut present, "a", 1);
        apply(&mut history, &mut present, "b", 2);
        present = history.restore(0, present).expect("entry exists");
        assert!(history.can_redo());

        apply(&mut history, &mut present, "c", 7);
        assert!(!history.can_redo());
        assert_eq!(history.names(), vec!["c", "a"]);
    }

    #[test]
    fn test_pop_latest() {
        let mut history = History::new(10);
        history.push("a", 1);
        history.push("b", 2);
        let entry = history.pop_latest().expect("has entry");
        assert_eq!(entry.name, "b");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_zero_limit_keeps_nothing() {
        let mut history = History::new(0);
        history.push("a", 1);
        assert!(history.is_empty());
    }
}
