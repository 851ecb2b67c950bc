//! Undo/redo over serialized content snapshots.
//!
//! Provides:
//! - `UndoManager` trait implemented by anything that can rewind itself
//! - `History` - bounded past/future stacks of `UndoEntry` snapshots

use std::collections::VecDeque;

use tracing::debug;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track state.
pub trait UndoManager {
    fn can_undo(&self) -> bool;

    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    fn clear_history(&mut self);
}

/// One recorded change: the full serialized content on either side of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry {
    pub before: String,
    pub after: String,
}

/// Linear snapshot history.
///
/// `current` is the last content the history knows about. Recording
/// compares against it, so a caret move or a no-op command never produces
/// an entry.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<UndoEntry>,
    future: Vec<UndoEntry>,
    current: String,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(String::new(), 100)
    }
}

impl History {
    pub fn new(initial: impl Into<String>, capacity: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            current: initial.into(),
            capacity: capacity.max(1),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Records `content` if it differs from the current snapshot. A new
    /// entry discards everything that could have been redone.
    pub fn record(&mut self, content: &str) -> bool {
        if content == self.current {
            return false;
        }
        let entry = UndoEntry {
            before: std::mem::replace(&mut self.current, content.to_string()),
            after: content.to_string(),
        };
        self.future.clear();
        self.past.push_back(entry);
        while self.past.len() > self.capacity {
            self.past.pop_front();
        }
        debug!(target: "tapestry::history", depth = self.past.len(), "recorded");
        true
    }

    /// Replaces the current snapshot without recording an entry.
    pub fn reset(&mut self, content: &str) {
        self.current = content.to_string();
    }

    /// Steps back one entry and returns the content to show.
    pub fn step_back(&mut self) -> Option<&str> {
        let entry = self.past.pop_back()?;
        self.current = entry.before.clone();
        self.future.push(entry);
        debug!(target: "tapestry::history", depth = self.past.len(), "undo");
        Some(&self.current)
    }

    /// Steps forward one entry and returns the content to show.
    pub fn step_forward(&mut self) -> Option<&str> {
        let entry = self.future.pop()?;
        self.current = entry.after.clone();
        self.past.push_back(entry);
        debug!(target: "tapestry::history", depth = self.past.len(), "redo");
        Some(&self.current)
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_content_is_not_recorded() {
        let mut history = History::new("<p>a</p>", 10);
        assert!(!history.record("<p>a</p>"));
        assert_eq!(history.undo_depth(), 0);
        assert!(history.record("<p>ab</p>"));
        assert!(!history.record("<p>ab</p>"));
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn undo_then_redo_walks_snapshots() {
        let mut history = History::new("a", 10);
        history.record("ab");
        history.record("abc");
        assert_eq!(history.step_back(), Some("ab"));
        assert_eq!(history.step_back(), Some("a"));
        assert_eq!(history.step_back(), None);
        assert_eq!(history.current(), "a");
        assert_eq!(history.step_forward(), Some("ab"));
        assert_eq!(history.step_forward(), Some("abc"));
        assert_eq!(history.step_forward(), None);
    }

    #[test]
    fn new_entry_discards_redo() {
        let mut history = History::new("a", 10);
        history.record("ab");
        history.step_back();
        assert_eq!(history.redo_depth(), 1);
        history.record("ax");
        assert_eq!(history.redo_depth(), 0);
        assert_eq!(history.step_back(), Some("a"));
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = History::new("0", 2);
        for value in ["1", "2", "3"] {
            history.record(value);
        }
        assert_eq!(history.undo_depth(), 2);
        assert_eq!(history.step_back(), Some("2"));
        assert_eq!(history.step_back(), Some("1"));
        assert_eq!(history.step_back(), None);
    }
}
