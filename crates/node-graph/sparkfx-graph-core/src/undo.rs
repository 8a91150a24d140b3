//! Scoped edit transactions and a snapshot undo stack.

use serde::{Deserialize, Serialize};

/// Receives a snapshot of the edited object before a user edit is applied.
pub trait Transactor<T> {
    fn begin(&mut self, label: &str, before: &T);
}

/// Transactor for edits that are not undoable (loading, scripted setup).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransactions;

impl<T> Transactor<T> for NoTransactions {
    fn begin(&mut self, _label: &str, _before: &T) {}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot<T> {
    pub label: String,
    pub state: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoStack<T> {
    undo: Vec<Snapshot<T>>,
    redo: Vec<Snapshot<T>>,
    pub max_records: usize,
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_records: 1000,
        }
    }
}

impl<T: Clone> UndoStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_records: usize) -> Self {
        Self {
            max_records: max_records.max(1),
            ..Self::default()
        }
    }

    /// Record the state before an edit. Any redo history is dropped.
    pub fn push(&mut self, label: &str, before: &T) {
        self.redo.clear();
        self.undo.push(Snapshot {
            label: label.to_string(),
            state: before.clone(),
        });
        if self.undo.len() > self.max_records {
            self.undo.remove(0);
        }
    }

    /// Step back. `current` is kept for redo; the returned state replaces it.
    pub fn undo(&mut self, current: &T) -> Option<T> {
        let snapshot = self.undo.pop()?;
        self.redo.push(Snapshot {
            label: snapshot.label.clone(),
            state: current.clone(),
        });
        Some(snapshot.state)
    }

    pub fn redo(&mut self, current: &T) -> Option<T> {
        let snapshot = self.redo.pop()?;
        self.undo.push(Snapshot {
            label: snapshot.label.clone(),
            state: current.clone(),
        });
        Some(snapshot.state)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Label of the edit [`UndoStack::undo`] would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo.last().map(|s| s.label.as_str())
    }
}

impl<T: Clone> Transactor<T> for UndoStack<T> {
    fn begin(&mut self, label: &str, before: &T) {
        self.push(label, before);
    }
}
