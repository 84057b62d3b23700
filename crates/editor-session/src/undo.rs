//! Undo/redo history.
//!
//! The manager only stores history; replaying it is the session's job
//! ([`EditSession::undo_changes`](crate::EditSession::undo_changes) and
//! [`EditSession::redo_changes`](crate::EditSession::redo_changes)). One history step is a
//! list of [`DeltaGroup`]s recorded together.

use crate::delta::Delta;
use crate::fold::Fold;

/// A batch of recorded changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaGroup {
    /// Document deltas, in the order they were applied.
    Doc(Vec<Delta>),
    /// Folds removed as a side effect of the edits; undo restores them.
    Fold(Vec<Fold>),
}

/// Linear undo/redo stacks with clean-state tracking.
#[derive(Debug, Clone)]
pub struct UndoManager {
    undo_stack: Vec<Vec<DeltaGroup>>,
    redo_stack: Vec<Vec<DeltaGroup>>,
    /// Steps since the clean point; `None` once the clean point became unreachable.
    dirty_counter: Option<isize>,
}

impl UndoManager {
    /// Create an empty, clean manager.
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            dirty_counter: Some(0),
        }
    }

    /// Record a step. With `merge`, it is appended to the previous step instead.
    ///
    /// Recording clears the redo stack.
    pub fn execute(&mut self, groups: Vec<DeltaGroup>, merge: bool) {
        let mut groups = groups;
        if merge && let Some(mut previous) = self.undo_stack.pop() {
            self.dirty_counter = self.dirty_counter.map(|c| c - 1);
            previous.append(&mut groups);
            groups = previous;
        }
        self.undo_stack.push(groups);
        self.redo_stack.clear();

        // A new edit after undoing past the clean point makes it unreachable.
        if matches!(self.dirty_counter, Some(c) if c < 0) {
            self.dirty_counter = None;
        }
        self.dirty_counter = self.dirty_counter.map(|c| c + 1);
    }

    /// Move the latest step to the redo stack and return it for replay.
    pub fn undo(&mut self) -> Option<Vec<DeltaGroup>> {
        let groups = self.undo_stack.pop()?;
        self.redo_stack.push(groups.clone());
        self.dirty_counter = self.dirty_counter.map(|c| c - 1);
        Some(groups)
    }

    /// Move the latest undone step back to the undo stack and return it for replay.
    pub fn redo(&mut self) -> Option<Vec<DeltaGroup>> {
        let groups = self.redo_stack.pop()?;
        self.undo_stack.push(groups.clone());
        self.dirty_counter = self.dirty_counter.map(|c| c + 1);
        Some(groups)
    }

    /// Forget all history and mark the current state clean.
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.mark_clean();
    }

    /// Returns `true` if there is a step to undo.
    pub fn has_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there is a step to redo.
    pub fn has_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo stack depth.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Redo stack depth.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Mark the current state as clean (e.g. after saving).
    pub fn mark_clean(&mut self) {
        self.dirty_counter = Some(0);
    }

    /// Returns `true` if the history is at the clean point.
    pub fn is_clean(&self) -> bool {
        self.dirty_counter == Some(0)
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}
