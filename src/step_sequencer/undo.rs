//! Undo/redo stack for step-sequencer edits.

use super::model::UndoSink;
use super::storage::StepSequencerStorage;

/// One committed gesture: the sequence it touched and the state on the
/// other side of it. Before an undo that is the pre-gesture state; after
/// it, the post-gesture state that redo brings back.
#[derive(Clone, Debug, PartialEq)]
struct UndoEntry {
    sequence_index: usize,
    storage: StepSequencerStorage,
}

/// Undo/redo stack.
///
/// Entries hold whole storage snapshots. Undo and redo both work by
/// swapping: the caller applies the stored state and hands back the one it
/// replaced, which becomes the entry for the opposite direction.
#[derive(Debug, Default)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
    position: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            position: 0,
        }
    }

    /// Record the state a gesture started from.
    pub fn push(&mut self, sequence_index: usize, prior: StepSequencerStorage) {
        // Truncate any redo history beyond current position
        self.entries.truncate(self.position);
        self.entries.push(UndoEntry {
            sequence_index,
            storage: prior,
        });
        self.position = self.entries.len();
    }

    /// Undo one gesture.
    ///
    /// `apply` receives the sequence index and the state to restore, and
    /// must return the state it replaced. Returns the sequence index, or
    /// None if there is nothing to undo.
    pub fn undo(
        &mut self,
        apply: impl FnOnce(usize, StepSequencerStorage) -> StepSequencerStorage,
    ) -> Option<usize> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        Some(self.swap(self.position, apply))
    }

    /// Redo the last undone gesture. Same contract as [`undo`](Self::undo).
    pub fn redo(
        &mut self,
        apply: impl FnOnce(usize, StepSequencerStorage) -> StepSequencerStorage,
    ) -> Option<usize> {
        if self.position >= self.entries.len() {
            return None;
        }
        let index = self.swap(self.position, apply);
        self.position += 1;
        Some(index)
    }

    fn swap(
        &mut self,
        at: usize,
        apply: impl FnOnce(usize, StepSequencerStorage) -> StepSequencerStorage,
    ) -> usize {
        let entry = &mut self.entries[at];
        entry.storage = apply(entry.sequence_index, entry.storage);
        entry.sequence_index
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.entries.len()
    }

    /// Number of entries, including undone ones still available to redo.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.position = 0;
    }
}

impl UndoSink for UndoStack {
    fn push_step_sequencer(&mut self, sequence_index: usize, prior: StepSequencerStorage) {
        self.push(sequence_index, prior);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::N_STEPS;

    fn filled(value: f32) -> StepSequencerStorage {
        StepSequencerStorage::from_steps([value; N_STEPS])
    }

    #[test]
    fn undo_redo_single() {
        let mut stack = UndoStack::new();
        let mut current = filled(0.5);
        stack.push(2, filled(0.0));

        assert!(stack.can_undo());
        let index = stack.undo(|_, prior| std::mem::replace(&mut current, prior));
        assert_eq!(index, Some(2));
        assert_eq!(current, filled(0.0));

        assert!(stack.can_redo());
        stack.redo(|_, next| std::mem::replace(&mut current, next));
        assert_eq!(current, filled(0.5));
        assert!(!stack.can_redo());
    }

    #[test]
    fn undo_at_bottom_returns_none() {
        let mut stack = UndoStack::new();
        assert!(stack.undo(|_, s| s).is_none());
    }

    #[test]
    fn redo_at_top_returns_none() {
        let mut stack = UndoStack::new();
        stack.push(0, filled(0.0));
        assert!(stack.redo(|_, s| s).is_none());
    }

    #[test]
    fn new_edit_after_undo_truncates_redo() {
        let mut stack = UndoStack::new();
        stack.push(0, filled(0.0));
        stack.push(0, filled(0.1));

        stack.undo(|_, s| s); // undo second edit
        assert!(stack.can_redo());

        // New edit truncates redo history
        stack.push(0, filled(0.2));
        assert!(!stack.can_redo());
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn undo_walks_back_through_gestures() {
        let mut stack = UndoStack::new();
        let mut current = filled(0.0);
        for value in [0.1, 0.2, 0.3] {
            stack.push(0, current);
            current = filled(value);
        }

        while stack.undo(|_, prior| std::mem::replace(&mut current, prior)).is_some() {}
        assert_eq!(current, filled(0.0));

        while stack.redo(|_, next| std::mem::replace(&mut current, next)).is_some() {}
        assert_eq!(current, filled(0.3));
    }
}
