//! Linear undo/redo history over immutable snapshots.
//!
//! `History` keeps every discrete edit of a document as an `Arc` snapshot
//! plus a cursor pointing at the current one. Edits are pure functions from
//! the current snapshot to a new one, so unchanged sub-trees can be shared
//! and "did anything change" is a pointer comparison.
//!
//! ```text
//!   snapshots: [ s0 ][ s1 ][ s2 ][ s3 ]
//!                           ^cursor
//!   undo  -> cursor moves left, nothing is dropped
//!   edit  -> s3 is discarded, s2' is appended after s2
//! ```

use std::sync::Arc;

/// Undo-aware snapshot list.
///
/// Invariant: `snapshots` is never empty and `cursor < snapshots.len()`.
#[derive(Debug, Clone)]
pub struct History<T> {
    snapshots: Vec<Arc<T>>,
    cursor: usize,
    /// Maximum number of snapshots kept. `0` means unbounded.
    max_depth: usize,
}

impl<T> History<T> {
    /// Creates a history holding `initial` as its only snapshot.
    pub fn new(initial: T) -> Self {
        Self::from_arc(Arc::new(initial))
    }

    /// Creates a history from an already shared snapshot.
    pub fn from_arc(initial: Arc<T>) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            max_depth: 0,
        }
    }

    /// Limits the number of kept snapshots; the oldest ones are dropped first.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self.enforce_depth();
        self
    }

    /// The snapshot at the cursor.
    pub fn current(&self) -> &Arc<T> {
        &self.snapshots[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Applies `updater` to the current snapshot.
    ///
    /// With `skip_history` the current snapshot is replaced in place and the
    /// undo/redo stacks are left alone. Otherwise a result that is the very
    /// same `Arc` as the current snapshot is ignored, and any other result
    /// discards the redo branch and becomes the new current snapshot.
    ///
    /// Returns `true` when the visible state changed.
    pub fn set_state<F>(&mut self, updater: F, skip_history: bool) -> bool
    where
        F: FnOnce(&Arc<T>) -> Arc<T>,
    {
        let next = updater(self.current());
        self.apply(next, skip_history)
    }

    /// Replaces the current state with a full value.
    pub fn replace(&mut self, value: T, skip_history: bool) -> bool {
        self.apply(Arc::new(value), skip_history)
    }

    /// Moves the cursor one step back. No-op at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Moves the cursor one step forward. No-op at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Drops all snapshots and starts over from `value`.
    ///
    /// Used when a different session is loaded so that undo never crosses
    /// session boundaries.
    pub fn reset(&mut self, value: T) {
        self.reset_arc(Arc::new(value));
    }

    pub fn reset_arc(&mut self, value: Arc<T>) {
        self.snapshots.clear();
        self.snapshots.push(value);
        self.cursor = 0;
    }

    fn apply(&mut self, next: Arc<T>, skip_history: bool) -> bool {
        if Arc::ptr_eq(&next, self.current()) {
            return false;
        }

        if skip_history {
            self.snapshots[self.cursor] = next;
            return true;
        }

        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(next);
        self.cursor = self.snapshots.len() - 1;
        self.enforce_depth();
        true
    }

    fn enforce_depth(&mut self) {
        if self.max_depth == 0 || self.snapshots.len() <= self.max_depth {
            return;
        }
        let overflow = self.snapshots.len() - self.max_depth;
        self.snapshots.drain(..overflow);
        self.cursor = self.cursor.saturating_sub(overflow);
    }
}

impl<T: Clone + PartialEq> History<T> {
    /// Copy-on-write edit: `recipe` mutates a draft copy of the current state.
    ///
    /// A draft that ends up equal to the current state yields the current
    /// `Arc` back, so recipes that change nothing never create history.
    pub fn modify<F>(&mut self, recipe: F, skip_history: bool) -> bool
    where
        F: FnOnce(&mut T),
    {
        self.set_state(|current| produce(current, recipe), skip_history)
    }

    /// Runs `recipe` on every snapshot, current or not, without moving the
    /// cursor. Returns how many snapshots changed.
    ///
    /// Used to settle data that belongs to no single edit (e.g. a response
    /// arriving for an entity that several snapshots contain), so undo and
    /// redo never bring back the unsettled version.
    pub fn patch_all<F>(&mut self, mut recipe: F) -> usize
    where
        F: FnMut(&mut T),
    {
        let mut patched = 0;
        for snapshot in &mut self.snapshots {
            let next = produce(snapshot, &mut recipe);
            if !Arc::ptr_eq(&next, snapshot) {
                *snapshot = next;
                patched += 1;
            }
        }
        patched
    }
}

/// Runs `recipe` on a clone of `base` and returns either a new snapshot or
/// `base` itself when nothing changed.
pub fn produce<T, F>(base: &Arc<T>, recipe: F) -> Arc<T>
where
    T: Clone + PartialEq,
    F: FnOnce(&mut T),
{
    let mut draft = T::clone(base);
    recipe(&mut draft);
    if draft == **base {
        Arc::clone(base)
    } else {
        Arc::new(draft)
    }
}
