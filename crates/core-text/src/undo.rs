use std::time::Instant;
use tracing::trace;

use crate::piece::Span;

/// One span swap. Applying replaces `old` with `new`; reverting does the opposite.
#[derive(Debug, Clone)]
pub(crate) struct Change {
    pub(crate) old: Span,
    pub(crate) new: Span,
    /// Byte position of the first inserted/deleted byte, before the change.
    pub(crate) offset: usize,
    /// Bytes this change adds at `offset` (grows and shrinks with the cache piece).
    pub(crate) inserted: usize,
    /// Bytes this change removes at `offset`.
    pub(crate) deleted: usize,
}

/// Changes undone and redone as one unit.
#[derive(Debug, Clone)]
pub(crate) struct Action {
    pub(crate) id: u64,
    pub(crate) changes: Vec<Change>,
    pub(crate) time: Instant,
}

/// Offset and length reported by [`crate::Buffer::undo`] and [`crate::Buffer::redo`].
///
/// `len` is the number of bytes the reported change leaves in place at
/// `offset`: the bytes it restored on undo, or inserted on redo. Undoing a
/// pure insertion therefore reports `len == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Revert {
    pub offset: usize,
    pub len: usize,
}

/// Two-sided action stack. `[0, head)` is applied, `[head, len)` is redoable.
#[derive(Debug, Clone, Default)]
pub(crate) struct History {
    actions: Vec<Action>,
    head: usize,
    open: bool,
    saved: Option<u64>,
    next_id: u64,
}

impl History {
    /// Append a change to the open action, opening one (and dropping the redo
    /// side) when none is open.
    pub(crate) fn record(&mut self, change: Change) {
        if !self.open {
            let dropped = self.actions.len() - self.head;
            self.actions.truncate(self.head);
            self.actions.push(Action {
                id: self.next_id,
                changes: Vec::new(),
                time: Instant::now(),
            });
            self.next_id += 1;
            self.head = self.actions.len();
            self.open = true;
            trace!(target: "text.undo", head = self.head, dropped, "action_open");
        }
        if let Some(action) = self.actions.last_mut() {
            action.changes.push(change);
        }
    }

    /// Most recent change of the open action.
    pub(crate) fn current_change_mut(&mut self) -> Option<&mut Change> {
        if !self.open {
            return None;
        }
        self.actions.last_mut().and_then(|a| a.changes.last_mut())
    }

    pub(crate) fn commit(&mut self) -> bool {
        let was_open = self.open;
        self.open = false;
        if was_open {
            trace!(target: "text.undo", head = self.head, "action_commit");
        }
        was_open
    }

    /// Step back over the top applied action and return its index.
    pub(crate) fn step_back(&mut self) -> Option<usize> {
        debug_assert!(!self.open, "commit before undo");
        if self.head == 0 {
            return None;
        }
        self.head -= 1;
        Some(self.head)
    }

    /// Step forward over the next redoable action and return its index.
    pub(crate) fn step_forward(&mut self) -> Option<usize> {
        debug_assert!(!self.open, "commit before redo");
        if self.head == self.actions.len() {
            return None;
        }
        self.head += 1;
        Some(self.head - 1)
    }

    pub(crate) fn action(&self, idx: usize) -> &Action {
        &self.actions[idx]
    }

    pub(crate) fn head(&self) -> usize {
        self.head
    }

    pub(crate) fn redo_depth(&self) -> usize {
        self.actions.len() - self.head
    }

    pub(crate) fn mark_clean(&mut self) {
        self.saved = self.top_id();
    }

    pub(crate) fn dirty(&self) -> bool {
        match self.top_id() {
            None => self.saved.is_some(),
            Some(id) => self.saved != Some(id),
        }
    }

    /// Time the top applied action was opened.
    pub(crate) fn top_time(&self) -> Option<Instant> {
        self.head.checked_sub(1).map(|top| self.actions[top].time)
    }

    fn top_id(&self) -> Option<u64> {
        self.head
            .checked_sub(1)
            .map(|top| self.actions[top].id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(offset: usize) -> Change {
        Change {
            old: Span::empty(),
            new: Span::empty(),
            offset,
            inserted: 1,
            deleted: 0,
        }
    }

    #[test]
    fn record_opens_single_action_until_commit() {
        let mut h = History::default();
        h.record(change(0));
        h.record(change(1));
        assert_eq!(h.head(), 1);
        assert_eq!(h.action(0).changes.len(), 2);
        assert!(h.commit());
        assert!(!h.commit());
        h.record(change(2));
        assert_eq!(h.head(), 2);
    }

    #[test]
    fn new_action_drops_redo_side() {
        let mut h = History::default();
        h.record(change(0));
        h.commit();
        h.record(change(1));
        h.commit();
        assert_eq!(h.step_back(), Some(1));
        assert_eq!(h.redo_depth(), 1);
        h.record(change(5));
        h.commit();
        assert_eq!(h.redo_depth(), 0);
        assert_eq!(h.action(1).changes[0].offset, 5);
    }

    #[test]
    fn dirty_tracks_saved_action() {
        let mut h = History::default();
        assert!(!h.dirty());
        h.record(change(0));
        h.commit();
        assert!(h.dirty());
        h.mark_clean();
        assert!(!h.dirty());
        h.step_back();
        assert!(h.dirty());
        h.step_forward();
        assert!(!h.dirty());
    }
}
