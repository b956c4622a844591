//! Rune-addressed text model over the byte buffer.
//!
//! `Text` owns a [`Buffer`] and presents it in runes: every offset taken or
//! returned here is a rune position. It also carries the window's selection
//! (`q0 <= q1`), which moves with insertions and deletions the way Acme's
//! does, and the observers notified after each mutation.

use std::cell::OnceCell;

use core_events::{Observers, TextObserver, TextOp};
use core_text::{Buffer, Revert, RuneIndex};
use tracing::trace;

use crate::error::TextError;

#[derive(Debug, Default)]
pub struct Text {
    buffer: Buffer,
    /// Built on first use and patched by each edit; undo and redo rebuild it.
    index: OnceCell<RuneIndex>,
    name: String,
    q0: usize,
    q1: usize,
    observers: Observers,
}

impl Text {
    /// Text holding `content` as its initial, unrecorded state.
    pub fn new(content: &str) -> Self {
        Self {
            buffer: Buffer::from(content),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        trace!(target: "state.text", name = %self.name, "set_name");
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Number of runes.
    pub fn nr(&self) -> usize {
        self.index().rune_count()
    }

    pub fn char_at(&self, q: usize) -> Option<char> {
        self.index().get(q)
    }

    /// Whole text.
    pub fn string(&self) -> &str {
        self.index().as_str()
    }

    /// Runes `[q0, q1)`, clamped to the text.
    pub fn read(&self, q0: usize, q1: usize) -> &str {
        let idx = self.index();
        let q1 = q1.min(idx.rune_count());
        let q0 = q0.min(q1);
        idx.slice(q0, q1)
    }

    /// Rune position of byte offset `b`.
    pub fn rune_of_byte(&self, b: usize) -> usize {
        self.index().rune_offset(b)
    }

    /// Byte offset of rune `q`.
    pub fn byte_of_rune(&self, q: usize) -> usize {
        self.index().byte_offset(q.min(self.nr()))
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.q0, self.q1)
    }

    /// Set the selection, clamped to the text and ordered.
    pub fn set_selection(&mut self, q0: usize, q1: usize) {
        let nr = self.nr();
        let (a, b) = if q0 <= q1 { (q0, q1) } else { (q1, q0) };
        self.q0 = a.min(nr);
        self.q1 = b.min(nr);
    }

    pub fn add_observer(&mut self, observer: Box<dyn TextObserver>) {
        self.observers.add(observer);
    }

    /// Insert `s` at rune `q0`. A selection endpoint strictly after `q0`
    /// moves right by the inserted length.
    pub fn insert(&mut self, q0: usize, s: &str) -> Result<(), TextError> {
        let nr = self.nr();
        if q0 > nr {
            return Err(TextError::RuneOutOfRange { offset: q0, nr });
        }
        if s.is_empty() {
            return Ok(());
        }
        let off = self.index().byte_offset(q0);
        self.buffer.insert(off, s.as_bytes())?;
        if let Some(idx) = self.index.get_mut() {
            idx.insert(q0, s);
        }
        let n = s.chars().count();
        if q0 < self.q1 {
            self.q1 += n;
        }
        if q0 < self.q0 {
            self.q0 += n;
        }
        trace!(target: "state.text", q0, n, "insert");
        self.observers.emit(TextOp::Insert, q0, n);
        Ok(())
    }

    /// Delete runes `[q0, q1)`. Selection endpoints inside the range collapse
    /// onto `q0`; endpoints after it move left.
    pub fn delete(&mut self, q0: usize, q1: usize) -> Result<(), TextError> {
        if q0 > q1 {
            return Err(TextError::InvertedRange { q0, q1 });
        }
        let nr = self.nr();
        if q1 > nr {
            return Err(TextError::RuneOutOfRange { offset: q1, nr });
        }
        let n = q1 - q0;
        if n == 0 {
            return Ok(());
        }
        let (b0, b1) = {
            let idx = self.index();
            (idx.byte_offset(q0), idx.byte_offset(q1))
        };
        self.buffer.delete(b0, b1 - b0)?;
        if let Some(idx) = self.index.get_mut() {
            idx.delete(q0, q1);
        }
        if q0 < self.q0 {
            self.q0 -= n.min(self.q0 - q0);
        }
        if q0 < self.q1 {
            self.q1 -= n.min(self.q1 - q0);
        }
        trace!(target: "state.text", q0, n, "delete");
        self.observers.emit(TextOp::Delete, q0, n);
        Ok(())
    }

    /// Close the current undo unit.
    pub fn commit(&mut self) {
        self.buffer.commit();
    }

    /// Undo the last unit; the selection covers what the undo restored.
    pub fn undo(&mut self) -> Option<(usize, usize)> {
        let r = self.buffer.undo()?;
        Some(self.after_revert(r, "undo"))
    }

    /// Redo the next unit; the selection covers what the redo re-inserted.
    pub fn redo(&mut self) -> Option<(usize, usize)> {
        let r = self.buffer.redo()?;
        Some(self.after_revert(r, "redo"))
    }

    pub fn clean(&mut self) {
        self.buffer.clean();
    }

    pub fn dirty(&self) -> bool {
        self.buffer.dirty()
    }

    /// Re-clamp the selection after a batch of edits.
    pub fn clamp_selection(&mut self) {
        let (q0, q1) = (self.q0, self.q1);
        self.set_selection(q0, q1);
    }

    fn after_revert(&mut self, r: Revert, what: &'static str) -> (usize, usize) {
        self.index.take();
        let (q0, q1) = {
            let idx = self.index();
            (idx.rune_offset(r.offset), idx.rune_offset(r.offset + r.len))
        };
        self.q0 = q0;
        self.q1 = q1;
        trace!(target: "state.text", q0, q1, what, "revert");
        self.observers.emit(TextOp::Replace, q0, q1 - q0);
        (q0, q1)
    }

    fn index(&self) -> &RuneIndex {
        self.index.get_or_init(|| {
            RuneIndex::new(String::from_utf8_lossy(&self.buffer.bytes()).into_owned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{EventLog, TextEvent};

    #[test]
    fn insert_shifts_selection_after_point() {
        let mut t = Text::new("hello world");
        t.set_selection(6, 11);
        t.insert(6, "big ").unwrap();
        assert_eq!(t.string(), "hello big world");
        // an endpoint equal to the insertion point stays put
        assert_eq!(t.selection(), (6, 15));
        t.insert(0, ">").unwrap();
        assert_eq!(t.selection(), (7, 16));
    }

    #[test]
    fn delete_collapses_selection_inside_range() {
        let mut t = Text::new("0123456789");
        t.set_selection(3, 8);
        t.delete(2, 5).unwrap();
        assert_eq!(t.string(), "0156789");
        assert_eq!(t.selection(), (2, 5));
        t.delete(0, 7).unwrap();
        assert_eq!(t.selection(), (0, 0));
    }

    #[test]
    fn rune_addressing_over_multibyte_text() {
        let mut t = Text::new("a本ポb");
        assert_eq!(t.nr(), 4);
        t.insert(2, "€").unwrap();
        assert_eq!(t.string(), "a本€ポb");
        assert_eq!(t.read(1, 3), "本€");
        assert_eq!(t.char_at(3), Some('ポ'));
        t.delete(1, 4).unwrap();
        assert_eq!(t.string(), "ab");
        assert_eq!(t.byte_of_rune(2), 2);
    }

    #[test]
    fn edits_keep_the_rune_index() {
        let mut t = Text::new("ab本c");
        assert_eq!(t.nr(), 4);
        t.insert(4, "ポ€").unwrap();
        t.delete(0, 1).unwrap();
        t.insert(0, "x\n").unwrap();
        assert!(t.index.get().is_some());
        assert_eq!(t.string(), "x\nb本cポ€");
        assert_eq!(t.string().as_bytes(), t.buffer().bytes().as_slice());
        assert_eq!(t.nr(), 7);
        assert_eq!(t.char_at(5), Some('ポ'));
        assert_eq!(t.byte_of_rune(6), 10);

        t.commit();
        t.undo();
        assert_eq!(t.string(), "ab本c");
        assert_eq!(t.nr(), 4);
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut t = Text::new("ab");
        assert_eq!(
            t.insert(3, "x"),
            Err(TextError::RuneOutOfRange { offset: 3, nr: 2 })
        );
        assert_eq!(
            t.delete(2, 1),
            Err(TextError::InvertedRange { q0: 2, q1: 1 })
        );
        assert!(t.delete(0, 3).is_err());
        assert_eq!(t.string(), "ab");
    }

    #[test]
    fn observers_see_every_mutation() {
        let log = EventLog::new();
        let mut t = Text::new("abc");
        t.add_observer(log.observer());
        t.insert(1, "本本").unwrap();
        t.delete(0, 2).unwrap();
        t.commit();
        // the whole unit reverts; the first change of it is reported
        assert_eq!(t.undo(), Some((1, 1)));
        assert_eq!(t.string(), "abc");
        assert_eq!(
            log.drain(),
            vec![
                TextEvent::new(TextOp::Insert, 1, 2),
                TextEvent::new(TextOp::Delete, 0, 2),
                TextEvent::new(TextOp::Replace, 1, 0),
            ]
        );
    }

    #[test]
    fn undo_selects_restored_text() {
        let mut t = Text::new("keep this");
        t.delete(4, 9).unwrap();
        t.commit();
        assert_eq!(t.undo(), Some((4, 9)));
        assert_eq!(t.selection(), (4, 9));
        assert_eq!(t.redo(), Some((4, 4)));
        assert_eq!(t.string(), "keep");
        assert!(t.dirty());
    }
}
