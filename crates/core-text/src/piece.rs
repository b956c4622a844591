//! Piece arena, spans and the span swap primitive.
//!
//! Pieces live in a per-buffer arena and are addressed by index. The arena
//! never frees a slot: a piece unlinked from the live chain may still be
//! referenced by an undo span, and all of them live as long as the buffer.
//!
//! Invariants:
//! * Slots `BEGIN` and `END` are sentinels holding no data.
//! * Walking `next` from `BEGIN` reaches `END` and yields the buffer contents.
//! * A piece's `prev`/`next` are only rewritten while it is live; an unlinked
//!   piece keeps the neighbours it had when it was swapped out, which is what
//!   lets an undo swap it back in.
//! * Only the buffer's cache piece may hold `Bytes::Owned` storage that is
//!   still being edited; everything else is read-only.

use std::ops::{Index, IndexMut};
use std::sync::Arc;

pub(crate) type PieceId = usize;

pub(crate) const BEGIN: PieceId = 0;
pub(crate) const END: PieceId = 1;

/// Backing storage of a piece.
#[derive(Debug, Clone)]
pub(crate) enum Bytes {
    /// Read-only window into storage shared with other pieces.
    Shared {
        buf: Arc<[u8]>,
        start: usize,
        len: usize,
    },
    /// Private storage. Edited in place only while the piece is the cache target.
    Owned(Vec<u8>),
}

impl Bytes {
    pub(crate) fn empty() -> Self {
        Bytes::Owned(Vec::new())
    }

    pub(crate) fn shared(buf: Arc<[u8]>) -> Self {
        let len = buf.len();
        Bytes::Shared { buf, start: 0, len }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        match self {
            Bytes::Shared { buf, start, len } => &buf[*start..*start + *len],
            Bytes::Owned(v) => v,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Bytes::Shared { len, .. } => *len,
            Bytes::Owned(v) => v.len(),
        }
    }

    /// Window over `[from, to)` of this storage. Owned storage is frozen into a
    /// shared buffer first so both halves of a split reuse one allocation.
    pub(crate) fn window(&mut self, from: usize, to: usize) -> Bytes {
        debug_assert!(from <= to && to <= self.len());
        if let Bytes::Owned(v) = self {
            let buf: Arc<[u8]> = Arc::from(std::mem::take(v));
            let len = buf.len();
            *self = Bytes::Shared { buf, start: 0, len };
        }
        match self {
            Bytes::Shared { buf, start, .. } => Bytes::Shared {
                buf: Arc::clone(buf),
                start: *start + from,
                len: to - from,
            },
            Bytes::Owned(_) => unreachable!("owned storage frozen above"),
        }
    }

    /// Mutable access for the cache fast path.
    pub(crate) fn owned_mut(&mut self) -> Option<&mut Vec<u8>> {
        match self {
            Bytes::Owned(v) => Some(v),
            Bytes::Shared { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Piece {
    pub(crate) data: Bytes,
    pub(crate) prev: PieceId,
    pub(crate) next: PieceId,
}

impl Piece {
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }
}

/// Contiguous sub-chain `start..=end` plus the bytes it covers.
///
/// `ends == None` is the empty span of a pure insert (old side) or a pure
/// delete (new side).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Span {
    pub(crate) ends: Option<(PieceId, PieceId)>,
    pub(crate) len: usize,
}

impl Span {
    pub(crate) fn new(start: PieceId, end: PieceId, len: usize) -> Self {
        Self {
            ends: Some((start, end)),
            len,
        }
    }

    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, pieces: &Pieces, id: PieceId) -> bool {
        let Some((start, end)) = self.ends else {
            return false;
        };
        let mut cur = start;
        loop {
            if cur == id {
                return true;
            }
            if cur == end || cur == END {
                return false;
            }
            cur = pieces[cur].next;
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Pieces {
    slots: Vec<Piece>,
}

impl Pieces {
    pub(crate) fn new() -> Self {
        let begin = Piece {
            data: Bytes::empty(),
            prev: BEGIN,
            next: END,
        };
        let end = Piece {
            data: Bytes::empty(),
            prev: BEGIN,
            next: END,
        };
        Self {
            slots: vec![begin, end],
        }
    }

    pub(crate) fn alloc(&mut self, data: Bytes, prev: PieceId, next: PieceId) -> PieceId {
        self.slots.push(Piece { data, prev, next });
        self.slots.len() - 1
    }

    /// Number of pieces ever allocated, sentinels included.
    pub(crate) fn count(&self) -> usize {
        self.slots.len()
    }

    /// Piece holding byte `off` together with the offset inside it.
    ///
    /// A position on a boundary resolves to the piece that *ends* there, so
    /// offset 0 resolves to `BEGIN` and a position right after the cache piece
    /// resolves to the cache piece.
    pub(crate) fn locate(&self, off: usize) -> Option<(PieceId, usize)> {
        let mut cur = 0;
        let mut p = BEGIN;
        while p != END {
            let len = self[p].len();
            if off <= cur + len {
                return Some((p, off - cur));
            }
            cur += len;
            p = self[p].next;
        }
        None
    }

    /// Replace `old` by `new` in the live chain.
    pub(crate) fn swap(&mut self, old: &Span, new: &Span) {
        match (old.ends, new.ends) {
            (None, None) => {}
            (None, Some((start, end))) => {
                let prev = self[start].prev;
                let next = self[end].next;
                self[prev].next = start;
                self[next].prev = end;
            }
            (Some((start, end)), None) => {
                let prev = self[start].prev;
                let next = self[end].next;
                self[prev].next = next;
                self[next].prev = prev;
            }
            (Some((old_start, old_end)), Some((new_start, new_end))) => {
                let prev = self[old_start].prev;
                let next = self[old_end].next;
                self[prev].next = new_start;
                self[next].prev = new_end;
            }
        }
    }

    /// Live pieces between the sentinels, in order.
    pub(crate) fn live(&self) -> Live<'_> {
        Live {
            pieces: self,
            cur: self[BEGIN].next,
        }
    }
}

impl Index<PieceId> for Pieces {
    type Output = Piece;

    fn index(&self, id: PieceId) -> &Piece {
        &self.slots[id]
    }
}

impl IndexMut<PieceId> for Pieces {
    fn index_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.slots[id]
    }
}

pub(crate) struct Live<'a> {
    pieces: &'a Pieces,
    cur: PieceId,
}

impl<'a> Iterator for Live<'a> {
    type Item = (PieceId, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cur == END {
            return None;
        }
        let id = self.cur;
        let piece = &self.pieces[id];
        self.cur = piece.next;
        Some((id, piece.data.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(p: &Pieces) -> Vec<u8> {
        p.live().flat_map(|(_, b)| b.iter().copied()).collect()
    }

    #[test]
    fn sentinels_form_empty_chain() {
        let p = Pieces::new();
        assert_eq!(p.count(), 2);
        assert!(chain(&p).is_empty());
        assert_eq!(p.locate(0), Some((BEGIN, 0)));
        assert_eq!(p.locate(1), None);
    }

    #[test]
    fn swap_insert_then_reverse() {
        let mut p = Pieces::new();
        let a = p.alloc(Bytes::Owned(b"abc".to_vec()), BEGIN, END);
        let old = Span::empty();
        let new = Span::new(a, a, 3);
        p.swap(&old, &new);
        assert_eq!(chain(&p), b"abc");
        p.swap(&new, &old);
        assert!(chain(&p).is_empty());
        p.swap(&old, &new);
        assert_eq!(p.locate(3), Some((a, 3)));
        assert!(new.contains(&p, a));
    }

    #[test]
    fn window_freezes_owned_storage() {
        let mut b = Bytes::Owned(b"hello world".to_vec());
        let w = b.window(6, 11);
        assert_eq!(w.as_slice(), b"world");
        assert!(b.owned_mut().is_none());
        assert_eq!(b.as_slice(), b"hello world");
    }
}
