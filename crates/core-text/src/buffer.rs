use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

use crate::error::BufferError;
use crate::piece::{BEGIN, Bytes, END, PieceId, Pieces, Span};
use crate::undo::{Change, History, Revert};

/// Piece-table byte buffer with grouped undo/redo.
///
/// Every mutation is recorded as a [`Change`] in the open action; `commit`
/// closes the action so the next mutation starts a new undo unit. Runs of
/// contiguous edits inside the most recently inserted piece are coalesced
/// in place (the cache fast path) and never grow the change list.
#[derive(Debug, Clone)]
pub struct Buffer {
    pieces: Pieces,
    size: usize,
    history: History,
    cached: Option<PieceId>,
}

/// Outcome of [`Buffer::read_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadAt {
    /// Bytes copied into the destination.
    pub n: usize,
    /// True when the read stopped at the end of the buffer before filling the destination.
    pub eof: bool,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<&str> for Buffer {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

impl Buffer {
    /// Buffer holding `content` as its initial, unrecorded state.
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        let content = content.into();
        let mut pieces = Pieces::new();
        let size = content.len();
        if size > 0 {
            let p = pieces.alloc(Bytes::shared(Arc::from(content)), BEGIN, END);
            pieces[BEGIN].next = p;
            pieces[END].prev = p;
        }
        Self {
            pieces,
            size,
            history: History::default(),
            cached: None,
        }
    }

    /// Current content length in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Pieces allocated over the buffer's lifetime, sentinels included.
    pub fn piece_count(&self) -> usize {
        self.pieces.count()
    }

    /// Insert `data` at byte offset `off`.
    pub fn insert(&mut self, off: usize, data: &[u8]) -> Result<(), BufferError> {
        if off > self.size {
            return Err(BufferError::OffsetOutOfRange {
                offset: off,
                size: self.size,
            });
        }
        if data.is_empty() {
            return Ok(());
        }
        let (p, inner) = self.locate(off)?;
        if self.cache_insert(p, inner, data) {
            trace!(target: "text.buffer", off, len = data.len(), "insert_cached");
            return Ok(());
        }

        let plen = self.pieces[p].len();
        let (old, new, pnew) = if inner == plen {
            // Boundary: link one new piece between p and its successor.
            let next = self.pieces[p].next;
            let pnew = self.pieces.alloc(Bytes::Owned(data.to_vec()), p, next);
            (Span::empty(), Span::new(pnew, pnew, data.len()), pnew)
        } else {
            // Midway: replace p by before + pnew + after.
            let prev = self.pieces[p].prev;
            let next = self.pieces[p].next;
            let head = self.pieces[p].data.window(0, inner);
            let tail = self.pieces[p].data.window(inner, plen);
            let before = self.pieces.alloc(head, prev, END);
            let pnew = self.pieces.alloc(Bytes::Owned(data.to_vec()), before, END);
            let after = self.pieces.alloc(tail, pnew, next);
            self.pieces[before].next = pnew;
            self.pieces[pnew].next = after;
            (
                Span::new(p, p, plen),
                Span::new(before, after, plen + data.len()),
                pnew,
            )
        };
        self.apply(old, new);
        self.history.record(Change {
            old,
            new,
            offset: off,
            inserted: data.len(),
            deleted: 0,
        });
        self.cached = Some(pnew);
        trace!(target: "text.buffer", off, len = data.len(), split = old.ends.is_some(), "insert");
        Ok(())
    }

    /// Delete `n` bytes starting at `off`; `n` is clamped to the end of the buffer.
    pub fn delete(&mut self, off: usize, n: usize) -> Result<(), BufferError> {
        if off > self.size {
            return Err(BufferError::OffsetOutOfRange {
                offset: off,
                size: self.size,
            });
        }
        let n = n.min(self.size - off);
        if n == 0 {
            return Ok(());
        }
        let (mut p, inner) = self.locate(off)?;
        if self.cache_delete(p, inner, n) {
            trace!(target: "text.buffer", off, len = n, "delete_cached");
            return Ok(());
        }
        self.cached = None;

        let midway_start = inner != self.pieces[p].len();
        let (start, mut cur) = if midway_start {
            (p, self.pieces[p].len() - inner)
        } else {
            (self.pieces[p].next, 0)
        };
        while cur < n {
            p = self.pieces[p].next;
            assert!(p != END, "delete ran off the end of the piece chain");
            cur += self.pieces[p].len();
        }
        let end = p;
        let midway_end = cur > n;

        // Unchanged piece on each side of the hole, or the trimmed fragment
        // that replaces it.
        let before = if midway_start {
            let prev = self.pieces[start].prev;
            let head = self.pieces[start].data.window(0, inner);
            self.pieces.alloc(head, prev, END)
        } else {
            self.pieces[start].prev
        };
        let after = if midway_end {
            let next = self.pieces[end].next;
            let elen = self.pieces[end].len();
            let tail = self.pieces[end].data.window(elen - (cur - n), elen);
            self.pieces.alloc(tail, before, next)
        } else {
            self.pieces[end].next
        };
        if midway_start {
            self.pieces[before].next = after;
        }

        let kept_head = if midway_start { inner } else { 0 };
        let kept_tail = if midway_end { cur - n } else { 0 };
        let old = Span::new(start, end, kept_head + cur);
        let new = match (midway_start, midway_end) {
            (true, true) => Span::new(before, after, kept_head + kept_tail),
            (true, false) => Span::new(before, before, kept_head),
            (false, true) => Span::new(after, after, kept_tail),
            (false, false) => Span::empty(),
        };
        self.apply(old, new);
        self.history.record(Change {
            old,
            new,
            offset: off,
            inserted: 0,
            deleted: n,
        });
        trace!(target: "text.buffer", off, len = n, midway_start, midway_end, "delete");
        Ok(())
    }

    /// Copy bytes starting at `off` into `buf`.
    pub fn read_at(&self, buf: &mut [u8], off: usize) -> Result<ReadAt, BufferError> {
        if off > self.size {
            return Err(BufferError::OffsetOutOfRange {
                offset: off,
                size: self.size,
            });
        }
        let mut n = 0;
        let mut skip = off;
        for (_, bytes) in self.pieces.live() {
            if n == buf.len() {
                break;
            }
            if skip >= bytes.len() {
                skip -= bytes.len();
                continue;
            }
            let src = &bytes[skip..];
            skip = 0;
            let take = src.len().min(buf.len() - n);
            buf[n..n + take].copy_from_slice(&src[..take]);
            n += take;
        }
        Ok(ReadAt {
            n,
            eof: n < buf.len(),
        })
    }

    /// Full contents as one vector.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size);
        for (_, bytes) in self.pieces.live() {
            out.extend_from_slice(bytes);
        }
        out
    }

    /// Streaming reader over the live chain.
    pub fn reader(&self) -> BufferReader<'_> {
        BufferReader {
            buffer: self,
            piece: self.pieces[BEGIN].next,
            inner: 0,
        }
    }

    /// Close the open action; the next mutation starts a new undo unit.
    pub fn commit(&mut self) {
        self.history.commit();
        self.cached = None;
    }

    /// Revert the top applied action.
    pub fn undo(&mut self) -> Option<Revert> {
        self.commit();
        let idx = self.history.step_back()?;
        let mut revert = None;
        let action = self.history.action(idx);
        for c in action.changes.iter().rev() {
            self.pieces.swap(&c.new, &c.old);
            self.size = self.size + c.old.len - c.new.len;
            revert = Some(Revert {
                offset: c.offset,
                len: c.deleted,
            });
        }
        trace!(target: "text.undo", head = self.history.head(), size = self.size, "undo");
        revert
    }

    /// Re-apply the next redoable action.
    pub fn redo(&mut self) -> Option<Revert> {
        self.commit();
        let idx = self.history.step_forward()?;
        let mut revert = None;
        let action = self.history.action(idx);
        for c in action.changes.iter() {
            self.pieces.swap(&c.old, &c.new);
            self.size = self.size + c.new.len - c.old.len;
            revert = Some(Revert {
                offset: c.offset,
                len: c.inserted,
            });
        }
        trace!(target: "text.undo", head = self.history.head(), size = self.size, "redo");
        revert
    }

    /// Mark the current state as the clean (saved) reference.
    pub fn clean(&mut self) {
        self.commit();
        self.history.mark_clean();
    }

    /// True when the applied history differs from the clean reference.
    pub fn dirty(&self) -> bool {
        self.history.dirty()
    }

    pub fn has_undoable_changes(&self) -> bool {
        self.history.head() > 0
    }

    pub fn has_redoable_changes(&self) -> bool {
        self.history.redo_depth() > 0
    }

    /// When the top applied action was opened.
    pub fn last_action_time(&self) -> Option<Instant> {
        self.history.top_time()
    }

    fn locate(&self, off: usize) -> Result<(PieceId, usize), BufferError> {
        self.pieces
            .locate(off)
            .ok_or(BufferError::OffsetOutOfRange {
                offset: off,
                size: self.size,
            })
    }

    fn apply(&mut self, old: Span, new: Span) {
        self.pieces.swap(&old, &new);
        self.size = self.size + new.len - old.len;
    }

    /// Grow the cache piece in place when `p` is it.
    fn cache_insert(&mut self, p: PieceId, inner: usize, data: &[u8]) -> bool {
        if self.cached != Some(p) {
            return false;
        }
        let Some(change) = self.history.current_change_mut() else {
            return false;
        };
        debug_assert!(change.new.contains(&self.pieces, p));
        let Some(bytes) = self.pieces[p].data.owned_mut() else {
            return false;
        };
        bytes.splice(inner..inner, data.iter().copied());
        change.new.len += data.len();
        change.inserted += data.len();
        self.size += data.len();
        true
    }

    /// Shrink the cache piece in place when it holds the whole range.
    fn cache_delete(&mut self, p: PieceId, inner: usize, n: usize) -> bool {
        if self.cached != Some(p) || inner + n > self.pieces[p].len() {
            return false;
        }
        let Some(change) = self.history.current_change_mut() else {
            return false;
        };
        let Some(bytes) = self.pieces[p].data.owned_mut() else {
            return false;
        };
        bytes.drain(inner..inner + n);
        change.new.len -= n;
        change.inserted -= n;
        self.size -= n;
        true
    }
}

/// `io::Read` adapter walking the live piece chain.
pub struct BufferReader<'a> {
    buffer: &'a Buffer,
    piece: PieceId,
    inner: usize,
}

impl io::Read for BufferReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let pieces = &self.buffer.pieces;
        let mut n = 0;
        while n < buf.len() && self.piece != END {
            let bytes = pieces[self.piece].data.as_slice();
            if self.inner >= bytes.len() {
                self.piece = pieces[self.piece].next;
                self.inner = 0;
                continue;
            }
            let take = (bytes.len() - self.inner).min(buf.len() - n);
            buf[n..n + take].copy_from_slice(&bytes[self.inner..self.inner + take]);
            self.inner += take;
            n += take;
        }
        Ok(n)
    }
}
