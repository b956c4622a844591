//! Text change notifications shared by the text model and the frame.
//!
//! Observers are told `(op, offset, count)` after every mutation, in runes,
//! so a hosting widget can keep a scrollbar or gutter in step with the text
//! without reading it back.

use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Kind of mutation reported to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextOp {
    Insert,
    Delete,
    /// Range rewritten in place, as after undo or redo.
    Replace,
}

impl fmt::Display for TextOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextOp::Insert => "insert",
            TextOp::Delete => "delete",
            TextOp::Replace => "replace",
        })
    }
}

/// One notification. `offset` and `count` are rune quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEvent {
    pub op: TextOp,
    pub offset: usize,
    pub count: usize,
}

impl TextEvent {
    pub fn new(op: TextOp, offset: usize, count: usize) -> Self {
        Self { op, offset, count }
    }
}

/// Receives change notifications. Implementations must not block.
pub trait TextObserver: Send + 'static {
    fn notify(&mut self, event: TextEvent);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl TextObserver for NoopObserver {
    fn notify(&mut self, _event: TextEvent) {}
}

/// Any `FnMut(TextEvent)` closure is an observer.
impl<F> TextObserver for F
where
    F: FnMut(TextEvent) + Send + 'static,
{
    fn notify(&mut self, event: TextEvent) {
        self(event)
    }
}

/// Ordered set of observers notified in registration order.
#[derive(Default)]
pub struct Observers {
    list: Vec<Box<dyn TextObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Box<dyn TextObserver>) {
        self.list.push(observer);
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn emit(&mut self, op: TextOp, offset: usize, count: usize) {
        let event = TextEvent::new(op, offset, count);
        trace!(target: "events.text", %op, offset, count, observers = self.list.len(), "emit");
        for o in &mut self.list {
            o.notify(event);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.list.len())
            .finish()
    }
}

/// Observer that appends every event to a shared log; handy in tests and
/// for hosts that drain notifications on their own schedule.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<TextEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer half; every clone feeds the same log.
    pub fn observer(&self) -> Box<dyn TextObserver> {
        Box::new(self.clone())
    }

    /// Take all recorded events, leaving the log empty.
    pub fn drain(&self) -> Vec<TextEvent> {
        match self.events.lock() {
            Ok(mut g) => std::mem::take(&mut *g),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl TextObserver for EventLog {
    fn notify(&mut self, event: TextEvent) {
        match self.events.lock() {
            Ok(mut g) => g.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
