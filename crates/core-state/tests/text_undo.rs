//! Text-level undo across elog batches and direct edits.

use core_events::{EventLog, TextEvent, TextOp};
use core_state::{Elog, Text};

#[test]
fn script_then_direct_edit_undo_separately() {
    let mut t = Text::new("abc def");
    let mut e = Elog::new();
    e.replace(4, 7, &"xyz".chars().collect::<Vec<_>>());
    e.apply(&mut t).unwrap();
    t.insert(0, ">").unwrap();
    t.commit();
    assert_eq!(t.string(), ">abc xyz");
    t.undo();
    assert_eq!(t.string(), "abc xyz");
    t.undo();
    assert_eq!(t.string(), "abc def");
    assert!(!t.dirty());
}

#[test]
fn elog_apply_notifies_observers_per_entry() {
    let log = EventLog::new();
    let mut t = Text::new("0123");
    t.add_observer(log.observer());
    let mut e = Elog::new();
    e.delete(0, 1);
    e.insert(3, &['x']);
    e.apply(&mut t).unwrap();
    assert_eq!(t.string(), "12x3");
    assert_eq!(
        log.drain(),
        vec![
            TextEvent::new(TextOp::Insert, 3, 1),
            TextEvent::new(TextOp::Delete, 0, 1),
        ]
    );
}

#[test]
fn clean_after_apply() {
    let mut t = Text::new("x");
    let mut e = Elog::new();
    e.insert(1, &['y']);
    e.apply(&mut t).unwrap();
    assert!(t.dirty());
    t.clean();
    assert!(!t.dirty());
    t.undo();
    assert!(t.dirty());
    t.redo();
    assert!(!t.dirty());
}
