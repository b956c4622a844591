//! End-to-end buffer scenarios: insertion, grouped undo, cache coalescing.

use core_text::{Buffer, Revert};
use pretty_assertions::assert_eq;

fn contents(b: &Buffer) -> String {
    let mut buf = vec![0u8; b.size()];
    let r = b.read_at(&mut buf, 0).unwrap();
    assert_eq!(r.n, b.size());
    String::from_utf8(buf).unwrap()
}

#[test]
fn insert_into_initial_content_then_undo() {
    let mut b = Buffer::from("and what is a dream?");
    b.insert(9, b"exactly ").unwrap();
    assert_eq!(b.size(), 28);
    assert_eq!(contents(&b), "and what exactly is a dream?");
    assert_eq!(b.undo(), Some(Revert { offset: 9, len: 0 }));
    assert_eq!(contents(&b), "and what is a dream?");
}

#[test]
fn committed_edits_undo_one_at_a_time() {
    let mut b = Buffer::default();
    b.insert(0, b"All work makes John a dull boy").unwrap();
    b.commit();
    b.insert(9, b"and no playing ").unwrap();
    b.commit();
    b.delete(20, 14).unwrap();
    b.commit();
    b.insert(20, b" makes Jack").unwrap();
    b.commit();
    assert_eq!(contents(&b), "All work and no play makes Jack a dull boy");

    b.undo();
    assert_eq!(contents(&b), "All work and no play a dull boy");
    b.undo();
    assert_eq!(contents(&b), "All work and no playing makes John a dull boy");
    b.undo();
    assert_eq!(contents(&b), "All work makes John a dull boy");

    b.redo();
    b.redo();
    assert_eq!(contents(&b), "All work and no play a dull boy");
    assert!(b.has_redoable_changes());
}

#[test]
fn uncommitted_edits_coalesce_in_cache_piece() {
    let mut b = Buffer::from("testing insertation");
    b.insert(8, b"caching").unwrap();
    b.insert(15, b" ").unwrap();
    b.delete(12, 3).unwrap();
    b.insert(12, b"ed").unwrap();
    assert_eq!(b.piece_count(), 6);
    assert_eq!(contents(&b), "testing cached insertation");
    b.undo();
    assert_eq!(contents(&b), "testing insertation");
    assert!(!b.has_undoable_changes());
}

#[test]
fn new_edit_after_undo_discards_redo() {
    let mut b = Buffer::from("abc");
    b.insert(3, b"d").unwrap();
    b.commit();
    b.undo();
    assert!(b.has_redoable_changes());
    b.insert(0, b"z").unwrap();
    assert!(!b.has_redoable_changes());
    assert_eq!(b.redo(), None);
    assert_eq!(contents(&b), "zabc");
}
