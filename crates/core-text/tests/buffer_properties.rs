//! Property tests for the piece-table buffer against a plain `Vec<u8>` model.

use core_text::Buffer;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(usize, Vec<u8>),
    Delete(usize, usize),
    Commit,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<usize>(), proptest::collection::vec(b'a'..=b'z', 0..8))
            .prop_map(|(o, d)| Op::Insert(o, d)),
        3 => (any::<usize>(), 0usize..10).prop_map(|(o, n)| Op::Delete(o, n)),
        1 => Just(Op::Commit),
    ]
}

/// Apply `op` to both the buffer and the model; offsets are folded into range.
fn apply(b: &mut Buffer, model: &mut Vec<u8>, op: &Op) {
    match op {
        Op::Insert(o, d) => {
            let o = o % (model.len() + 1);
            b.insert(o, d).unwrap();
            model.splice(o..o, d.iter().copied());
        }
        Op::Delete(o, n) => {
            let o = o % (model.len() + 1);
            let n = (*n).min(model.len() - o);
            b.delete(o, n).unwrap();
            model.drain(o..o + n);
        }
        Op::Commit => b.commit(),
    }
}

proptest! {
    // Any edit sequence reads back the same bytes as the model.
    #[test]
    fn round_trip_matches_model(seed in "[a-z]{0,12}", ops in proptest::collection::vec(op(), 0..60)) {
        let mut b = Buffer::from(seed.as_str());
        let mut model = seed.into_bytes();
        for op in &ops {
            apply(&mut b, &mut model, op);
            prop_assert_eq!(b.size(), model.len());
        }
        prop_assert_eq!(b.bytes(), model);
    }

    // commit; op; commit; undo restores; redo re-applies.
    #[test]
    fn undo_is_inverse(prefix in proptest::collection::vec(op(), 0..20), last in op()) {
        let mut b = Buffer::default();
        let mut model = Vec::new();
        for op in &prefix {
            apply(&mut b, &mut model, op);
        }
        b.commit();
        let before = b.bytes();
        apply(&mut b, &mut model, &last);
        b.commit();
        let after = b.bytes();
        b.undo();
        if before != after {
            prop_assert_eq!(b.bytes(), before);
        }
        b.redo();
        prop_assert_eq!(b.bytes(), after);
    }

    // N uncommitted edits undo and redo as one unit.
    #[test]
    fn action_is_atomic(
        seed in "[a-z]{0,12}",
        ops in proptest::collection::vec(op().prop_filter("no commit", |o| !matches!(o, Op::Commit)), 1..25),
    ) {
        let mut b = Buffer::from(seed.as_str());
        let mut model = seed.clone().into_bytes();
        for op in &ops {
            apply(&mut b, &mut model, op);
        }
        let after = b.bytes();
        b.undo();
        prop_assert_eq!(b.bytes(), seed.as_bytes());
        prop_assert!(!b.has_undoable_changes());
        b.redo();
        prop_assert_eq!(b.bytes(), after);
    }

    // Clean marks the reference point; mutation and undo move around it.
    #[test]
    fn clean_and_dirty_track_reference(ops in proptest::collection::vec(op(), 1..20)) {
        let mut b = Buffer::from("x");
        let mut model = b"x".to_vec();
        b.clean();
        prop_assert!(!b.dirty());
        b.insert(0, b"y").unwrap();
        model.insert(0, b'y');
        prop_assert!(b.dirty());
        b.undo();
        prop_assert!(!b.dirty());
        model.remove(0);
        for op in &ops {
            apply(&mut b, &mut model, op);
        }
        b.clean();
        prop_assert!(!b.dirty());
    }
}
