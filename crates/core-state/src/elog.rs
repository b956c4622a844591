//! Edit log: a batch of rune-level edits recorded against source positions
//! and replayed back-to-front.
//!
//! A script computes every address against the text as it was before the
//! script ran. Recording the edits here and applying them last-to-first keeps
//! each earlier address valid until its own edit runs, because every edit
//! applied before it sits at or after its position.
//!
//! Invariants:
//! * Entry 0 is always the `Null` sentinel.
//! * Consecutive inserts at one point fuse; adjacent deletes fuse.
//! * An address lower than the previous entry's is recorded anyway and
//!   reported as an [`ElogWarning`]. Entries are never reordered.

use std::fmt;

use tracing::{debug, warn};

use crate::error::TextError;
use crate::text::Text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElogKind {
    Null,
    Insert,
    Delete,
    Replace,
    Filename,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElogEntry {
    pub kind: ElogKind,
    pub q0: usize,
    /// Runes deleted at `q0`.
    pub nd: usize,
    /// Runes inserted at `q0`; the new name for `Filename`.
    pub r: Vec<char>,
}

impl ElogEntry {
    fn null() -> Self {
        Self {
            kind: ElogKind::Null,
            q0: 0,
            nd: 0,
            r: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.r.iter().collect()
    }
}

/// Non-fatal report from recording an out-of-sequence edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElogWarning {
    /// First address that went backwards.
    OutOfSequence,
    /// A further backwards address after the first warning.
    ResultProbablyWrong,
}

impl fmt::Display for ElogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ElogWarning::OutOfSequence => "warning: changes out of sequence",
            ElogWarning::ResultProbablyWrong => {
                "warning: changes out of sequence, edit result probably wrong"
            }
        })
    }
}

#[derive(Debug, Clone)]
pub struct Elog {
    entries: Vec<ElogEntry>,
    warned: bool,
}

impl Default for Elog {
    fn default() -> Self {
        Self::new()
    }
}

impl Elog {
    pub fn new() -> Self {
        Self {
            entries: vec![ElogEntry::null()],
            warned: false,
        }
    }

    /// Entries including the sentinel.
    pub fn entries(&self) -> &[ElogEntry] {
        &self.entries
    }

    /// Entry count including the sentinel.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when only the sentinel is present.
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 1
    }

    pub fn warned(&self) -> bool {
        self.warned
    }

    /// Drop everything but the sentinel.
    pub fn reset(&mut self) {
        self.entries.truncate(1);
        self.warned = false;
    }

    pub fn insert(&mut self, q0: usize, r: &[char]) -> Option<ElogWarning> {
        if r.is_empty() {
            return None;
        }
        let last = self.last_mut();
        if last.kind == ElogKind::Insert && last.q0 == q0 {
            last.r.extend_from_slice(r);
            return None;
        }
        let w = self.check_sequence(q0);
        self.entries.push(ElogEntry {
            kind: ElogKind::Insert,
            q0,
            nd: 0,
            r: r.to_vec(),
        });
        w
    }

    /// Record deletion of `[q0, q1)`.
    pub fn delete(&mut self, q0: usize, q1: usize) -> Option<ElogWarning> {
        if q1 <= q0 {
            return None;
        }
        let last = self.last_mut();
        if last.kind == ElogKind::Delete && last.q0 + last.nd == q0 {
            last.nd += q1 - q0;
            return None;
        }
        let w = self.check_sequence(q0);
        self.entries.push(ElogEntry {
            kind: ElogKind::Delete,
            q0,
            nd: q1 - q0,
            r: Vec::new(),
        });
        w
    }

    /// Record replacement of `[q0, q1)` by `r`.
    pub fn replace(&mut self, q0: usize, q1: usize, r: &[char]) -> Option<ElogWarning> {
        if q1 <= q0 && r.is_empty() {
            return None;
        }
        let w = self.check_sequence(q0);
        self.entries.push(ElogEntry {
            kind: ElogKind::Replace,
            q0,
            nd: q1.saturating_sub(q0),
            r: r.to_vec(),
        });
        w
    }

    /// Record a rename of the text.
    pub fn filename(&mut self, name: &str) {
        let last = self.last_mut();
        if last.kind == ElogKind::Filename {
            last.r = name.chars().collect();
            return;
        }
        self.entries.push(ElogEntry {
            kind: ElogKind::Filename,
            q0: 0,
            nd: 0,
            r: name.chars().collect(),
        });
    }

    /// Replay every entry onto `text`, last to first, as one undo unit.
    /// Addresses are clamped to the text's length at the time each entry runs.
    pub fn apply(&mut self, text: &mut Text) -> Result<(), TextError> {
        text.commit();
        for e in self.entries[1..].iter().rev() {
            let nr = text.nr();
            match e.kind {
                ElogKind::Null => {}
                ElogKind::Filename => {
                    debug!(target: "state.elog", name = %e.text(), "apply_filename");
                    text.set_name(e.text());
                }
                ElogKind::Delete => {
                    let q0 = e.q0.min(nr);
                    let q1 = (e.q0 + e.nd).min(nr);
                    debug!(target: "state.elog", q0, q1, "apply_delete");
                    text.delete(q0, q1)?;
                }
                ElogKind::Insert => {
                    let q0 = e.q0.min(nr);
                    debug!(target: "state.elog", q0, n = e.r.len(), "apply_insert");
                    insert_extending(text, q0, &e.text())?;
                }
                ElogKind::Replace => {
                    let q0 = e.q0.min(nr);
                    let q1 = (e.q0 + e.nd).min(nr);
                    debug!(target: "state.elog", q0, q1, n = e.r.len(), "apply_replace");
                    text.delete(q0, q1)?;
                    insert_extending(text, q0, &e.text())?;
                }
            }
        }
        text.commit();
        text.clamp_selection();
        self.reset();
        Ok(())
    }

    fn last_mut(&mut self) -> &mut ElogEntry {
        let i = self.entries.len() - 1;
        &mut self.entries[i]
    }

    fn check_sequence(&mut self, q0: usize) -> Option<ElogWarning> {
        let prev = &self.entries[self.entries.len() - 1];
        if prev.kind == ElogKind::Null || q0 >= prev.q0 {
            return None;
        }
        let w = if self.warned {
            ElogWarning::ResultProbablyWrong
        } else {
            self.warned = true;
            ElogWarning::OutOfSequence
        };
        warn!(target: "state.elog", q0, prev = prev.q0, "{w}");
        Some(w)
    }
}

/// Insert at `q0`; an insertion landing exactly on the selection's end
/// grows the selection over the new text.
fn insert_extending(text: &mut Text, q0: usize, s: &str) -> Result<(), TextError> {
    let (sq0, sq1) = text.selection();
    text.insert(q0, s)?;
    if sq1 == q0 && !s.is_empty() {
        let n = s.chars().count();
        text.set_selection(sq0, sq1 + n);
    }
    Ok(())
}
