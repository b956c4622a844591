use core_text::BufferError;
use thiserror::Error;

/// Failure of a rune-addressed text operation. The text is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("rune offset {offset} out of range ({nr} runes)")]
    RuneOutOfRange { offset: usize, nr: usize },
    #[error("inverted rune range {q0}..{q1}")]
    InvertedRange { q0: usize, q1: usize },
    #[error(transparent)]
    Buffer(#[from] BufferError),
}
