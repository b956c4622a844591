//! Piece-table byte buffer with grouped undo/redo, plus rune addressing.
//!
//! [`Buffer`] stores bytes only. Callers that think in runes (the text
//! model, the sam executor, the frame) translate through [`RuneIndex`].

mod buffer;
mod error;
mod piece;
mod runes;
mod undo;

pub use buffer::{Buffer, BufferReader, ReadAt};
pub use error::BufferError;
pub use runes::RuneIndex;
pub use undo::Revert;
