//! Frame layout engine: lays runes out as boxes in a rectangle and keeps an
//! [`Image`] showing them, selection and tick included.
//!
//! Insert and delete are incremental. Only the boxes whose horizontal
//! position changes are moved one at a time; everything past the first box
//! that lines up again is shifted by whole lines. A [`Canvas`] stands in for
//! a real display so tests and headless hosts can read back what would be
//! on screen.
//!
//! Telemetry: `frame.init` on creation and resize at `debug`, and
//! `frame.insert`, `frame.delete`, `frame.select` per call at `trace`.

pub mod boxes;
mod canvas;
mod delete;
mod draw;
mod font;
mod frame;
mod geom;
mod image;
mod insert;
mod layout;

pub use boxes::{BoxKind, FrBox};
pub use canvas::{Canvas, CanvasStats, Glyph};
pub use core_config::Rgba;
pub use font::{CellFont, FixedFont, Font};
pub use frame::Frame;
pub use geom::{Point, Rect};
pub use image::{FrameColours, Image, Style};
