//! Drawing surface and palette.

use core_config::{ColourConfig, Rgba};

use crate::font::Font;
use crate::geom::{Point, Rect};

/// Backing image a frame draws into. Implementations clip every operation
/// to their own bounds.
pub trait Image {
    fn bounds(&self) -> Rect;

    fn fill(&mut self, r: Rect, colour: Rgba);

    /// Copy the `r`-sized area whose top-left is `from` onto `r`. Source and
    /// destination may overlap.
    fn blit(&mut self, r: Rect, from: Point);

    /// Draw the glyph run `b` with its top-left at `pt`; returns the point
    /// just past the run.
    fn bytes(&mut self, pt: Point, colour: Rgba, font: &dyn Font, b: &[u8]) -> Point;

    /// Invert every pixel of `r`. Inverting the same area twice restores it.
    fn invert(&mut self, r: Rect);

    fn flush(&mut self) {}
}

/// The five colours a frame paints with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameColours {
    pub back: Rgba,
    pub high: Rgba,
    pub bord: Rgba,
    pub text: Rgba,
    pub htext: Rgba,
}

impl From<ColourConfig> for FrameColours {
    fn from(c: ColourConfig) -> Self {
        Self {
            back: c.back,
            high: c.high,
            bord: c.bord,
            text: c.text,
            htext: c.htext,
        }
    }
}

impl Default for FrameColours {
    fn default() -> Self {
        ColourConfig::default().into()
    }
}

/// Per-box drawing attributes. Boxes merge only when their styles match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Foreground override; `None` draws in the palette's text colour.
    pub fg: Option<Rgba>,
}

impl Style {
    pub const fn fg(colour: Rgba) -> Self {
        Self { fg: Some(colour) }
    }
}
