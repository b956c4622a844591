//! Font metrics consumed by the layout engine.
//!
//! Layout only ever asks two questions: how tall a line is and how wide a run
//! of UTF-8 bytes is. Widths must be additive over runes; the engine measures
//! a box rune by rune when deciding where to wrap and all at once when
//! drawing it.

use unicode_width::UnicodeWidthChar;

pub trait Font: Send + Sync {
    /// Line height in pixels.
    fn height(&self) -> i32;

    /// Advance of the UTF-8 run `b` in pixels.
    fn bytes_width(&self, b: &[u8]) -> i32;

    fn str_width(&self, s: &str) -> i32 {
        self.bytes_width(s.as_bytes())
    }
}

/// Every rune has the same advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFont {
    pub width: i32,
    pub height: i32,
}

impl FixedFont {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl Font for FixedFont {
    fn height(&self) -> i32 {
        self.height
    }

    fn bytes_width(&self, b: &[u8]) -> i32 {
        // count lead bytes; continuation bytes are 0b10xx_xxxx
        let runes = b.iter().filter(|&&c| c & 0xC0 != 0x80).count();
        runes as i32 * self.width
    }
}

/// Terminal-style font: a rune covers as many cells as its display width.
/// Runes without a positive width (controls, combining marks) still take one
/// cell so that every rune stays addressable by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellFont {
    pub cell: i32,
    pub height: i32,
}

impl CellFont {
    pub const fn new(cell: i32, height: i32) -> Self {
        Self { cell, height }
    }
}

impl Font for CellFont {
    fn height(&self) -> i32 {
        self.height
    }

    fn bytes_width(&self, b: &[u8]) -> i32 {
        let cols: usize = String::from_utf8_lossy(b)
            .chars()
            .map(|c| c.width().unwrap_or(1).max(1))
            .sum();
        cols as i32 * self.cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_font_counts_runes_not_bytes() {
        let f = FixedFont::new(10, 13);
        assert_eq!(f.str_width("a本ポ"), 30);
        assert_eq!(f.bytes_width(b""), 0);
        assert_eq!(f.height(), 13);
    }

    #[test]
    fn cell_font_uses_display_width() {
        let f = CellFont::new(8, 16);
        assert_eq!(f.str_width("ab"), 16);
        assert_eq!(f.str_width("本"), 16);
        // combining acute still occupies a cell
        assert_eq!(f.str_width("e\u{301}"), 16);
    }
}
