//! Headless image: one colour per pixel plus the glyphs drawn on it.
//!
//! A glyph is remembered at the pixel where its run placed its top-left
//! corner. Fills erase the glyphs they cover, blits carry them along, and
//! inversion leaves them alone. That is enough to read back what a frame
//! shows, line by line, without rasterising anything.

use core_config::Rgba;

use crate::font::Font;
use crate::geom::{Point, Rect};
use crate::image::Image;

const RGB_MASK: u32 = 0xffff_ff00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Glyph {
    pub ch: char,
    pub colour: Rgba,
}

/// Operation counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasStats {
    pub fills: usize,
    pub blits: usize,
    pub glyph_runs: usize,
    pub inversions: usize,
    pub flushes: usize,
}

#[derive(Debug, Clone)]
pub struct Canvas {
    bounds: Rect,
    pixels: Vec<Rgba>,
    glyphs: Vec<Option<Glyph>>,
    stats: CanvasStats,
}

impl Canvas {
    pub fn new(bounds: Rect, back: Rgba) -> Self {
        let n = (bounds.dx().max(0) * bounds.dy().max(0)) as usize;
        Self {
            bounds,
            pixels: vec![back; n],
            glyphs: vec![None; n],
            stats: CanvasStats::default(),
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.bounds.contains(Point::new(x, y)) {
            return None;
        }
        let w = self.bounds.dx();
        Some(((y - self.bounds.min.y) * w + (x - self.bounds.min.x)) as usize)
    }

    pub fn pixel(&self, pt: Point) -> Option<Rgba> {
        self.index(pt.x, pt.y).map(|i| self.pixels[i])
    }

    pub fn glyph(&self, pt: Point) -> Option<Glyph> {
        self.index(pt.x, pt.y).and_then(|i| self.glyphs[i])
    }

    /// Glyphs anchored on row `y`, left to right.
    pub fn row_text(&self, y: i32) -> String {
        (self.bounds.min.x..self.bounds.max.x)
            .filter_map(|x| self.glyph(Point::new(x, y)).map(|g| g.ch))
            .collect()
    }

    /// True when both canvases hold the same pixels and glyphs.
    pub fn same_picture(&self, other: &Canvas) -> bool {
        self.bounds == other.bounds && self.pixels == other.pixels && self.glyphs == other.glyphs
    }

    pub fn stats(&self) -> CanvasStats {
        self.stats
    }
}

impl Image for Canvas {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn fill(&mut self, r: Rect, colour: Rgba) {
        let c = r.intersect(&self.bounds);
        if c.is_empty() {
            return;
        }
        self.stats.fills += 1;
        for y in c.min.y..c.max.y {
            for x in c.min.x..c.max.x {
                if let Some(i) = self.index(x, y) {
                    self.pixels[i] = colour;
                    self.glyphs[i] = None;
                }
            }
        }
    }

    fn blit(&mut self, r: Rect, from: Point) {
        let c = r.intersect(&self.bounds);
        if c.is_empty() {
            return;
        }
        self.stats.blits += 1;
        // read the whole source first so overlapping moves are safe
        let mut moved = Vec::with_capacity((c.dx() * c.dy()) as usize);
        for y in c.min.y..c.max.y {
            for x in c.min.x..c.max.x {
                let sx = from.x + (x - r.min.x);
                let sy = from.y + (y - r.min.y);
                moved.push(self.index(sx, sy).map(|i| (self.pixels[i], self.glyphs[i])));
            }
        }
        let mut it = moved.into_iter();
        for y in c.min.y..c.max.y {
            for x in c.min.x..c.max.x {
                let src = it.next().flatten();
                if let (Some(i), Some((px, g))) = (self.index(x, y), src) {
                    self.pixels[i] = px;
                    self.glyphs[i] = g;
                }
            }
        }
    }

    fn bytes(&mut self, pt: Point, colour: Rgba, font: &dyn Font, b: &[u8]) -> Point {
        self.stats.glyph_runs += 1;
        let mut p = pt;
        let mut buf = [0u8; 4];
        for ch in String::from_utf8_lossy(b).chars() {
            if let Some(i) = self.index(p.x, p.y) {
                self.glyphs[i] = Some(Glyph { ch, colour });
            }
            p.x += font.bytes_width(ch.encode_utf8(&mut buf).as_bytes());
        }
        p
    }

    fn invert(&mut self, r: Rect) {
        let c = r.intersect(&self.bounds);
        if c.is_empty() {
            return;
        }
        self.stats.inversions += 1;
        for y in c.min.y..c.max.y {
            for x in c.min.x..c.max.x {
                if let Some(i) = self.index(x, y) {
                    self.pixels[i] = Rgba(self.pixels[i].0 ^ RGB_MASK);
                }
            }
        }
    }

    fn flush(&mut self) {
        self.stats.flushes += 1;
    }
}
