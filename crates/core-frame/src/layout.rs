//! Placement rules: where a box goes given the point it would start at.
//!
//! Every walk over the box list repeats the same two steps per box: wrap the
//! pen to the next line if the box cannot start where it is, then advance
//! the pen past it. Keeping both steps here is what makes `ptofchar`,
//! `charofpt`, drawing and the incremental operations agree on positions.

use std::sync::Arc;

use crate::boxes::{BoxKind, FrBox, rune_len, split_box};
use crate::font::Font;
use crate::geom::{Point, Rect};

#[derive(Clone)]
pub(crate) struct Geom {
    /// Laid-out area; its height is a whole number of lines.
    pub r: Rect,
    pub font: Arc<dyn Font>,
    /// Tab stop spacing in pixels.
    pub maxtab: i32,
}

impl Geom {
    pub fn height(&self) -> i32 {
        self.font.height().max(1)
    }

    fn rune_widths(&self, b: &FrBox) -> Vec<i32> {
        let mut buf = [0u8; 4];
        b.text_str()
            .chars()
            .map(|c| self.font.bytes_width(c.encode_utf8(&mut buf).as_bytes()))
            .collect()
    }

    /// How much of `b` fits on the line at `pt`: a rune count for text, 0
    /// or 1 for a tab or newline. A text box at the left edge always gets
    /// at least one rune, however wide.
    pub fn can_fit(&self, pt: Point, b: &FrBox) -> usize {
        let mut left = self.r.max.x - pt.x;
        if !b.is_text() {
            return usize::from(b.minwid <= left);
        }
        if left >= b.wid {
            return b.nrune;
        }
        let mut nr = 0;
        for w in self.rune_widths(b) {
            left -= w;
            if left < 0 {
                break;
            }
            nr += 1;
        }
        if nr == 0 && pt.x <= self.r.min.x { 1 } else { nr }
    }

    fn next_line(&self, pt: &mut Point) {
        pt.x = self.r.min.x;
        pt.y += self.height();
    }

    /// Wrap if `b` does not fit whole; tabs and newlines only need their
    /// minimum width.
    pub fn line_wrap(&self, pt: &mut Point, b: &FrBox) {
        let w = if b.is_text() { b.wid } else { b.minwid };
        if pt.x > self.r.min.x && w > self.r.max.x - pt.x {
            self.next_line(pt);
        }
    }

    /// Wrap only if not even one rune of `b` fits.
    pub fn line_wrap0(&self, pt: &mut Point, b: &FrBox) {
        if pt.x > self.r.min.x && self.can_fit(*pt, b) == 0 {
            self.next_line(pt);
        }
    }

    pub fn advance(&self, pt: &mut Point, b: &FrBox) {
        if b.kind == BoxKind::Newline {
            self.next_line(pt);
        } else {
            pt.x += b.wid;
        }
    }

    /// Width `b` takes at `pt`. Only tabs change: they reach the next stop,
    /// measured from the left edge, or shrink to their minimum when the stop
    /// is off the line.
    pub fn new_wid0(&self, pt: Point, b: &FrBox) -> i32 {
        if b.kind != BoxKind::Tab {
            return b.wid;
        }
        let c = self.r.max.x;
        let tab = self.maxtab.max(1);
        let mut start = pt.x;
        let mut x = pt.x;
        if x + b.minwid > c {
            start = self.r.min.x;
            x = start;
        }
        x += tab;
        x -= (x - self.r.min.x) % tab;
        if x - start < b.minwid || x > c {
            x = start + b.minwid;
        }
        x - start
    }

    pub fn new_wid(&self, pt: Point, b: &mut FrBox) -> i32 {
        b.wid = self.new_wid0(pt, b);
        b.wid
    }

    /// Width painted for `b` at `pt`: a newline covers the rest of its line.
    pub fn paint_width(&self, pt: Point, b: &FrBox) -> i32 {
        let w = match b.kind {
            BoxKind::Newline => self.r.max.x - pt.x,
            _ => b.wid,
        };
        w.min(self.r.max.x - pt.x).max(0)
    }

    /// Lay out `boxes` from `pt`, splitting text boxes at line ends and
    /// sizing tabs. Boxes that would start below the last line are dropped
    /// and their runes taken off `nchars`. Returns the point after the last
    /// kept box.
    pub fn layout(&self, boxes: &mut Vec<FrBox>, nchars: &mut usize, mut pt: Point) -> Point {
        let mut nb = 0;
        while nb < boxes.len() {
            self.line_wrap0(&mut pt, &boxes[nb]);
            if pt.y >= self.r.max.y {
                *nchars -= rune_len(&boxes[nb..]);
                boxes.truncate(nb);
                break;
            }
            match boxes[nb].kind {
                BoxKind::Text => {
                    let n = self.can_fit(pt, &boxes[nb]);
                    if n != boxes[nb].nrune {
                        split_box(boxes, nb, n, &*self.font);
                    }
                    pt.x += boxes[nb].wid;
                }
                BoxKind::Newline => self.next_line(&mut pt),
                BoxKind::Tab => pt.x += self.new_wid(pt, &mut boxes[nb]),
            }
            nb += 1;
        }
        pt
    }

    /// Point of rune `p` counted from box `bn`, which starts at `pt`.
    pub fn ptofchar_from(&self, boxes: &[FrBox], mut p: usize, mut pt: Point, bn: usize) -> Point {
        for b in &boxes[bn.min(boxes.len())..] {
            self.line_wrap(&mut pt, b);
            let l = b.len();
            if p < l {
                if b.is_text() {
                    let end = crate::boxes::rune_index(&b.bytes, p);
                    pt.x += self.font.bytes_width(&b.bytes[..end]);
                }
                break;
            }
            p -= l;
            self.advance(&mut pt, b);
        }
        pt
    }

    pub fn ptofchar(&self, boxes: &[FrBox], p: usize) -> Point {
        self.ptofchar_from(boxes, p, self.r.min, 0)
    }

    /// Like `ptofchar` over the first `nb` boxes only, so the final wrap
    /// for box `nb` is not applied.
    pub fn ptofchar_nb(&self, boxes: &[FrBox], p: usize, nb: usize) -> Point {
        self.ptofchar_from(&boxes[..nb.min(boxes.len())], p, self.r.min, 0)
    }

    /// Rune whose cell holds `pt`, clamped to the text.
    pub fn charofpt(&self, boxes: &[FrBox], pt: Point) -> usize {
        let h = self.height();
        let mut pt = pt;
        pt.x = pt.x.clamp(self.r.min.x, self.r.max.x);
        pt.y = pt.y.max(self.r.min.y);
        pt.y -= (pt.y - self.r.min.y) % h;

        let mut qt = self.r.min;
        let mut p = 0;
        let mut bn = 0;
        while bn < boxes.len() && qt.y < pt.y {
            let b = &boxes[bn];
            self.line_wrap(&mut qt, b);
            if qt.y >= pt.y {
                break;
            }
            self.advance(&mut qt, b);
            p += b.len();
            bn += 1;
        }
        while bn < boxes.len() && qt.x <= pt.x {
            let b = &boxes[bn];
            self.line_wrap(&mut qt, b);
            if qt.y > pt.y {
                break;
            }
            if qt.x + b.wid > pt.x || b.kind == BoxKind::Newline {
                if !b.is_text() {
                    self.advance(&mut qt, b);
                } else {
                    for w in self.rune_widths(b) {
                        qt.x += w;
                        if qt.x > pt.x {
                            break;
                        }
                        p += 1;
                    }
                }
            } else {
                p += b.len();
                self.advance(&mut qt, b);
            }
            bn += 1;
        }
        p
    }

    /// Merge neighbouring text boxes of one style that share a line, from
    /// box `n0` (at `pt`) up to box `n1`. Returns whether the text reaches
    /// past the last line.
    pub fn clean(&self, boxes: &mut Vec<FrBox>, mut pt: Point, n0: usize, n1: usize) -> bool {
        let c = self.r.max.x;
        let mut n1 = n1.min(boxes.len());
        let mut nb = n0;
        while nb + 1 < n1 {
            self.line_wrap(&mut pt, &boxes[nb]);
            while nb + 1 < n1
                && boxes[nb].is_text()
                && boxes[nb + 1].is_text()
                && boxes[nb].style == boxes[nb + 1].style
                && pt.x + boxes[nb].wid + boxes[nb + 1].wid < c
            {
                crate::boxes::merge_box(boxes, nb);
                n1 -= 1;
            }
            self.advance(&mut pt, &boxes[nb]);
            nb += 1;
        }
        while nb < boxes.len() {
            self.line_wrap(&mut pt, &boxes[nb]);
            self.advance(&mut pt, &boxes[nb]);
            nb += 1;
        }
        pt.y >= self.r.max.y
    }
}
