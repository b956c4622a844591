//! Painting: selection highlight, glyph runs, the tick and full redraws.

use core_config::Rgba;
use tracing::trace;

use crate::boxes::{BoxKind, FrBox, rune_index};
use crate::frame::FrameState;
use crate::geom::{Point, Rect};
use crate::image::Image;

impl<I: Image> FrameState<I> {
    pub(crate) fn fill(&mut self, r: Rect, colour: Rgba) {
        let r = r.intersect(&self.geom.r);
        if !r.is_empty() {
            self.image.fill(r, colour);
        }
    }

    /// Copy the `r`-sized area at `from` onto `r`, within the frame.
    pub(crate) fn blit(&mut self, r: Rect, from: Point) {
        let c = r.intersect(&self.geom.r);
        if c.is_empty() {
            return;
        }
        let from = Point::new(from.x + (c.min.x - r.min.x), from.y + (c.min.y - r.min.y));
        self.image.blit(c, from);
    }

    /// Paint the area a selection from `p0` to `p1` would cover, across
    /// however many lines lie between them.
    pub(crate) fn select_paint(&mut self, p0: Point, p1: Point, colour: Rgba) {
        let h = self.geom.height();
        let r = self.geom.r;
        if p0.y >= r.max.y {
            return;
        }
        let q0 = Point::new(p0.x, p0.y + h);
        let q1 = Point::new(p1.x, p1.y + h);
        let n = (p1.y - p0.y) / h;
        if n == 0 {
            self.fill(Rect::from_points(p0, q1), colour);
        } else {
            let x0 = p0.x.min(r.max.x - 1);
            self.fill(Rect::new(x0, p0.y, r.max.x, q0.y), colour);
            if n > 1 {
                self.fill(Rect::new(r.min.x, q0.y, r.max.x, p1.y), colour);
            }
            self.fill(Rect::new(r.min.x, p1.y, q1.x, q1.y), colour);
        }
    }

    fn fg(&self, b: &FrBox, selected: bool) -> Rgba {
        if selected {
            self.cols.htext
        } else {
            b.style.fg.unwrap_or(self.cols.text)
        }
    }

    /// Draw the glyphs of `boxes`, laid out from `pt`.
    pub(crate) fn draw_text(&mut self, boxes: &[FrBox], mut pt: Point, selected: bool) {
        for b in boxes {
            self.geom.line_wrap(&mut pt, b);
            if b.is_text() {
                let fg = self.fg(b, selected);
                self.image.bytes(pt, fg, &*self.geom.font, &b.bytes);
            }
            self.geom.advance(&mut pt, b);
        }
    }

    /// Repaint runes `[p0, p1)`, which start at `pt`, as selected or not.
    /// Returns the point after the last rune painted.
    pub(crate) fn draw_sel0(&mut self, mut pt: Point, p0: usize, p1: usize, selected: bool) -> Point {
        let back = if selected { self.cols.high } else { self.cols.back };
        let h = self.geom.height();
        let rmax = self.geom.r.max.x;
        let mut p = 0;
        let mut nb = 0;
        let mut trim = false;
        while nb < self.boxes.len() && p < p1 {
            let mut nr = self.boxes[nb].len();
            if p + nr <= p0 {
                p += nr;
                nb += 1;
                continue;
            }
            if p >= p0 {
                let qt = pt;
                self.geom.line_wrap(&mut pt, &self.boxes[nb]);
                if pt.y > qt.y {
                    // the end of a wrapped line belongs to the run
                    self.fill(Rect::new(qt.x, qt.y, rmax, pt.y), back);
                }
            }
            let mut skip = 0;
            if p < p0 {
                skip = p0 - p;
                nr -= skip;
                p = p0;
            }
            trim = false;
            if p + nr > p1 {
                nr -= p + nr - p1;
                trim = true;
            }
            let b = &self.boxes[nb];
            let (w, run) = match b.kind {
                BoxKind::Text => {
                    let s = rune_index(&b.bytes, skip);
                    let e = rune_index(&b.bytes, skip + nr);
                    let w = if nr == b.nrune {
                        b.wid
                    } else {
                        self.geom.font.bytes_width(&b.bytes[s..e])
                    };
                    (w, Some(b.bytes[s..e].to_vec()))
                }
                BoxKind::Tab => (b.wid, None),
                BoxKind::Newline => (rmax - pt.x, None),
            };
            let fg = self.fg(b, selected);
            let newline = b.kind == BoxKind::Newline;
            let x = (pt.x + w).min(rmax);
            self.fill(Rect::new(pt.x, pt.y, x, pt.y + h), back);
            if let Some(run) = run {
                self.image.bytes(pt, fg, &*self.geom.font, &run);
            }
            if newline {
                pt = Point::new(self.geom.r.min.x, pt.y + h);
            } else {
                pt.x += w;
            }
            p += nr;
            nb += 1;
        }
        if p1 > p0 && nb > 0 && nb < self.boxes.len() && self.boxes[nb - 1].is_text() && !trim {
            let qt = pt;
            self.geom.line_wrap(&mut pt, &self.boxes[nb]);
            if pt.y > qt.y {
                self.fill(Rect::new(qt.x, qt.y, rmax, pt.y), back);
            }
        }
        pt
    }

    /// Paint `[p0, p1)` as selected or not; an empty range draws or erases
    /// the tick at `pt`.
    pub(crate) fn draw_sel(&mut self, pt: Point, p0: usize, p1: usize, selected: bool) {
        if self.tick.is_some() {
            self.tick_off();
        }
        if p0 == p1 {
            self.tick(pt, selected);
            return;
        }
        self.draw_sel0(pt, p0, p1, selected);
    }

    pub(crate) fn select(&mut self, p0: usize, p1: usize) {
        let (mut p0, mut p1) = if p0 <= p1 { (p0, p1) } else { (p1, p0) };
        p0 = p0.min(self.nchars);
        p1 = p1.min(self.nchars);
        trace!(target: "frame.select", p0, p1, old0 = self.sp0, old1 = self.sp1, "select");
        let (o0, o1) = (self.sp0, self.sp1);
        let pt = self.ptofchar(o0);
        self.draw_sel(pt, o0, o1, false);
        let pt = self.ptofchar(p0);
        self.draw_sel(pt, p0, p1, true);
        self.sp0 = p0;
        self.sp1 = p1;
    }

    /// Rectangle the tick covers for a caret at `pt`: one pixel wide, its
    /// right edge at `pt.x`, kept inside the frame.
    fn tick_rect(&self, pt: Point) -> Rect {
        let r = self.geom.r;
        let x = (pt.x - 1).clamp(r.min.x, (r.max.x - 1).max(r.min.x));
        Rect::new(x, pt.y, x + 1, pt.y + self.geom.height())
    }

    pub(crate) fn tick(&mut self, pt: Point, on: bool) {
        if !on {
            self.tick_off();
            return;
        }
        let r = self.geom.r;
        let inside = pt.x >= r.min.x && pt.x <= r.max.x && pt.y >= r.min.y && pt.y < r.max.y;
        if self.tick.is_some() || !inside {
            return;
        }
        let tr = self.tick_rect(pt);
        self.image.invert(tr);
        self.tick = Some(tr);
    }

    pub(crate) fn tick_off(&mut self) {
        if let Some(tr) = self.tick.take() {
            self.image.invert(tr);
        }
    }

    /// Show the tick if the selection is empty.
    pub(crate) fn tick_at_selection(&mut self) {
        if self.sp0 == self.sp1 {
            let pt = self.ptofchar(self.sp0);
            self.tick(pt, true);
        }
    }

    /// Repaint everything from the box list.
    pub(crate) fn redraw(&mut self) {
        let ticked = self.tick.take().is_some();
        let entire = self.entire;
        self.image.fill(entire, self.cols.back);
        let start = self.ptofchar(0);
        if self.sp0 == self.sp1 {
            self.draw_sel0(start, 0, self.nchars, false);
            if ticked {
                self.tick_at_selection();
            }
            return;
        }
        let (sp0, sp1, n) = (self.sp0, self.sp1, self.nchars);
        let pt = self.draw_sel0(start, 0, sp0, false);
        let pt = self.draw_sel0(pt, sp0, sp1, true);
        self.draw_sel0(pt, sp1, n, false);
    }
}
