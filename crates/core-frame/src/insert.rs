//! Incremental insertion.
//!
//! New runes are scanned into boxes and laid out on their own from the
//! insertion point. The old boxes after the insertion point are then walked
//! until their new positions line up horizontally with their old ones; only
//! those are moved one by one. Everything after the line-up point moves by
//! whole lines, with two blits.

use crate::boxes::{FrBox, add_box, find_box, rune_len};
use crate::frame::FrameState;
use crate::geom::{Point, Rect};
use crate::image::{Image, Style};

impl<I: Image> FrameState<I> {
    /// Scan `runes` into boxes and lay them out from `ppt`, which is moved
    /// to the next line if not even the first rune fits. Returns the boxes,
    /// the runes kept and the point after them.
    fn bxscan(&self, runes: &[char], style: Style, ppt: &mut Point) -> (Vec<FrBox>, usize, Point) {
        let font = &*self.geom.font;
        let space = font.str_width(" ");
        let mut boxes = Vec::new();
        let mut nchars = 0;
        let mut nl = 0;
        let mut i = 0;
        while i < runes.len() && nl <= self.maxlines {
            match runes[i] {
                '\t' => {
                    boxes.push(FrBox::tab(space, style));
                    nchars += 1;
                    i += 1;
                }
                '\n' => {
                    boxes.push(FrBox::newline(style));
                    nl += 1;
                    nchars += 1;
                    i += 1;
                }
                _ => {
                    let start = i;
                    while i < runes.len() && runes[i] != '\t' && runes[i] != '\n' {
                        i += 1;
                    }
                    let s: String = runes[start..i].iter().collect();
                    boxes.push(FrBox::text(&s, font, style));
                    nchars += i - start;
                }
            }
        }
        if let Some(first) = boxes.first() {
            self.geom.line_wrap0(ppt, first);
        }
        let end = self.geom.layout(&mut boxes, &mut nchars, *ppt);
        (boxes, nchars, end)
    }

    /// Drop every old box from `bn` on that starts below the last line,
    /// walking from `pt` where box `bn` will be, with `p` runes before it.
    fn chop(&mut self, mut pt: Point, mut p: usize, bn: usize) {
        let mut bn = bn;
        while bn < self.boxes.len() {
            self.geom.line_wrap(&mut pt, &self.boxes[bn]);
            if pt.y >= self.geom.r.max.y {
                break;
            }
            p += self.boxes[bn].len();
            self.geom.advance(&mut pt, &self.boxes[bn]);
            bn += 1;
        }
        self.nchars = p;
        self.nlines = self.maxlines;
        self.boxes.truncate(bn);
    }

    fn selected_at(&self, p: usize) -> bool {
        self.sp0 <= p && p < self.sp1
    }

    /// Insert `runes` at `p0` and return how many of them were kept. Old
    /// runes pushed off the bottom are dropped from the end of the frame.
    pub(crate) fn insert(&mut self, runes: &[char], p0: usize, style: Style) -> usize {
        assert!(
            p0 <= self.nchars,
            "frame insert at {p0} past end {}",
            self.nchars
        );
        if runes.is_empty() {
            return 0;
        }
        let before = self.nchars;
        let h = self.geom.height();
        let r = self.geom.r;
        let font = self.geom.font.clone();

        let mut n0 = find_box(&mut self.boxes, 0, 0, p0, &*font);
        let mut cn0 = p0;
        let mut nn0 = n0;
        let mut pt0 = self.geom.ptofchar_nb(&self.boxes, p0, n0);
        let opt0 = pt0;
        let mut ppt0 = pt0;
        let (new_boxes, new_nchars, mut pt1) = self.bxscan(runes, style, &mut ppt0);
        let mut ppt1 = pt1;
        if let Some(b) = self.boxes.get(n0) {
            self.geom.line_wrap(&mut pt0, b);
            self.geom.line_wrap0(&mut ppt1, b);
        }
        if self.sp0 == self.sp1 {
            self.tick_off();
        }

        // Walk the old boxes until old and new x positions agree. pt0 is
        // where box n0 is now, pt1 where it will be.
        let mut pts: Vec<(Point, Point)> = Vec::new();
        while pt1.x != pt0.x && pt1.y != r.max.y && n0 < self.boxes.len() {
            self.geom.line_wrap(&mut pt0, &self.boxes[n0]);
            self.geom.line_wrap0(&mut pt1, &self.boxes[n0]);
            if self.boxes[n0].is_text() {
                let n = self.geom.can_fit(pt1, &self.boxes[n0]);
                assert!(n > 0, "frame insert: nothing fits at {pt1:?}");
                if n != self.boxes[n0].nrune {
                    crate::boxes::split_box(&mut self.boxes, n0, n, &*font);
                }
            }
            if pt1.y >= r.max.y {
                break;
            }
            pts.push((pt0, pt1));
            self.geom.advance(&mut pt0, &self.boxes[n0]);
            if self.boxes[n0].kind == crate::boxes::BoxKind::Newline {
                self.geom.advance(&mut pt1, &self.boxes[n0]);
            } else {
                pt1.x += self.geom.new_wid(pt1, &mut self.boxes[n0]);
            }
            cn0 += self.boxes[n0].len();
            n0 += 1;
        }
        assert!(pt1.y <= r.max.y, "frame insert: pt1 too far");

        if pt1.y >= r.max.y && n0 < self.boxes.len() {
            self.nchars -= rune_len(&self.boxes[n0..]);
            self.boxes.truncate(n0);
        }
        if n0 == self.boxes.len() {
            self.nlines = ((pt1.y - r.min.y) / h) as usize + usize::from(pt1.x > r.min.x);
        } else if pt1.y != pt0.y {
            let y = r.max.y;
            let q0 = pt0.y + h;
            let q1 = pt1.y + h;
            self.nlines += ((q1 - q0) / h) as usize;
            if self.nlines > self.maxlines {
                self.chop(ppt1, p0, nn0);
            }
            if pt1.y < y {
                if q1 < y {
                    self.blit(Rect::new(r.min.x, q1, r.max.x, y), Point::new(r.min.x, q0));
                }
                self.blit(
                    Rect::new(pt1.x, pt1.y, pt1.x + (r.max.x - pt0.x), q1),
                    pt0,
                );
            }
        }

        // Move the boxes between the insertion and the line-up point, last
        // first so no source is overwritten before it is copied.
        let mut y = if pt1.y == r.max.y { pt1.y } else { 0 };
        let mut bi = n0;
        for (k, &(old, new)) in pts.iter().enumerate().rev() {
            bi -= 1;
            let Some(b) = self.boxes.get(bi) else {
                continue;
            };
            let (is_text, wid, len) = (b.is_text(), b.wid, b.len());
            let paint = self.geom.paint_width(new, b);
            if is_text {
                self.blit(Rect::new(new.x, new.y, new.x + wid, new.y + h), old);
                let col = if self.selected_at(cn0) { self.cols.high } else { self.cols.back };
                if k == 0 && new.y > opt0.y {
                    // the first displaced box wrapped: its old line is stale
                    self.fill(Rect::new(opt0.x, opt0.y, r.max.x, opt0.y + h), col);
                }
                if new.y < y {
                    self.fill(Rect::new(new.x + wid, new.y, r.max.x, new.y + h), col);
                }
                y = new.y;
                cn0 -= len;
            } else {
                cn0 -= 1;
                let col = if self.selected_at(cn0) { self.cols.high } else { self.cols.back };
                self.fill(Rect::new(new.x, new.y, new.x + paint, new.y + h), col);
                y = if new.x == r.min.x { new.y } else { 0 };
            }
        }

        // Insertion can extend the selection, so the test differs.
        let selected = self.sp0 < p0 && p0 <= self.sp1;
        let col = if selected { self.cols.high } else { self.cols.back };
        self.select_paint(ppt0, ppt1, col);
        self.draw_text(&new_boxes, ppt0, selected);

        let added = new_boxes.len();
        add_box(&mut self.boxes, nn0, added);
        for (k, b) in new_boxes.into_iter().enumerate() {
            self.boxes[nn0 + k] = b;
        }
        if nn0 > 0 && self.boxes[nn0 - 1].is_text() && ppt0.x - self.boxes[nn0 - 1].wid >= r.min.x {
            nn0 -= 1;
            ppt0.x -= self.boxes[nn0].wid;
        }
        n0 += added;
        let n1 = if n0 + 1 < self.boxes.len() { n0 + 1 } else { n0 };
        self.lastlinefull = self.geom.clean(&mut self.boxes, ppt0, nn0, n1);

        self.nchars += new_nchars;
        if self.sp0 >= p0 {
            self.sp0 += new_nchars;
        }
        self.sp0 = self.sp0.min(self.nchars);
        if self.sp1 >= p0 {
            self.sp1 += new_nchars;
        }
        self.sp1 = self.sp1.min(self.nchars);
        self.full = self.lastlinefull || self.nchars < before + runes.len();
        self.tick_at_selection();
        new_nchars
    }
}
