//! Incremental deletion.
//!
//! The boxes after the hole are pulled back one at a time, each blitted
//! from where it was to where it now goes, until a box lands at the same x
//! it started from. From there on everything moves up by whole lines.

use crate::boxes::{BoxKind, close_box, find_box, split_box};
use crate::frame::FrameState;
use crate::geom::{Point, Rect};
use crate::image::Image;

impl<I: Image> FrameState<I> {
    pub(crate) fn delete(&mut self, p0: usize, p1: usize) -> usize {
        if p0 >= self.nchars || p1 <= p0 {
            return 0;
        }
        let p1 = p1.min(self.nchars);
        let h = self.geom.height();
        let r = self.geom.r;
        let font = self.geom.font.clone();

        let mut n0 = find_box(&mut self.boxes, 0, 0, p0, &*font);
        assert!(n0 < self.boxes.len(), "frame delete: {p0} off the end");
        let mut n1 = find_box(&mut self.boxes, n0, p0, p1, &*font);
        let mut pt0 = self.geom.ptofchar_nb(&self.boxes, p0, n0);
        let mut pt1 = self.ptofchar(p1);
        if self.sp0 == self.sp1 {
            self.tick_off();
        }
        let mut nn0 = n0;
        let mut ppt0 = pt0;

        // Boxes n0..n1 are going away. Move box n1 into slot n0 until the
        // kept text lines up with where it already is.
        let mut cn1 = p1;
        while pt1.x != pt0.x && n1 < self.boxes.len() {
            let wrapped_from = pt0;
            self.geom.line_wrap0(&mut pt0, &self.boxes[n1]);
            self.geom.line_wrap(&mut pt1, &self.boxes[n1]);
            if pt0.y != wrapped_from.y {
                let col = if self.sp0 < cn1 && cn1 < self.sp1 {
                    self.cols.high
                } else {
                    self.cols.back
                };
                self.fill(
                    Rect::new(wrapped_from.x, wrapped_from.y, r.max.x, wrapped_from.y + h),
                    col,
                );
            }
            if self.boxes[n1].is_text() {
                let n = self.geom.can_fit(pt0, &self.boxes[n1]);
                assert!(n > 0, "frame delete: nothing fits at {pt0:?}");
                if n != self.boxes[n1].nrune {
                    split_box(&mut self.boxes, n1, n, &*font);
                }
            }
            let col = if self.sp0 <= cn1 && cn1 < self.sp1 {
                self.cols.high
            } else {
                self.cols.back
            };
            let kind = self.boxes[n1].kind;
            let old_wid = self.boxes[n1].wid;
            match kind {
                BoxKind::Text => {
                    self.blit(Rect::new(pt0.x, pt0.y, pt0.x + old_wid, pt0.y + h), pt1);
                    pt1.x += old_wid;
                }
                BoxKind::Tab => {
                    pt1.x += old_wid;
                    let w = self.geom.new_wid(pt0, &mut self.boxes[n1]);
                    let x = (pt0.x + w).min(r.max.x);
                    self.fill(Rect::new(pt0.x, pt0.y, x, pt0.y + h), col);
                }
                BoxKind::Newline => {
                    self.geom.advance(&mut pt1, &self.boxes[n1]);
                    self.fill(Rect::new(pt0.x, pt0.y, r.max.x, pt0.y + h), col);
                }
            }
            self.geom.advance(&mut pt0, &self.boxes[n1]);
            cn1 += self.boxes[n1].len();
            self.boxes.swap(n0, n1);
            n0 += 1;
            n1 += 1;
        }

        let back = self.cols.back;
        if n1 == self.boxes.len() && pt0.x != pt1.x {
            // deleting the last thing in the frame
            self.select_paint(pt0, pt1, back);
        }
        if pt1.y != pt0.y {
            let pt2 = self.geom.ptofchar_from(&self.boxes, usize::MAX, pt1, n1);
            if n1 < self.boxes.len() {
                let q0 = pt0.y + h;
                let q1 = pt1.y + h;
                let q2 = (pt2.y + h).min(r.max.y);
                self.blit(Rect::new(pt0.x, pt0.y, pt0.x + (r.max.x - pt1.x), q0), pt1);
                self.blit(
                    Rect::new(r.min.x, q0, r.max.x, q0 + (q2 - q1)),
                    Point::new(r.min.x, q1),
                );
                self.select_paint(Point::new(pt2.x, pt2.y - (pt1.y - pt0.y)), pt2, back);
            } else {
                self.select_paint(pt0, pt2, back);
            }
        }

        if n1 > n0 {
            close_box(&mut self.boxes, n0, n1 - 1);
        }
        if nn0 > 0 && self.boxes[nn0 - 1].is_text() && ppt0.x - self.boxes[nn0 - 1].wid >= r.min.x {
            nn0 -= 1;
            ppt0.x -= self.boxes[nn0].wid;
        }
        let n1 = if n0 + 1 < self.boxes.len() { n0 + 1 } else { n0 };
        self.lastlinefull = self.geom.clean(&mut self.boxes, ppt0, nn0, n1);

        let gone = p1 - p0;
        if self.sp1 > p1 {
            self.sp1 -= gone;
        } else if self.sp1 > p0 {
            self.sp1 = p0;
        }
        if self.sp0 > p1 {
            self.sp0 -= gone;
        } else if self.sp0 > p0 {
            self.sp0 = p0;
        }
        self.nchars -= gone;
        self.full = self.lastlinefull;
        // only an empty selection gets its tick back
        self.tick_at_selection();

        let old = self.nlines;
        self.nlines = self.count_lines();
        old.saturating_sub(self.nlines)
    }
}
