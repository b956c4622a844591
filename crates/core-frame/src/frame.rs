//! The frame: a box list laid out in a rectangle and drawn into an image.
//!
//! A frame does not own text. It holds exactly the runes it has been given
//! through `insert` since it was created or last cleared, minus whatever
//! did not fit. Every public method takes the frame's lock for its whole
//! duration and flushes the image before returning.

use std::sync::{Arc, Mutex, MutexGuard};

use core_events::{Observers, TextObserver, TextOp};
use tracing::{debug, trace};

use crate::boxes::FrBox;
use crate::font::Font;
use crate::geom::{Point, Rect};
use crate::image::{FrameColours, Image, Style};
use crate::layout::Geom;

pub(crate) struct FrameState<I> {
    pub geom: Geom,
    pub image: I,
    pub cols: FrameColours,
    /// Rectangle as given; `geom.r` trims it to whole lines.
    pub entire: Rect,
    pub boxes: Vec<FrBox>,
    pub nchars: usize,
    pub nlines: usize,
    pub maxlines: usize,
    pub sp0: usize,
    pub sp1: usize,
    /// Where the tick is drawn, if it is.
    pub tick: Option<Rect>,
    pub lastlinefull: bool,
    pub full: bool,
}

impl<I: Image> FrameState<I> {
    fn new(r: Rect, font: Arc<dyn Font>, image: I, cols: FrameColours) -> Self {
        let maxtab = 8 * font.str_width("0");
        let mut st = Self {
            geom: Geom { r, font, maxtab },
            image,
            cols,
            entire: r,
            boxes: Vec::new(),
            nchars: 0,
            nlines: 0,
            maxlines: 0,
            sp0: 0,
            sp1: 0,
            tick: None,
            lastlinefull: false,
            full: false,
        };
        st.set_rects(r);
        st
    }

    pub fn set_rects(&mut self, r: Rect) {
        let h = self.geom.height();
        self.entire = r;
        self.geom.r = r;
        let dy = r.dy().max(0);
        self.geom.r.max.y -= dy % h;
        self.maxlines = (dy / h) as usize;
    }

    pub fn ptofchar(&self, p: usize) -> Point {
        self.geom.ptofchar(&self.boxes, p)
    }

    /// Lines used, from the point just past the last rune.
    pub fn count_lines(&self) -> usize {
        let end = self.ptofchar(self.nchars);
        let r = self.geom.r;
        ((end.y - r.min.y) / self.geom.height()) as usize + usize::from(end.x > r.min.x)
    }

    /// Forget all boxes without drawing.
    pub fn reset(&mut self) {
        self.boxes.clear();
        self.nchars = 0;
        self.nlines = 0;
        self.sp0 = 0;
        self.sp1 = 0;
        self.tick = None;
        self.lastlinefull = false;
        self.full = false;
    }

    /// Consecutive runes of one style, for re-inserting after a resize.
    fn runs(&self) -> Vec<(Vec<char>, Style)> {
        let mut runs: Vec<(Vec<char>, Style)> = Vec::new();
        for b in &self.boxes {
            match runs.last_mut() {
                Some((r, s)) if *s == b.style => r.extend(b.text_str().chars()),
                _ => runs.push((b.text_str().chars().collect(), b.style)),
            }
        }
        runs
    }

    pub fn set_rect(&mut self, r: Rect) {
        let runs = self.runs();
        let (sp0, sp1) = (self.sp0, self.sp1);
        self.reset();
        self.set_rects(r);
        self.image.fill(self.entire, self.cols.back);
        for (runes, style) in runs {
            let p = self.nchars;
            self.insert(&runes, p, style);
            if self.full {
                break;
            }
        }
        self.select(sp0.min(self.nchars), sp1.min(self.nchars));
    }

    pub fn clear(&mut self) {
        self.reset();
        self.image.fill(self.entire, self.cols.back);
    }
}

/// Text layout engine over an [`Image`].
pub struct Frame<I> {
    state: Mutex<FrameState<I>>,
    observers: Mutex<Observers>,
}

impl<I: Image> Frame<I> {
    /// Bind a frame to `r`, a font, a backing image and a palette. The tab
    /// stop defaults to eight widths of the font's '0'.
    pub fn new(r: Rect, font: Arc<dyn Font>, image: I, cols: FrameColours) -> Self {
        debug!(target: "frame.init", ?r, "init");
        Self {
            state: Mutex::new(FrameState::new(r, font, image, cols)),
            observers: Mutex::new(Observers::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FrameState<I>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, op: TextOp, offset: usize, count: usize) {
        if count == 0 {
            return;
        }
        let mut obs = self.observers.lock().unwrap_or_else(|e| e.into_inner());
        obs.emit(op, offset, count);
    }

    pub fn add_observer(&self, observer: Box<dyn TextObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .add(observer);
    }

    /// Insert `runes` at rune `p`. Returns true when the frame is full:
    /// some text did not fit or the last line is used up.
    ///
    /// Old runes pushed off the bottom reach observers as a `Delete` at the
    /// new end of the frame, after the `Insert` of the runes that were kept.
    ///
    /// # Panics
    /// If `p` is past the frame's last rune.
    pub fn insert(&self, runes: &[char], p: usize) -> bool {
        self.insert_styled(runes, p, Style::default())
    }

    pub fn insert_str(&self, s: &str, p: usize) -> bool {
        let runes: Vec<char> = s.chars().collect();
        self.insert(&runes, p)
    }

    /// Like [`Frame::insert`], drawing the new runes with `style`.
    pub fn insert_styled(&self, runes: &[char], p: usize, style: Style) -> bool {
        let (full, added, end, dropped) = {
            let mut st = self.lock();
            let before = st.nchars;
            let added = st.insert(runes, p, style);
            st.image.flush();
            let dropped = (before + added).saturating_sub(st.nchars);
            trace!(
                target: "frame.insert",
                p,
                n = runes.len(),
                kept = added,
                dropped,
                full = st.full,
                "insert"
            );
            (st.full, added, st.nchars, dropped)
        };
        self.emit(TextOp::Insert, p, added);
        self.emit(TextOp::Delete, end, dropped);
        full
    }

    /// Delete runes `[p0, p1)`, clamping `p1` to the text. Returns how many
    /// lines the used height shrank by.
    pub fn delete(&self, p0: usize, p1: usize) -> usize {
        let (shrunk, removed) = {
            let mut st = self.lock();
            let before = st.nchars;
            let shrunk = st.delete(p0, p1);
            st.image.flush();
            trace!(target: "frame.delete", p0, p1, shrunk, "delete");
            (shrunk, before.saturating_sub(st.nchars))
        };
        self.emit(TextOp::Delete, p0, removed);
        shrunk
    }

    pub fn ptofchar(&self, p: usize) -> Point {
        self.lock().ptofchar(p)
    }

    pub fn charofpt(&self, pt: Point) -> usize {
        let st = self.lock();
        st.geom.charofpt(&st.boxes, pt)
    }

    /// Make `[p0, p1)` the selection; an empty selection shows the tick.
    pub fn select(&self, p0: usize, p1: usize) {
        let mut st = self.lock();
        st.select(p0, p1);
        st.image.flush();
    }

    pub fn tick(&self, pt: Point, on: bool) {
        let mut st = self.lock();
        st.tick(pt, on);
        st.image.flush();
    }

    pub fn redraw(&self) {
        let mut st = self.lock();
        st.redraw();
        st.image.flush();
    }

    /// Drop all text and blank the frame.
    pub fn clear(&self) {
        let mut st = self.lock();
        st.clear();
        st.image.flush();
    }

    /// Move to a new rectangle and lay the current text out again. Text
    /// that no longer fits is dropped.
    pub fn set_rect(&self, r: Rect) {
        let mut st = self.lock();
        debug!(target: "frame.init", ?r, "set_rect");
        st.set_rect(r);
        st.image.flush();
    }

    /// Tab stop spacing in pixels. Applies to tabs laid out afterwards.
    pub fn set_tab_width(&self, px: i32) {
        self.lock().geom.maxtab = px.max(1);
    }

    pub fn tab_width(&self) -> i32 {
        self.lock().geom.maxtab
    }

    pub fn rect(&self) -> Rect {
        self.lock().geom.r
    }

    pub fn nchars(&self) -> usize {
        self.lock().nchars
    }

    pub fn nlines(&self) -> usize {
        self.lock().nlines
    }

    pub fn max_lines(&self) -> usize {
        self.lock().maxlines
    }

    pub fn selection(&self) -> (usize, usize) {
        let st = self.lock();
        (st.sp0, st.sp1)
    }

    pub fn is_full(&self) -> bool {
        self.lock().full
    }

    pub fn is_ticked(&self) -> bool {
        self.lock().tick.is_some()
    }

    /// Copy of the box list.
    pub fn boxes(&self) -> Vec<FrBox> {
        self.lock().boxes.clone()
    }

    /// The runes the frame holds.
    pub fn text(&self) -> String {
        self.lock().boxes.iter().map(|b| b.text_str()).collect()
    }

    pub fn with_image<R>(&self, f: impl FnOnce(&I) -> R) -> R {
        f(&self.lock().image)
    }
}
