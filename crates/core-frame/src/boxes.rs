//! Boxes and the list operations the layout engine is built from.
//!
//! A box is a run of runes with no tab or newline in it, or a single tab or
//! newline. Text boxes know their width; a tab's width depends on where it
//! lands and is recomputed whenever it moves.

use std::borrow::Cow;

use crate::font::Font;
use crate::image::Style;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxKind {
    Text,
    Tab,
    Newline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrBox {
    pub kind: BoxKind,
    /// UTF-8 runes of a text box; empty otherwise.
    pub bytes: Vec<u8>,
    /// Runes in a text box.
    pub nrune: usize,
    /// Width in pixels. Zero for a newline.
    pub wid: i32,
    /// Narrowest a tab or newline may be.
    pub minwid: i32,
    pub style: Style,
}

impl FrBox {
    pub fn text(s: &str, font: &dyn Font, style: Style) -> Self {
        Self {
            kind: BoxKind::Text,
            bytes: s.as_bytes().to_vec(),
            nrune: s.chars().count(),
            wid: font.str_width(s),
            minwid: 0,
            style,
        }
    }

    /// A tab as scanned; its width is assigned by layout.
    pub fn tab(space_width: i32, style: Style) -> Self {
        Self {
            kind: BoxKind::Tab,
            bytes: Vec::new(),
            nrune: 0,
            wid: space_width,
            minwid: space_width,
            style,
        }
    }

    pub fn newline(style: Style) -> Self {
        Self {
            kind: BoxKind::Newline,
            bytes: Vec::new(),
            nrune: 0,
            wid: 0,
            minwid: 0,
            style,
        }
    }

    fn placeholder() -> Self {
        Self::newline(Style::default())
    }

    pub fn is_text(&self) -> bool {
        self.kind == BoxKind::Text
    }

    /// Runes this box stands for.
    pub fn len(&self) -> usize {
        match self.kind {
            BoxKind::Text => self.nrune,
            BoxKind::Tab | BoxKind::Newline => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text_str(&self) -> Cow<'_, str> {
        match self.kind {
            BoxKind::Text => String::from_utf8_lossy(&self.bytes),
            BoxKind::Tab => Cow::Borrowed("\t"),
            BoxKind::Newline => Cow::Borrowed("\n"),
        }
    }
}

/// Byte offset of rune `n` in the UTF-8 run `b`, or `b.len()` past the end.
pub fn rune_index(b: &[u8], n: usize) -> usize {
    let mut seen = 0;
    for (i, &c) in b.iter().enumerate() {
        if c & 0xC0 != 0x80 {
            if seen == n {
                return i;
            }
            seen += 1;
        }
    }
    b.len()
}

/// Keep the first `n` runes of a text box.
pub fn truncate_box(b: &mut FrBox, n: usize, font: &dyn Font) {
    assert!(b.is_text() && n <= b.nrune, "truncate_box: {n} of {:?}", b);
    let cut = rune_index(&b.bytes, n);
    b.bytes.truncate(cut);
    b.nrune = n;
    b.wid = font.bytes_width(&b.bytes);
}

/// Drop the first `n` runes of a text box.
pub fn chop_box(b: &mut FrBox, n: usize, font: &dyn Font) {
    assert!(b.is_text() && n <= b.nrune, "chop_box: {n} of {:?}", b);
    let cut = rune_index(&b.bytes, n);
    b.bytes.drain(..cut);
    b.nrune -= n;
    b.wid = font.bytes_width(&b.bytes);
}

/// Open `n` slots at `i`; boxes from `i` on move right.
pub fn add_box(boxes: &mut Vec<FrBox>, i: usize, n: usize) {
    boxes.splice(i..i, std::iter::repeat_with(FrBox::placeholder).take(n));
}

/// Remove boxes `i..=j`.
pub fn close_box(boxes: &mut Vec<FrBox>, i: usize, j: usize) {
    boxes.drain(i..=j);
}

/// Put an independent copy of box `i` right after it.
pub fn dup_box(boxes: &mut Vec<FrBox>, i: usize) {
    let copy = boxes[i].clone();
    boxes.insert(i + 1, copy);
}

/// Split text box `i` after its first `n` runes.
pub fn split_box(boxes: &mut Vec<FrBox>, i: usize, n: usize, font: &dyn Font) {
    dup_box(boxes, i);
    truncate_box(&mut boxes[i], n, font);
    chop_box(&mut boxes[i + 1], n, font);
}

/// Append text box `i + 1` onto text box `i`.
pub fn merge_box(boxes: &mut Vec<FrBox>, i: usize) {
    let next = boxes.remove(i + 1);
    let b = &mut boxes[i];
    b.bytes.extend_from_slice(&next.bytes);
    b.nrune += next.nrune;
    b.wid += next.wid;
}

/// Starting at box `from`, whose first rune is `start`, find the box that
/// begins at rune `target`, splitting a box if `target` falls inside it.
/// Returns `boxes.len()` when `target` is at or past the end.
pub fn find_box(
    boxes: &mut Vec<FrBox>,
    from: usize,
    start: usize,
    target: usize,
    font: &dyn Font,
) -> usize {
    let mut bn = from;
    let mut p = start;
    while bn < boxes.len() && p + boxes[bn].len() <= target {
        p += boxes[bn].len();
        bn += 1;
    }
    if bn < boxes.len() && p != target {
        split_box(boxes, bn, target - p, font);
        bn += 1;
    }
    bn
}

/// Runes held by `boxes`.
pub fn rune_len(boxes: &[FrBox]) -> usize {
    boxes.iter().map(FrBox::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FixedFont;

    const F: FixedFont = FixedFont::new(10, 13);

    fn text(s: &str) -> FrBox {
        FrBox::text(s, &F, Style::default())
    }

    fn strs(boxes: &[FrBox]) -> Vec<String> {
        boxes.iter().map(|b| b.text_str().into_owned()).collect()
    }

    #[test]
    fn rune_index_walks_utf8() {
        let s = "a本ポx".as_bytes();
        assert_eq!(rune_index(s, 0), 0);
        assert_eq!(rune_index(s, 1), 1);
        assert_eq!(rune_index(s, 2), 4);
        assert_eq!(rune_index(s, 3), 7);
        assert_eq!(rune_index(s, 4), 8);
        assert_eq!(rune_index(s, 9), 8);
    }

    #[test]
    fn truncate_and_chop_recompute_width() {
        let mut b = text("a本ポx");
        truncate_box(&mut b, 2, &F);
        assert_eq!((b.text_str().as_ref(), b.nrune, b.wid), ("a本", 2, 20));
        let mut b = text("a本ポx");
        chop_box(&mut b, 3, &F);
        assert_eq!((b.text_str().as_ref(), b.nrune, b.wid), ("x", 1, 10));
    }

    #[test]
    fn split_then_merge_restores() {
        let mut v = vec![text("hello")];
        split_box(&mut v, 0, 2, &F);
        assert_eq!(strs(&v), ["he", "llo"]);
        // the halves are distinct copies
        v[0].bytes[0] = b'j';
        assert_eq!(strs(&v), ["je", "llo"]);
        merge_box(&mut v, 0);
        assert_eq!(strs(&v), ["jello"]);
        assert_eq!(v[0].wid, 50);
    }

    #[test]
    fn add_and_close() {
        let mut v = vec![text("a"), text("b")];
        add_box(&mut v, 1, 2);
        assert_eq!(v.len(), 4);
        v[1] = text("x");
        v[2] = text("y");
        assert_eq!(strs(&v), ["a", "x", "y", "b"]);
        close_box(&mut v, 1, 2);
        assert_eq!(strs(&v), ["a", "b"]);
        dup_box(&mut v, 1);
        assert_eq!(strs(&v), ["a", "b", "b"]);
    }

    #[test]
    fn find_box_splits_mid_box() {
        let nl = FrBox::newline(Style::default());
        let mut v = vec![text("abc"), nl, text("defg")];
        assert_eq!(find_box(&mut v, 0, 0, 0, &F), 0);
        assert_eq!(find_box(&mut v, 0, 0, 3, &F), 1);
        assert_eq!(find_box(&mut v, 0, 0, 6, &F), 3);
        assert_eq!(strs(&v), ["abc", "\n", "de", "fg"]);
        assert_eq!(find_box(&mut v, 1, 3, 8, &F), 4);
        assert_eq!(find_box(&mut v, 0, 0, 99, &F), 4);
        assert_eq!(rune_len(&v), 8);
    }
}
