//! Rune addressing over UTF-8 text.
//!
//! [`RuneIndex`] translates rune positions to byte offsets without
//! materialising a per-rune table. A single cursor is carried between
//! queries and moved by the cheapest available scan, so walking forwards or
//! backwards one rune at a time is O(1) per step. Text that is pure ASCII up
//! to the queried position never touches the cursor at all.

use std::cell::Cell;

#[derive(Debug, Clone, Copy, Default)]
struct Cursor {
    /// Byte offset of the rune at `rune`.
    byte: usize,
    rune: usize,
    /// UTF-8 width of that rune.
    width: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RuneIndex {
    text: String,
    nrunes: usize,
    /// Byte offset of the first non-ASCII byte (`text.len()` when none).
    non_ascii: usize,
    cursor: Cell<Cursor>,
}

impl RuneIndex {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let non_ascii = text
            .bytes()
            .position(|b| !b.is_ascii())
            .unwrap_or(text.len());
        let nrunes = if non_ascii == text.len() {
            text.len()
        } else {
            non_ascii + text[non_ascii..].chars().count()
        };
        Self {
            text,
            nrunes,
            non_ascii,
            cursor: Cell::new(Cursor::default()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn rune_count(&self) -> usize {
        self.nrunes
    }

    pub fn is_ascii(&self) -> bool {
        self.non_ascii == self.text.len()
    }

    /// Rune at position `i`.
    pub fn get(&self, i: usize) -> Option<char> {
        if i >= self.nrunes {
            return None;
        }
        if i < self.non_ascii {
            return Some(self.text.as_bytes()[i] as char);
        }
        let c = self.seek(i);
        self.text[c.byte..].chars().next()
    }

    /// Byte offset of rune `i`; `rune_count()` maps to the byte length.
    ///
    /// # Panics
    /// If `i > rune_count()`.
    pub fn byte_offset(&self, i: usize) -> usize {
        assert!(
            i <= self.nrunes,
            "rune index {i} out of range ({})",
            self.nrunes
        );
        if i < self.non_ascii {
            return i;
        }
        if i == self.nrunes {
            return self.text.len();
        }
        self.seek(i).byte
    }

    /// Rune position of the rune starting at or containing byte `b`.
    pub fn rune_offset(&self, b: usize) -> usize {
        let b = b.min(self.text.len());
        if b <= self.non_ascii {
            return b;
        }
        let mut b = b;
        while !self.text.is_char_boundary(b) {
            b -= 1;
        }
        self.non_ascii + self.text[self.non_ascii..b].chars().count()
    }

    /// Text of runes `[i, j)`.
    pub fn slice(&self, i: usize, j: usize) -> &str {
        assert!(i <= j, "inverted rune range {i}..{j}");
        let start = self.byte_offset(i);
        let end = self.byte_offset(j);
        &self.text[start..end]
    }

    /// Insert `s` before rune `i`. The cursor survives, shifted when it sits
    /// at or after `i`.
    ///
    /// # Panics
    /// If `i > rune_count()`.
    pub fn insert(&mut self, i: usize, s: &str) {
        let b = self.byte_offset(i);
        let n = s.chars().count();
        self.text.insert_str(b, s);
        self.nrunes += n;
        if b <= self.non_ascii {
            self.non_ascii = match s.bytes().position(|c| !c.is_ascii()) {
                Some(k) => b + k,
                None => self.non_ascii + s.len(),
            };
        }
        let mut c = self.cursor.get();
        if c.width > 0 && c.rune >= i {
            c.rune += n;
            c.byte += s.len();
            self.cursor.set(c);
        }
    }

    /// Remove runes `[i, j)`. The cursor survives unless it was inside the
    /// removed range.
    ///
    /// # Panics
    /// If `i > j` or `j > rune_count()`.
    pub fn delete(&mut self, i: usize, j: usize) {
        assert!(i <= j, "inverted rune range {i}..{j}");
        let (b0, b1) = (self.byte_offset(i), self.byte_offset(j));
        self.text.replace_range(b0..b1, "");
        self.nrunes -= j - i;
        if self.non_ascii >= b1 {
            self.non_ascii -= b1 - b0;
        } else if self.non_ascii >= b0 {
            self.non_ascii = self.text.as_bytes()[b0..]
                .iter()
                .position(|c| !c.is_ascii())
                .map_or(self.text.len(), |k| b0 + k);
        }
        let c = self.cursor.get();
        if c.width > 0 && c.rune >= j {
            self.cursor.set(Cursor {
                byte: c.byte - (b1 - b0),
                rune: c.rune - (j - i),
                width: c.width,
            });
        } else if c.width > 0 && c.rune >= i {
            self.cursor.set(Cursor::default());
        }
    }

    /// Move the cursor to rune `i` (`non_ascii <= i < nrunes`).
    fn seek(&self, i: usize) -> Cursor {
        let mut c = self.cursor.get();
        if c.rune == i && c.width > 0 {
            return c;
        }
        let bytes = self.text.as_bytes();
        if c.width > 0 && i == c.rune + 1 {
            // One step forward.
            let byte = c.byte + c.width;
            c = self.at_byte(byte, i);
        } else if c.width > 0 && i + 1 == c.rune {
            // One step back.
            let byte = self.prev_boundary(c.byte);
            c = self.at_byte(byte, i);
        } else {
            // Pick the nearest of start-of-non-ASCII, cursor and end.
            let valid = c.width > 0;
            let (mut byte, mut rune) = (self.non_ascii, self.non_ascii);
            if valid && i > c.rune && i - c.rune < i - rune {
                byte = c.byte;
                rune = c.rune;
            }
            let from_end = self.nrunes - i;
            let forward = i - rune;
            if valid && i < c.rune && c.rune - i < forward.min(from_end) {
                // Backward from the cursor.
                let (mut b, mut r) = (c.byte, c.rune);
                while r > i {
                    b = self.prev_boundary(b);
                    r -= 1;
                }
                c = self.at_byte(b, r);
            } else if from_end < forward {
                // Backward from the end.
                let (mut b, mut r) = (bytes.len(), self.nrunes);
                while r > i {
                    b = self.prev_boundary(b);
                    r -= 1;
                }
                c = self.at_byte(b, r);
            } else {
                while rune < i {
                    byte += utf8_width(bytes[byte]);
                    rune += 1;
                }
                c = self.at_byte(byte, rune);
            }
        }
        self.cursor.set(c);
        c
    }

    fn at_byte(&self, byte: usize, rune: usize) -> Cursor {
        Cursor {
            byte,
            rune,
            width: utf8_width(self.text.as_bytes()[byte]),
        }
    }

    fn prev_boundary(&self, mut b: usize) -> usize {
        b -= 1;
        while !self.text.is_char_boundary(b) {
            b -= 1;
        }
        b
    }
}

fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        _ => 4,
    }
}
