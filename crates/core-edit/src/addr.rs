//! Address evaluation.
//!
//! Line arithmetic follows sam: `n` is the n-th line including its newline,
//! `0` the empty range at the start, `+n`/`-n` count lines from the end or
//! start of the left operand, and a search wraps around the text.

use crate::error::SamError;
use crate::exec::{Exec, Range, next_boundary};
use crate::parse::Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Abs,
    Plus,
    Minus,
}

impl Exec<'_> {
    /// Resolve `a` with the given dot.
    pub(crate) fn address(&mut self, a: &Addr, dot: Range) -> Result<Range, SamError> {
        self.resolve(a, dot, dot, Sign::Abs)
    }

    fn resolve(&mut self, a: &Addr, dot: Range, base: Range, sign: Sign) -> Result<Range, SamError> {
        let nr = self.text.nr();
        match a {
            Addr::Char(n) => {
                let q = match sign {
                    Sign::Abs => Some(*n),
                    Sign::Plus => base.1.checked_add(*n),
                    Sign::Minus => base.0.checked_sub(*n),
                };
                match q {
                    Some(q) if q <= nr => Ok((q, q)),
                    _ => Err(SamError::AddressRange),
                }
            }
            Addr::Line(n) => self.line(*n, base, sign),
            Addr::Forward(re) => match sign {
                Sign::Minus => self.search_backward(re, base.0),
                _ => self.search_forward(re, base.1),
            },
            Addr::Backward(re) => match sign {
                Sign::Minus => self.search_forward(re, base.1),
                _ => self.search_backward(re, base.0),
            },
            Addr::Dot => Ok(dot),
            Addr::End => Ok((nr, nr)),
            Addr::Plus(l, r) | Addr::Minus(l, r) => {
                let sign = if matches!(a, Addr::Plus(..)) {
                    Sign::Plus
                } else {
                    Sign::Minus
                };
                let left = match l {
                    Some(l) => self.resolve(l, dot, dot, Sign::Abs)?,
                    None => dot,
                };
                match r {
                    Some(r) => self.resolve(r, dot, left, sign),
                    None => self.line(1, left, sign),
                }
            }
            Addr::Comma(l, r) | Addr::Semi(l, r) => {
                let left = match l {
                    Some(l) => self.resolve(l, dot, dot, Sign::Abs)?,
                    None => (0, 0),
                };
                let rdot = if matches!(a, Addr::Semi(..)) { left } else { dot };
                let right = match r {
                    Some(r) => self.resolve(r, rdot, rdot, Sign::Abs)?,
                    None => (nr, nr),
                };
                if right.1 < left.0 {
                    return Err(SamError::AddressOrder);
                }
                Ok((left.0, right.1))
            }
        }
    }

    fn line(&self, l: usize, base: Range, sign: Sign) -> Result<Range, SamError> {
        let text = self.text;
        let nr = text.nr();
        let is_nl = |p: usize| text.char_at(p) == Some('\n');
        if sign != Sign::Minus {
            let q0;
            let mut p;
            if l == 0 {
                if sign == Sign::Abs || base.1 == 0 {
                    return Ok((0, 0));
                }
                q0 = base.1;
                p = base.1 - 1;
            } else {
                let mut n;
                if sign == Sign::Abs || base.1 == 0 {
                    p = 0;
                    n = 1;
                } else {
                    p = base.1 - 1;
                    n = usize::from(is_nl(p));
                    p += 1;
                }
                while n < l {
                    if p >= nr {
                        return Err(SamError::AddressRange);
                    }
                    if is_nl(p) {
                        n += 1;
                    }
                    p += 1;
                }
                q0 = p;
            }
            while p < nr {
                let nl = is_nl(p);
                p += 1;
                if nl {
                    break;
                }
            }
            Ok((q0, p))
        } else {
            let mut p = base.0;
            let q1;
            if l == 0 {
                q1 = base.0;
            } else {
                let mut n = 0;
                while n < l && p > 0 {
                    p -= 1;
                    if is_nl(p) {
                        n += 1;
                        if n == l {
                            p += 1;
                        }
                    }
                }
                q1 = p;
                p = p.saturating_sub(1);
            }
            while p > 0 && !is_nl(p - 1) {
                p -= 1;
            }
            Ok((p, q1))
        }
    }

    /// First match at or after rune `from`, wrapping to the start. An empty
    /// match right at `from` is skipped.
    fn search_forward(&mut self, pat: &str, from: usize) -> Result<Range, SamError> {
        let re = self.regex(pat)?;
        let text = self.text;
        let s = text.string();
        let b = text.byte_of_rune(from);
        let mut found = re.find_at(s, b);
        if let Some(m) = found {
            if m.start() == m.end() && m.start() == b {
                found = next_boundary(s, b).and_then(|nb| re.find_at(s, nb));
            }
        }
        let m = found
            .or_else(|| re.find(s))
            .ok_or_else(|| SamError::NoMatch(pat.to_string()))?;
        Ok((text.rune_of_byte(m.start()), text.rune_of_byte(m.end())))
    }

    /// Last match ending at or before rune `from`, wrapping to the end.
    fn search_backward(&mut self, pat: &str, from: usize) -> Result<Range, SamError> {
        let re = self.regex(pat)?;
        let text = self.text;
        let s = text.string();
        let b = text.byte_of_rune(from);
        let mut before = None;
        let mut last = None;
        for m in re.find_iter(s) {
            let empty_at_start = m.start() == m.end() && m.start() == b;
            if m.end() <= b && !empty_at_start {
                before = Some(m);
            }
            last = Some(m);
        }
        let m = before
            .or(last)
            .ok_or_else(|| SamError::NoMatch(pat.to_string()))?;
        Ok((text.rune_of_byte(m.start()), text.rune_of_byte(m.end())))
    }
}

#[cfg(test)]
mod tests {
    use crate::{Parser, Sam};
    use core_state::Text;

    /// Selection after evaluating a bare address.
    fn eval(src: &str, dot: (usize, usize), script: &str) -> (usize, usize) {
        let mut t = Text::new(src);
        t.set_selection(dot.0, dot.1);
        Sam::new().run(&mut t, script).unwrap().dot
    }

    const LINES: &str = "one\ntwo\nthree\n";

    #[test]
    fn absolute_lines() {
        assert_eq!(eval(LINES, (0, 0), "0"), (0, 0));
        assert_eq!(eval(LINES, (0, 0), "1"), (0, 4));
        assert_eq!(eval(LINES, (0, 0), "3"), (8, 14));
        assert_eq!(eval(LINES, (0, 0), "2,3"), (4, 14));
        assert_eq!(eval(LINES, (0, 0), ","), (0, 14));
        assert_eq!(eval(LINES, (0, 0), "$"), (14, 14));
    }

    #[test]
    fn relative_lines() {
        // dot on line 2
        assert_eq!(eval(LINES, (4, 8), "+"), (8, 14));
        assert_eq!(eval(LINES, (4, 8), "-"), (0, 4));
        assert_eq!(eval(LINES, (4, 8), "-0"), (4, 4));
        // dot ends at a line end: the rest of that line is empty
        assert_eq!(eval(LINES, (4, 8), ".+0"), (8, 8));
        assert_eq!(eval(LINES, (5, 6), ".+0"), (6, 8));
        // the line holding dot
        assert_eq!(eval(LINES, (5, 5), "-+"), (4, 8));
    }

    #[test]
    fn char_addresses() {
        assert_eq!(eval(LINES, (0, 0), "#3"), (3, 3));
        assert_eq!(eval(LINES, (4, 8), "#3;+#2"), (3, 5));
        assert_eq!(eval(LINES, (4, 8), ".-#1"), (3, 3));
    }

    #[test]
    fn searches_wrap() {
        assert_eq!(eval(LINES, (0, 0), "/t/"), (4, 5));
        assert_eq!(eval(LINES, (5, 5), "/t/"), (8, 9));
        assert_eq!(eval(LINES, (9, 9), "/t/"), (4, 5));
        assert_eq!(eval(LINES, (9, 9), "?o?"), (6, 7));
        assert_eq!(eval(LINES, (1, 1), "?e?"), (12, 13));
        assert_eq!(eval(LINES, (0, 0), "/two/,/three/"), (4, 13));
        assert_eq!(eval(LINES, (0, 0), "/two/;/e/"), (4, 12));
    }

    #[test]
    fn bad_addresses() {
        let mut t = Text::new(LINES);
        let sam = Sam::new();
        assert!(matches!(
            sam.run(&mut t, "5"),
            Err(crate::SamError::AddressRange)
        ));
        assert!(matches!(
            sam.run(&mut t, "#99"),
            Err(crate::SamError::AddressRange)
        ));
        assert!(matches!(
            sam.run(&mut t, "3,1"),
            Err(crate::SamError::AddressOrder)
        ));
        assert!(matches!(
            sam.run(&mut t, "/nope/"),
            Err(crate::SamError::NoMatch(_))
        ));
        assert!(matches!(sam.run(&mut t, "/(/"), Err(crate::SamError::Regex(_))));
        assert!(Parser::parse("2,").is_ok());
    }
}
