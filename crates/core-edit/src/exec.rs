//! sam script execution.
//!
//! Every command is evaluated against the text as it was when the script
//! started. Changes go into an [`Elog`], which is applied once at the end;
//! a failing script leaves the text untouched.

use std::collections::HashMap;

use core_state::{Elog, ElogWarning, Text};
use regex::{Captures, Regex, RegexBuilder};
use tracing::{debug, trace};

use crate::error::SamError;
use crate::parse::{Cmd, Command, LoopKind, Parser};

/// Rune range `[q0, q1)`.
pub type Range = (usize, usize);

pub const DEFAULT_MAX_LOOP: usize = 10_000;

/// Outcome of a successful [`Sam::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecReport {
    /// Out-of-sequence warnings raised while recording, in order.
    pub warnings: Vec<ElogWarning>,
    /// Selection after the edits were applied.
    pub dot: Range,
    /// Text written by `p`.
    pub output: String,
}

/// Script runner.
#[derive(Debug, Clone)]
pub struct Sam {
    max_loop: usize,
}

impl Default for Sam {
    fn default() -> Self {
        Self::new()
    }
}

impl Sam {
    pub fn new() -> Self {
        Self {
            max_loop: DEFAULT_MAX_LOOP,
        }
    }

    /// Cap on matches visited by one `x`/`y` loop or substitution.
    pub fn with_max_loop(max_loop: usize) -> Self {
        Self {
            max_loop: max_loop.max(1),
        }
    }

    /// Parse and run `script` against `text`, starting from its selection.
    pub fn run(&self, text: &mut Text, script: &str) -> Result<ExecReport, SamError> {
        let cmds = Parser::parse(script)?;
        let mut elog = Elog::new();
        let mut report = ExecReport::default();
        let mut dot = text.selection();
        {
            let mut ex = Exec {
                text: &*text,
                elog: &mut elog,
                report: &mut report,
                regexes: HashMap::new(),
                max_loop: self.max_loop,
            };
            for c in &cmds {
                dot = ex.command(c, dot)?;
            }
        }
        debug!(target: "edit.sam", commands = cmds.len(), entries = elog.len() - 1, "apply");
        text.set_selection(dot.0, dot.1);
        elog.apply(text)?;
        report.dot = text.selection();
        Ok(report)
    }
}

pub(crate) struct Exec<'a> {
    pub(crate) text: &'a Text,
    elog: &'a mut Elog,
    report: &'a mut ExecReport,
    regexes: HashMap<String, Regex>,
    pub(crate) max_loop: usize,
}

impl<'a> Exec<'a> {
    fn command(&mut self, c: &Command, dot: Range) -> Result<Range, SamError> {
        let r = match &c.addr {
            Some(a) => self.address(a, dot)?,
            None => dot,
        };
        trace!(target: "edit.sam", cmd = c.cmd.name(), q0 = r.0, q1 = r.1, "exec");
        match &c.cmd {
            Cmd::Select => Ok(r),
            Cmd::Append(s) => {
                self.insert(r.1, s);
                Ok((r.1, r.1))
            }
            Cmd::Insert(s) => {
                self.insert(r.0, s);
                Ok((r.0, r.0))
            }
            Cmd::Change(s) => {
                self.replace(r.0, r.1, s);
                Ok(r)
            }
            Cmd::Delete => {
                self.delete(r.0, r.1);
                Ok(r)
            }
            Cmd::Print => {
                self.report.output.push_str(self.text.read(r.0, r.1));
                Ok(r)
            }
            Cmd::Substitute {
                nth,
                re,
                repl,
                global,
            } => self.substitute(r, *nth, re, repl, *global),
            Cmd::Loop { kind, re, cmd } => self.looper(r, *kind, re, cmd),
            Cmd::Move(a) => {
                let dest = self.address(a, r)?.1;
                if dest > r.0 && dest < r.1 {
                    return Err(SamError::MoveOverlap);
                }
                let s = self.text.read(r.0, r.1).to_string();
                if dest <= r.0 {
                    self.insert(dest, &s);
                    self.delete(r.0, r.1);
                } else {
                    self.delete(r.0, r.1);
                    self.insert(dest, &s);
                }
                Ok((dest, dest))
            }
            Cmd::Copy(a) => {
                let dest = self.address(a, r)?.1;
                let s = self.text.read(r.0, r.1).to_string();
                self.insert(dest, &s);
                Ok((dest, dest))
            }
            Cmd::Block(cmds) => {
                let mut last = r;
                for c in cmds {
                    last = self.command(c, r)?;
                }
                Ok(last)
            }
            Cmd::Filename(name) => {
                self.elog.filename(name);
                Ok(r)
            }
        }
    }

    fn looper(
        &mut self,
        r: Range,
        kind: LoopKind,
        re: &str,
        cmd: &Command,
    ) -> Result<Range, SamError> {
        let found = self.matches_in(re, r)?;
        match kind {
            LoopKind::X => {
                for m in found {
                    self.command(cmd, m)?;
                }
            }
            LoopKind::Y => {
                let mut start = r.0;
                for m in found {
                    self.command(cmd, (start, m.0))?;
                    start = m.1;
                }
                self.command(cmd, (start, r.1))?;
            }
            LoopKind::G if !found.is_empty() => {
                self.command(cmd, r)?;
            }
            LoopKind::V if found.is_empty() => {
                self.command(cmd, r)?;
            }
            LoopKind::G | LoopKind::V => {}
        }
        Ok(r)
    }

    fn substitute(
        &mut self,
        r: Range,
        nth: usize,
        pat: &str,
        repl: &str,
        global: bool,
    ) -> Result<Range, SamError> {
        let re = self.regex(pat)?;
        let text = self.text;
        let s = text.string();
        let mut made = 0;
        for (i, m) in self.byte_matches(&re, r)?.into_iter().enumerate() {
            let n = i + 1;
            if n < nth || (n > nth && !global) {
                continue;
            }
            let Some(caps) = re.captures_at(s, m.0) else {
                continue;
            };
            let new = expand(repl, &caps);
            self.replace(text.rune_of_byte(m.0), text.rune_of_byte(m.1), &new);
            made += 1;
        }
        if made == 0 {
            return Err(SamError::NoSubstitution);
        }
        Ok(r)
    }

    /// Rune ranges of successive matches of `pat` inside `r`.
    pub(crate) fn matches_in(&mut self, pat: &str, r: Range) -> Result<Vec<Range>, SamError> {
        let re = self.regex(pat)?;
        let text = self.text;
        Ok(self
            .byte_matches(&re, r)?
            .into_iter()
            .map(|(a, b)| (text.rune_of_byte(a), text.rune_of_byte(b)))
            .collect())
    }

    /// Byte ranges of successive matches inside `r`. An empty match directly
    /// after the previous match is skipped.
    fn byte_matches(&self, re: &Regex, r: Range) -> Result<Vec<Range>, SamError> {
        let text = self.text;
        let s = text.string();
        let (b0, b1) = (text.byte_of_rune(r.0), text.byte_of_rune(r.1));
        let mut out = Vec::new();
        let mut p = b0;
        let mut prev_end = None;
        while p <= b1 {
            let Some(m) = re.find_at(s, p) else {
                break;
            };
            if m.end() > b1 {
                break;
            }
            if m.start() == m.end() {
                if prev_end != Some(m.start()) {
                    out.push((m.start(), m.end()));
                }
                match next_boundary(s, m.end()) {
                    Some(nb) => p = nb,
                    None => break,
                }
            } else {
                out.push((m.start(), m.end()));
                p = m.end();
            }
            prev_end = Some(m.end());
            if out.len() > self.max_loop {
                return Err(SamError::LoopLimit(self.max_loop));
            }
        }
        Ok(out)
    }

    pub(crate) fn regex(&mut self, pat: &str) -> Result<Regex, SamError> {
        if let Some(re) = self.regexes.get(pat) {
            return Ok(re.clone());
        }
        let re = RegexBuilder::new(pat).multi_line(true).build()?;
        self.regexes.insert(pat.to_string(), re.clone());
        Ok(re)
    }

    fn insert(&mut self, q0: usize, s: &str) {
        let r: Vec<char> = s.chars().collect();
        let w = self.elog.insert(q0, &r);
        self.note(w);
    }

    fn delete(&mut self, q0: usize, q1: usize) {
        let w = self.elog.delete(q0, q1);
        self.note(w);
    }

    fn replace(&mut self, q0: usize, q1: usize, s: &str) {
        let r: Vec<char> = s.chars().collect();
        let w = self.elog.replace(q0, q1, &r);
        self.note(w);
    }

    fn note(&mut self, w: Option<ElogWarning>) {
        if let Some(w) = w {
            self.report.warnings.push(w);
        }
    }
}

pub(crate) fn next_boundary(s: &str, b: usize) -> Option<usize> {
    s[b..].chars().next().map(|c| b + c.len_utf8())
}

/// Expand `&`, `\1`..`\9`, `\n` and `\t` in a replacement.
fn expand(repl: &str, caps: &Captures<'_>) -> String {
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let mut out = String::new();
    let mut it = repl.chars();
    while let Some(c) = it.next() {
        match c {
            '&' => out.push_str(group(0)),
            '\\' => match it.next() {
                Some(d @ '1'..='9') => out.push_str(group(d as usize - '0' as usize)),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str, script: &str) -> (String, ExecReport) {
        let mut t = Text::new(src);
        let report = Sam::new().run(&mut t, script).unwrap();
        (t.string().to_string(), report)
    }

    #[test]
    fn append_insert_change_delete() {
        assert_eq!(run("hello", "$a/ world/").0, "hello world");
        assert_eq!(run("world", "0i/hello /").0, "hello world");
        assert_eq!(run("a b c", "/b/c/B/").0, "a B c");
        assert_eq!(run("a b c", "/ b/d").0, "a c");
    }

    #[test]
    fn change_selects_new_text() {
        let (out, report) = run("one two", "/two/c/three/");
        assert_eq!(out, "one three");
        assert_eq!(report.dot, (4, 9));
    }

    #[test]
    fn substitute_nth_and_global() {
        assert_eq!(run("aaa", ",s/a/b/").0, "baa");
        assert_eq!(run("aaa", ",s2/a/b/").0, "aba");
        assert_eq!(run("aaa", ",s2/a/b/g").0, "abb");
        assert_eq!(run("aaa", ",s/a/[&]/g").0, "[a][a][a]");
        assert_eq!(
            run("key=value", r",s/(\w+)=(\w+)/\2=\1/").0,
            "value=key"
        );
    }

    #[test]
    fn substitute_without_match_fails_and_leaves_text() {
        let mut t = Text::new("abc");
        let err = Sam::new().run(&mut t, ",s/z/y/").unwrap_err();
        assert!(matches!(err, SamError::NoSubstitution));
        assert_eq!(t.string(), "abc");
    }

    #[test]
    fn x_and_y_loops() {
        assert_eq!(run("a1b22c", ",x/[0-9]+/c/#/").0, "a#b#c");
        assert_eq!(run("a1b22c", ",y/[0-9]+/c/_/").0, "_1_22_");
        assert_eq!(run("foo bar", ",x/o/d").0, "f bar");
    }

    #[test]
    fn g_and_v_guards() {
        assert_eq!(run("one\ntwo\nthree\n", ",x/.*\\n/g/o/d").0, "three\n");
        assert_eq!(run("one\ntwo\nthree\n", ",x/.*\\n/v/o/d").0, "one\ntwo\n");
    }

    #[test]
    fn print_collects_output() {
        let (_, report) = run("alpha\nbeta\n", "2p");
        assert_eq!(report.output, "beta\n");
    }

    #[test]
    fn move_and_copy() {
        assert_eq!(run("1\n2\n3\n", "1m$").0, "2\n3\n1\n");
        assert_eq!(run("1\n2\n3\n", "3m0").0, "3\n1\n2\n");
        assert_eq!(run("1\n2\n3\n", "2t0").0, "2\n1\n2\n3\n");
        let mut t = Text::new("abcdef");
        assert!(matches!(
            Sam::new().run(&mut t, "#1,#4m#2"),
            Err(SamError::MoveOverlap)
        ));
    }

    #[test]
    fn block_commands_share_dot() {
        let (out, report) = run("x", ",{\ni/</\na/>/\n}");
        assert_eq!(out, "<x>");
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn backwards_block_warns_and_still_applies() {
        let (out, report) = run("x", ",{\na/>/\ni/</\n}");
        // replayed last-first, the append lands after the new "<"
        assert_eq!(out, "<>x");
        assert_eq!(report.warnings, vec![ElogWarning::OutOfSequence]);
    }

    #[test]
    fn filename_command_renames() {
        let mut t = Text::new("body").with_name("a.txt");
        Sam::new().run(&mut t, "f b.txt").unwrap();
        assert_eq!(t.name(), "b.txt");
    }

    #[test]
    fn loop_limit_is_enforced() {
        let mut t = Text::new("aaaaaaaaaa");
        let err = Sam::with_max_loop(3).run(&mut t, ",x/a/d").unwrap_err();
        assert!(matches!(err, SamError::LoopLimit(3)));
        assert_eq!(t.string(), "aaaaaaaaaa");
    }

    #[test]
    fn expand_handles_escapes() {
        let re = Regex::new("(b)(c)").unwrap();
        let caps = re.captures("abcd").unwrap();
        assert_eq!(expand(r"\2\1&\&\n", &caps), "cbbc&\n");
    }
}
