//! sam command language parser.
//!
//! Converts a script into a list of [`Command`]s. Parsing is pure: nothing
//! here touches a text, and regular expressions are kept as source strings
//! so the executor can compile (and cache) them.
//!
//! Accepted forms:
//! * addresses `#n`, `n`, `/re/`, `?re?`, `.`, `$`, joined with `+ - , ;`
//! * `a i c` with `/text/` or a multi-line body ended by a lone `.`
//! * `d p f`, `s[n]/re/repl/[g]`, `x y g v /re/ cmd`, `m t addr`, `{ ... }`
//!
//! Commands are separated by newlines.

use crate::error::SamError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Addr {
    /// `#n`: rune offset.
    Char(usize),
    /// `n`: line number, 0 being the empty start of the text.
    Line(usize),
    /// `/re/`
    Forward(String),
    /// `?re?`
    Backward(String),
    Dot,
    End,
    Plus(Option<Box<Addr>>, Option<Box<Addr>>),
    Minus(Option<Box<Addr>>, Option<Box<Addr>>),
    Comma(Option<Box<Addr>>, Option<Box<Addr>>),
    Semi(Option<Box<Addr>>, Option<Box<Addr>>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// Run on every match.
    X,
    /// Run on the text between matches.
    Y,
    /// Run once if dot contains a match.
    G,
    /// Run once if dot contains no match.
    V,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Bare address: only sets dot.
    Select,
    Append(String),
    Insert(String),
    Change(String),
    Delete,
    Print,
    Substitute {
        nth: usize,
        re: String,
        repl: String,
        global: bool,
    },
    Loop {
        kind: LoopKind,
        re: String,
        cmd: Box<Command>,
    },
    Move(Addr),
    Copy(Addr),
    Block(Vec<Command>),
    Filename(String),
}

impl Cmd {
    pub fn name(&self) -> &'static str {
        match self {
            Cmd::Select => "select",
            Cmd::Append(_) => "a",
            Cmd::Insert(_) => "i",
            Cmd::Change(_) => "c",
            Cmd::Delete => "d",
            Cmd::Print => "p",
            Cmd::Substitute { .. } => "s",
            Cmd::Loop { kind, .. } => match kind {
                LoopKind::X => "x",
                LoopKind::Y => "y",
                LoopKind::G => "g",
                LoopKind::V => "v",
            },
            Cmd::Move(_) => "m",
            Cmd::Copy(_) => "t",
            Cmd::Block(_) => "{",
            Cmd::Filename(_) => "f",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub addr: Option<Addr>,
    pub cmd: Cmd,
}

pub struct Parser {
    src: Vec<char>,
    pos: usize,
    /// Pattern reused by an empty `//`.
    last_re: Option<String>,
}

impl Parser {
    pub fn new(script: &str) -> Self {
        Self {
            src: script.chars().collect(),
            pos: 0,
            last_re: None,
        }
    }

    /// Parse a whole script.
    pub fn parse(script: &str) -> Result<Vec<Command>, SamError> {
        Self::new(script).commands_until(None)
    }

    fn commands_until(&mut self, close: Option<char>) -> Result<Vec<Command>, SamError> {
        let mut out = Vec::new();
        loop {
            self.skip_space();
            match self.peek() {
                None if close.is_some() => return Err(self.syntax("unterminated block")),
                None => return Ok(out),
                Some('}') if close == Some('}') => {
                    self.pos += 1;
                    return Ok(out);
                }
                Some('}') => return Err(self.syntax("unexpected `}`")),
                Some(_) => out.push(self.command()?),
            }
        }
    }

    fn command(&mut self) -> Result<Command, SamError> {
        let addr = self.compound()?;
        self.skip_blanks();
        let cmd = match self.peek() {
            None | Some('\n') | Some('}') => Cmd::Select,
            Some(c) => {
                self.pos += 1;
                match c {
                    'a' => Cmd::Append(self.text_arg()?),
                    'i' => Cmd::Insert(self.text_arg()?),
                    'c' => Cmd::Change(self.text_arg()?),
                    'd' => Cmd::Delete,
                    'p' => Cmd::Print,
                    's' => {
                        let nth = self.number().unwrap_or(1).max(1);
                        let delim = self.delim()?;
                        let re = self.regex_body(delim)?;
                        let repl = self.repl_body(delim);
                        let global = self.eat('g');
                        Cmd::Substitute {
                            nth,
                            re,
                            repl,
                            global,
                        }
                    }
                    'x' | 'y' | 'g' | 'v' => {
                        let kind = match c {
                            'x' => LoopKind::X,
                            'y' => LoopKind::Y,
                            'g' => LoopKind::G,
                            _ => LoopKind::V,
                        };
                        let delim = self.delim()?;
                        let re = self.regex_body(delim)?;
                        self.skip_blanks();
                        let sub = match self.peek() {
                            None | Some('\n') => Command {
                                addr: None,
                                cmd: Cmd::Print,
                            },
                            Some(_) => self.command()?,
                        };
                        Cmd::Loop {
                            kind,
                            re,
                            cmd: Box::new(sub),
                        }
                    }
                    'm' | 't' => {
                        self.skip_blanks();
                        let dest = self
                            .compound()?
                            .ok_or_else(|| self.syntax("missing destination address"))?;
                        if c == 'm' {
                            Cmd::Move(dest)
                        } else {
                            Cmd::Copy(dest)
                        }
                    }
                    '{' => Cmd::Block(self.commands_until(Some('}'))?),
                    'f' => {
                        self.skip_blanks();
                        let name: String = self.take_line().trim().to_string();
                        Cmd::Filename(name)
                    }
                    other => return Err(SamError::UnknownCommand(other)),
                }
            }
        };
        Ok(Command { addr, cmd })
    }

    fn compound(&mut self) -> Result<Option<Addr>, SamError> {
        let left = self.chain()?.map(Box::new);
        match self.peek() {
            Some(c @ (',' | ';')) => {
                self.pos += 1;
                let right = self.compound()?.map(Box::new);
                Ok(Some(if c == ',' {
                    Addr::Comma(left, right)
                } else {
                    Addr::Semi(left, right)
                }))
            }
            _ => Ok(left.map(|b| *b)),
        }
    }

    /// Simple addresses joined by `+`/`-`; a regexp directly after an
    /// address means `+`.
    fn chain(&mut self) -> Result<Option<Addr>, SamError> {
        let mut left = self.simple()?;
        loop {
            match self.peek() {
                Some(c @ ('+' | '-')) => {
                    self.pos += 1;
                    let l = left.take().map(Box::new);
                    let r = self.simple()?.map(Box::new);
                    left = Some(if c == '+' {
                        Addr::Plus(l, r)
                    } else {
                        Addr::Minus(l, r)
                    });
                }
                Some('/' | '?') if left.is_some() => {
                    let l = left.take().map(Box::new);
                    let r = self.simple()?.map(Box::new);
                    left = Some(Addr::Plus(l, r));
                }
                _ => return Ok(left),
            }
        }
    }

    fn simple(&mut self) -> Result<Option<Addr>, SamError> {
        let addr = match self.peek() {
            Some('#') => {
                self.pos += 1;
                Addr::Char(self.number().unwrap_or(1))
            }
            Some(c) if c.is_ascii_digit() => Addr::Line(self.number().unwrap_or(0)),
            Some(c @ ('/' | '?')) => {
                self.pos += 1;
                let re = self.regex_body(c)?;
                if c == '/' {
                    Addr::Forward(re)
                } else {
                    Addr::Backward(re)
                }
            }
            Some('.') => {
                self.pos += 1;
                Addr::Dot
            }
            Some('$') => {
                self.pos += 1;
                Addr::End
            }
            _ => return Ok(None),
        };
        Ok(Some(addr))
    }

    /// `/text/`, or a body of lines ended by a lone `.` when the command is
    /// followed directly by a newline.
    fn text_arg(&mut self) -> Result<String, SamError> {
        self.skip_blanks();
        if self.peek().is_none() {
            return Ok(String::new());
        }
        if self.eat('\n') {
            let mut body = String::new();
            while self.peek().is_some() {
                let line = self.take_line();
                self.eat('\n');
                if line == "." {
                    break;
                }
                body.push_str(&line);
                body.push('\n');
            }
            return Ok(body);
        }
        let delim = self.delim()?;
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
            if c == delim {
                break;
            }
            if c != '\\' {
                out.push(c);
                continue;
            }
            match self.bump() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(d) if d == delim => out.push(d),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        }
        Ok(out)
    }

    /// Pattern up to the closing delimiter; `\delim` becomes `delim`, other
    /// escapes pass through to the regexp engine.
    fn regex_body(&mut self, delim: char) -> Result<String, SamError> {
        let raw = self.delimited(delim);
        if raw.is_empty() {
            return self
                .last_re
                .clone()
                .ok_or_else(|| self.syntax("no previous regexp"));
        }
        self.last_re = Some(raw.clone());
        Ok(raw)
    }

    fn repl_body(&mut self, delim: char) -> String {
        self.delimited(delim)
    }

    fn delimited(&mut self, delim: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.pos += 1;
            if c == delim {
                break;
            }
            if c == '\\' {
                match self.peek() {
                    Some(d) if d == delim => {
                        self.pos += 1;
                        out.push(d);
                    }
                    Some(d) if d != '\n' => {
                        self.pos += 1;
                        out.push('\\');
                        out.push(d);
                    }
                    _ => out.push('\\'),
                }
                continue;
            }
            out.push(c);
        }
        out
    }

    fn delim(&mut self) -> Result<char, SamError> {
        match self.peek() {
            Some(c) if !c.is_alphanumeric() && !c.is_whitespace() && c != '\\' => {
                self.pos += 1;
                Ok(c)
            }
            _ => Err(self.syntax("bad delimiter")),
        }
    }

    fn number(&mut self) -> Option<usize> {
        let start = self.pos;
        let mut n: usize = 0;
        while let Some(d) = self.peek().and_then(|c| c.to_digit(10)) {
            n = n.saturating_mul(10).saturating_add(d as usize);
            self.pos += 1;
        }
        (self.pos > start).then_some(n)
    }

    fn take_line(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '\n') {
            self.pos += 1;
        }
        self.src[start..self.pos].iter().collect()
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.pos += 1;
        }
    }

    fn skip_space(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn syntax(&self, msg: &'static str) -> SamError {
        SamError::Syntax { pos: self.pos, msg }
    }
}
