use core_state::TextError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamError {
    #[error("unknown command `{0}`")]
    UnknownCommand(char),
    #[error("syntax error at {pos}: {msg}")]
    Syntax { pos: usize, msg: &'static str },
    #[error("bad regexp: {0}")]
    Regex(#[from] regex::Error),
    #[error("address out of range")]
    AddressRange,
    #[error("addresses out of order")]
    AddressOrder,
    #[error("no match for `{0}`")]
    NoMatch(String),
    #[error("no substitution")]
    NoSubstitution,
    #[error("move overlaps itself")]
    MoveOverlap,
    #[error("loop ran more than {0} times")]
    LoopLimit(usize),
    #[error(transparent)]
    Text(#[from] TextError),
}
