//! sam command language over a [`core_state::Text`].
//!
//! [`Sam::run`] parses a script, evaluates every address and command against
//! the text as it stood when the script started, records the resulting
//! changes in an [`core_state::Elog`] and applies them in one undo unit.
//!
//! ```text
//! ,x/teh/c/the/        fix a typo everywhere
//! /^func/+,/^}/-d      empty the first function body
//! 1,$s/\t/    /g       expand tabs
//! ```

mod addr;
mod error;
mod exec;
mod parse;

pub use error::SamError;
pub use exec::{DEFAULT_MAX_LOOP, ExecReport, Range, Sam};
pub use parse::{Addr, Cmd, Command, LoopKind, Parser};
