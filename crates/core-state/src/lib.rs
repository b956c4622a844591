//! Editor text state: the rune-addressed [`Text`] model and the [`Elog`]
//! batch that sam scripts record into.
//!
//! Undo granularity:
//! - Edits made directly on a `Text` join the buffer's open undo unit until
//!   [`Text::commit`] closes it.
//! - [`Elog::apply`] commits before and after replaying, so a whole script
//!   undoes as one unit regardless of how many entries it recorded.
//!
//! Telemetry: mutations trace on `state.text`; elog replay emits one
//! `debug!` per entry and out-of-sequence recordings `warn!` on `state.elog`.

mod elog;
mod error;
mod text;

pub use elog::{Elog, ElogEntry, ElogKind, ElogWarning};
pub use error::TextError;
pub use text::Text;
