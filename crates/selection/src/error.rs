//! Error types for reveal and selection.

use thiserror::Error;

/// Errors that can occur while revealing or selecting bids.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Bids are sealed until {end_time} (now {now})")]
    RevealLocked { end_time: u64, now: u64 },

    #[error("Random selection requires a non-empty seed")]
    EmptySeed,
}
