//! Auction module error types.

use thiserror::Error;

use auction_selection::SelectionError;

/// Errors that can occur in the auction module.
///
/// Every variant except `InvariantViolation` is a guard failure: the operation is
/// rejected and the auction is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("Auction not found: {0}")]
    AuctionNotFound(u64),

    #[error("Auction not started")]
    NotStarted,

    #[error("Auction ended")]
    Ended,

    #[error("Auction already finalized")]
    AlreadyFinalized,

    #[error("Auction cannot be finalized before its end time")]
    NotYetFinalizable,

    #[error("Auction already started")]
    AlreadyStarted,

    #[error("Not authorized")]
    Unauthorized,

    #[error("Invalid amount: {0}")]
    InvalidAmount(&'static str),

    #[error("Invalid timing configuration")]
    InvalidTiming,

    #[error("Selection failed: {0}")]
    Selection(#[from] SelectionError),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl AuctionError {
    /// A logic defect rather than a rejected precondition. Never retry these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuctionError::InvariantViolation(_))
    }

    /// Stable numeric code per error kind, used on the RPC surface.
    pub fn code(&self) -> i32 {
        match self {
            AuctionError::AuctionNotFound(_) => 4000,
            AuctionError::NotStarted => 4001,
            AuctionError::Ended => 4002,
            AuctionError::AlreadyFinalized => 4003,
            AuctionError::NotYetFinalizable => 4004,
            AuctionError::AlreadyStarted => 4005,
            AuctionError::Unauthorized => 4006,
            AuctionError::InvalidAmount(_) => 4007,
            AuctionError::InvalidTiming => 4008,
            AuctionError::Selection(_) => 4009,
            AuctionError::InvariantViolation(_) => 5000,
        }
    }
}
