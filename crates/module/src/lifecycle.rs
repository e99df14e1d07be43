//! Lifecycle guards.
//!
//! ```text
//! Open --finalize (creator, now >= end_time)--> Finalized
//! Open --cancel   (creator, now <  start_time)--> Cancelled
//! ```
//!
//! Both targets are terminal. Every other request fails with a typed error and
//! leaves the auction untouched.

use auction_selection::can_reveal;
use auction_types::{Address, AuctionConfig, AuctionStatus};

use crate::error::AuctionError;

/// A creator-triggered transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Finalize,
    Cancel,
}

impl Transition {
    pub fn target(&self) -> AuctionStatus {
        match self {
            Transition::Finalize => AuctionStatus::Finalized,
            Transition::Cancel => AuctionStatus::Cancelled,
        }
    }
}

/// Check that `caller` may apply `transition` at `now`.
///
/// Status is checked first, so a repeated finalize reports `AlreadyFinalized`
/// whoever sends it.
pub fn authorize_transition(
    config: &AuctionConfig,
    status: AuctionStatus,
    caller: &Address,
    now: u64,
    transition: Transition,
) -> Result<AuctionStatus, AuctionError> {
    ensure_open(config, status)?;

    if caller != &config.creator {
        return Err(AuctionError::Unauthorized);
    }

    match transition {
        Transition::Finalize if !can_reveal(config.end_time, now) => {
            Err(AuctionError::NotYetFinalizable)
        }
        Transition::Cancel if now >= config.start_time => Err(AuctionError::AlreadyStarted),
        _ => Ok(transition.target()),
    }
}

/// Reject terminal auctions. A cancelled record reads as gone.
pub fn ensure_open(config: &AuctionConfig, status: AuctionStatus) -> Result<(), AuctionError> {
    match status {
        AuctionStatus::Open => Ok(()),
        AuctionStatus::Finalized => Err(AuctionError::AlreadyFinalized),
        AuctionStatus::Cancelled => Err(AuctionError::AuctionNotFound(config.auction_id)),
    }
}

/// Check that a bid may be appended at `now`.
pub fn ensure_accepting_bids(
    config: &AuctionConfig,
    status: AuctionStatus,
    now: u64,
) -> Result<(), AuctionError> {
    ensure_open(config, status)?;
    if now < config.start_time {
        return Err(AuctionError::NotStarted);
    }
    if now >= config.end_time {
        return Err(AuctionError::Ended);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_types::{AssetDescriptor, SelectionStrategy};

    const CREATOR: Address = [1u8; 32];

    fn config() -> AuctionConfig {
        AuctionConfig {
            auction_id: 9,
            creator: CREATOR,
            asset: AssetDescriptor::new("LOT", "Lot"),
            total_supply: 100,
            winner_count: 2,
            strategy: SelectionStrategy::HighestN,
            start_time: 1000,
            end_time: 2000,
            created_at: 0,
        }
    }

    #[test]
    fn test_finalize_guards() {
        let c = config();
        assert_eq!(
            authorize_transition(&c, AuctionStatus::Open, &CREATOR, 1999, Transition::Finalize),
            Err(AuctionError::NotYetFinalizable)
        );
        assert_eq!(
            authorize_transition(&c, AuctionStatus::Open, &[2u8; 32], 2000, Transition::Finalize),
            Err(AuctionError::Unauthorized)
        );
        assert_eq!(
            authorize_transition(&c, AuctionStatus::Open, &CREATOR, 2000, Transition::Finalize),
            Ok(AuctionStatus::Finalized)
        );
        assert_eq!(
            authorize_transition(
                &c,
                AuctionStatus::Finalized,
                &CREATOR,
                5000,
                Transition::Finalize
            ),
            Err(AuctionError::AlreadyFinalized)
        );
    }

    #[test]
    fn test_cancel_guards() {
        let c = config();
        assert_eq!(
            authorize_transition(&c, AuctionStatus::Open, &CREATOR, 999, Transition::Cancel),
            Ok(AuctionStatus::Cancelled)
        );
        assert_eq!(
            authorize_transition(&c, AuctionStatus::Open, &CREATOR, 1000, Transition::Cancel),
            Err(AuctionError::AlreadyStarted)
        );
        assert_eq!(
            authorize_transition(&c, AuctionStatus::Open, &[2u8; 32], 0, Transition::Cancel),
            Err(AuctionError::Unauthorized)
        );
        assert_eq!(
            authorize_transition(&c, AuctionStatus::Finalized, &CREATOR, 0, Transition::Cancel),
            Err(AuctionError::AlreadyFinalized)
        );
    }

    #[test]
    fn test_bid_window() {
        let c = config();
        assert_eq!(
            ensure_accepting_bids(&c, AuctionStatus::Open, 999),
            Err(AuctionError::NotStarted)
        );
        assert!(ensure_accepting_bids(&c, AuctionStatus::Open, 1000).is_ok());
        assert!(ensure_accepting_bids(&c, AuctionStatus::Open, 1999).is_ok());
        assert_eq!(
            ensure_accepting_bids(&c, AuctionStatus::Open, 2000),
            Err(AuctionError::Ended)
        );
        assert_eq!(
            ensure_accepting_bids(&c, AuctionStatus::Finalized, 1500),
            Err(AuctionError::AlreadyFinalized)
        );
        assert_eq!(
            ensure_accepting_bids(&c, AuctionStatus::Cancelled, 1500),
            Err(AuctionError::AuctionNotFound(9))
        );
    }
}
