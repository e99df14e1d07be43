//! Core type definitions for sealed-bid settlement auctions.
//!
//! This crate provides the shared data structures used across the auction system:
//! auction parameters, encrypted and revealed bids, settlement outcomes, events,
//! and the digests that bind a finalization to the bid set it settled.

use std::fmt;
use std::str::FromStr;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use thiserror::Error;

pub mod events;

pub use events::{AuctionEvent, EventRecord};

// =========================
// IDENTITIES
// =========================

/// Generic address type (32 bytes)
pub type Address = [u8; 32];

/// Position of a bid in its auction's arrival order.
pub type BidIndex = u64;

// =========================
// AUCTION TYPES
// =========================

/// Rule mapping revealed bids to winners.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum SelectionStrategy {
    /// The N largest bids win; ties go to the earlier bid.
    HighestN,

    /// N distinct bids drawn with a seed fixed when bidding closes.
    RandomN,

    /// The N bids closest to the truncated mean win; ties go to the earlier bid.
    ClosestToMeanN,
}

impl SelectionStrategy {
    /// Wire name used by the RPC and CLI surfaces.
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionStrategy::HighestN => "highest_n",
            SelectionStrategy::RandomN => "random_n",
            SelectionStrategy::ClosestToMeanN => "closest_to_mean_n",
        }
    }
}

impl fmt::Display for SelectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a strategy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown selection strategy: {0}")]
pub struct UnknownStrategy(pub String);

impl FromStr for SelectionStrategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highest_n" => Ok(SelectionStrategy::HighestN),
            "random_n" => Ok(SelectionStrategy::RandomN),
            "closest_to_mean_n" => Ok(SelectionStrategy::ClosestToMeanN),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// Auction lifecycle state.
///
/// There is no separate pre-open state: an auction accepts bids as soon as its
/// window opens, and cancellation is gated on the clock instead.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub enum AuctionStatus {
    /// Accepting bids inside the bidding window
    Open,
    /// Winners selected, supply minted, escrow refunded
    Finalized,
    /// Withdrawn by the creator before the window opened
    Cancelled,
}

impl AuctionStatus {
    /// Whether no further transition is allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuctionStatus::Finalized | AuctionStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Open => "open",
            AuctionStatus::Finalized => "finalized",
            AuctionStatus::Cancelled => "cancelled",
        }
    }
}

/// What an auction distributes. Owned by the issuance service; auctions only
/// carry the reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
}

impl AssetDescriptor {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            description: None,
        }
    }
}

/// Immutable auction parameters, fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionConfig {
    pub auction_id: u64,
    pub creator: Address,
    pub asset: AssetDescriptor,

    // Distribution
    pub total_supply: u64,
    pub winner_count: u64,
    pub strategy: SelectionStrategy,

    // Timing (milliseconds)
    pub start_time: u64,
    pub end_time: u64,
    pub created_at: u64,
}

impl AuctionConfig {
    /// Whether `now` falls inside the half-open bidding window `[start_time, end_time)`.
    pub fn in_bidding_window(&self, now: u64) -> bool {
        now >= self.start_time && now < self.end_time
    }
}

/// A submitted sealed bid. Never modified after it is appended.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EncryptedBid {
    pub bidder: Address,

    /// Ciphertext of the bid amount, opaque until the reveal gate opens
    #[serde_as(as = "Hex")]
    pub payload: Vec<u8>,

    /// Escrow posted with the bid, independent of the sealed amount
    pub payment_amount: u64,

    /// Clock reading at submission (informational only)
    pub submitted_at: u64,
}

/// A bid after revelation. Only ever built during finalization.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct RevealedBid {
    pub bidder: Address,
    pub amount: u64,
    pub payment_amount: u64,
    pub origin_index: usize,
    /// Payload was empty, contained non-digit bytes, or overflowed
    pub malformed: bool,
}

/// Escrow returned to a bidder.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Payout {
    pub recipient: Address,
    pub amount: u64,
    pub origin_index: usize,
}

/// One winning bid and the share of supply it received.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct WinnerRecord {
    pub bidder: Address,
    pub origin_index: usize,
    pub amount: u64,
    pub share: u64,
}

/// Historical record kept once an auction is finalized.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct AuctionOutcome {
    pub auction_id: u64,
    pub strategy: SelectionStrategy,
    pub winners: Vec<WinnerRecord>,
    pub share_per_winner: u64,
    /// Supply left over by the integer split and not minted to anyone
    pub undistributed_remainder: u64,
    /// Supply left over by the integer split and minted to the creator
    pub remainder_to_creator: u64,
    pub total_refunded: u64,
    pub seed: [u8; 32],
    pub bids_digest: [u8; 32],
    pub finalized_at: u64,
    pub finalized_by: Address,
}

// =========================
// HELPER FUNCTIONS
// =========================

/// Digest over the full ordered bid list.
///
/// Any change to a bidder, payload, payment, or the arrival order changes the digest.
pub fn compute_bids_digest(bids: &[EncryptedBid]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"AUCTION_BIDS_V1:");
    hasher.update((bids.len() as u64).to_le_bytes());
    for bid in bids {
        hasher.update(bid.bidder);
        hasher.update((bid.payload.len() as u64).to_le_bytes());
        hasher.update(&bid.payload);
        hasher.update(bid.payment_amount.to_le_bytes());
    }
    hasher.finalize().into()
}

/// Compute the selection seed for a finalization.
///
/// Binds the auction, its deadline and the sealed bid set. All three are fixed
/// once bidding closes, so whoever submits the finalize call cannot move the
/// seed by choosing when or how to submit it.
pub fn compute_finalize_seed(auction_id: u64, end_time: u64, bids_digest: &[u8; 32]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(b"AUCTION_FINALIZE_SEED_V2:");
    hasher.update(auction_id.to_le_bytes());
    hasher.update(end_time.to_le_bytes());
    hasher.update(bids_digest);
    hasher.finalize().into()
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    use sha2::{Digest, Sha256};
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bid(bidder: u8, payload: &[u8], payment: u64) -> EncryptedBid {
        EncryptedBid {
            bidder: [bidder; 32],
            payload: payload.to_vec(),
            payment_amount: payment,
            submitted_at: 0,
        }
    }

    #[test]
    fn test_bids_digest_is_order_sensitive() {
        let a = bid(1, b"100", 10);
        let b = bid(2, b"200", 10);

        let forward = compute_bids_digest(&[a.clone(), b.clone()]);
        let reversed = compute_bids_digest(&[b, a]);
        assert_ne!(forward, reversed);
    }

    #[test]
    fn test_bids_digest_ignores_submission_time() {
        let a = bid(1, b"100", 10);
        let mut later = a.clone();
        later.submitted_at = 99;

        assert_eq!(compute_bids_digest(&[a]), compute_bids_digest(&[later]));
    }

    #[test]
    fn test_bids_digest_payload_boundaries() {
        // Length prefixing keeps "1"+"23" distinct from "12"+"3".
        let first = compute_bids_digest(&[bid(1, b"1", 5), bid(1, b"23", 5)]);
        let second = compute_bids_digest(&[bid(1, b"12", 5), bid(1, b"3", 5)]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_finalize_seed_binds_inputs() {
        let digest = compute_bids_digest(&[bid(1, b"7", 1)]);
        let seed = compute_finalize_seed(1, 100, &digest);

        assert_eq!(seed, compute_finalize_seed(1, 100, &digest));
        assert_ne!(seed, compute_finalize_seed(2, 100, &digest));
        assert_ne!(seed, compute_finalize_seed(1, 101, &digest));
        assert_ne!(seed, compute_finalize_seed(1, 100, &[0u8; 32]));
    }

    #[test]
    fn test_strategy_names() {
        for strategy in [
            SelectionStrategy::HighestN,
            SelectionStrategy::RandomN,
            SelectionStrategy::ClosestToMeanN,
        ] {
            assert_eq!(strategy.as_str().parse::<SelectionStrategy>(), Ok(strategy));
        }
        assert!("vickrey".parse::<SelectionStrategy>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!AuctionStatus::Open.is_terminal());
        assert!(AuctionStatus::Finalized.is_terminal());
        assert!(AuctionStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_bidding_window_is_half_open() {
        let config = AuctionConfig {
            auction_id: 1,
            creator: [0u8; 32],
            asset: AssetDescriptor::new("LOT", "Lot token"),
            total_supply: 10,
            winner_count: 1,
            strategy: SelectionStrategy::HighestN,
            start_time: 100,
            end_time: 200,
            created_at: 0,
        };

        assert!(!config.in_bidding_window(99));
        assert!(config.in_bidding_window(100));
        assert!(config.in_bidding_window(199));
        assert!(!config.in_bidding_window(200));
    }

    #[test]
    fn test_encrypted_bid_serialization() {
        let original = bid(3, &[0xde, 0xad], 42);

        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(json["payload"], "dead");
        let decoded: EncryptedBid = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, original);

        let encoded = borsh::to_vec(&original).unwrap();
        let decoded: EncryptedBid = borsh::from_slice(&encoded).unwrap();
        assert_eq!(decoded, original);
    }
}
