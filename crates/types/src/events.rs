//! Observability events emitted by the auction module.
//!
//! Events are fire-and-forget notifications for external indexers; delivery is
//! at-least-once, so consumers deduplicate on `EventRecord::sequence`.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{Address, BidIndex, SelectionStrategy};

/// An auction state change worth telling the outside world about.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuctionEvent {
    AuctionCreated {
        auction_id: u64,
        creator: Address,
        asset_symbol: String,
        total_supply: u64,
        winner_count: u64,
        strategy: SelectionStrategy,
        start_time: u64,
        end_time: u64,
    },

    BidPlaced {
        auction_id: u64,
        bidder: Address,
        payment_amount: u64,
        bid_index: BidIndex,
    },

    AuctionFinalized {
        auction_id: u64,
        winner_count: u64,
    },

    AuctionCancelled {
        auction_id: u64,
        refunded: u64,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> u64 {
        match self {
            AuctionEvent::AuctionCreated { auction_id, .. }
            | AuctionEvent::BidPlaced { auction_id, .. }
            | AuctionEvent::AuctionFinalized { auction_id, .. }
            | AuctionEvent::AuctionCancelled { auction_id, .. } => *auction_id,
        }
    }

    /// Short name for logs and filters.
    pub fn kind(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionCreated { .. } => "auction_created",
            AuctionEvent::BidPlaced { .. } => "bid_placed",
            AuctionEvent::AuctionFinalized { .. } => "auction_finalized",
            AuctionEvent::AuctionCancelled { .. } => "auction_cancelled",
        }
    }
}

/// An event with its position in the module-wide journal.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct EventRecord {
    /// Strictly increasing, starting at 0
    pub sequence: u64,
    pub timestamp: u64,
    pub event: AuctionEvent,
}
