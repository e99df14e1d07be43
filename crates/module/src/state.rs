//! In-memory state structures for the auction module.
//!
//! Each auction lives behind its own mutex; the registry lock is held only long
//! enough to look up, insert or remove an entry. Operations on different
//! auctions therefore never wait on each other, while every operation on one
//! auction is applied atomically and in a single total order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use auction_types::{
    AuctionConfig, AuctionEvent, AuctionOutcome, AuctionStatus, EncryptedBid, EventRecord,
};
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::escrow::EscrowPool;
use crate::genesis::AuctionGenesisConfig;
use crate::mint::MintCapability;

/// The root aggregate for one auction.
#[derive(Debug)]
pub struct AuctionEntry {
    pub config: AuctionConfig,
    pub status: AuctionStatus,
    /// Arrival order; only ever appended to
    pub bids: Vec<EncryptedBid>,
    pub escrow: EscrowPool,
    pub outcome: Option<AuctionOutcome>,
    capability: Option<Box<dyn MintCapability>>,
}

impl AuctionEntry {
    pub fn new(config: AuctionConfig, capability: Box<dyn MintCapability>) -> Self {
        Self {
            config,
            status: AuctionStatus::Open,
            bids: Vec::new(),
            escrow: EscrowPool::new(),
            outcome: None,
            capability: Some(capability),
        }
    }

    /// Move the capability out. Cancellation hands it back to the creator and
    /// settlement spends it on the winners' shares.
    pub(crate) fn take_capability(&mut self) -> Option<Box<dyn MintCapability>> {
        self.capability.take()
    }

    /// True until the auction is cancelled or settled.
    pub fn has_capability(&self) -> bool {
        self.capability.is_some()
    }
}

/// Shared handle to one auction.
pub type SharedAuction = Arc<Mutex<AuctionEntry>>;

/// Append-only journal of emitted events.
#[derive(Debug, Default)]
pub struct EventJournal {
    records: Vec<EventRecord>,
}

impl EventJournal {
    /// Append an event and return its sequence number.
    pub fn push(&mut self, timestamp: u64, event: AuctionEvent) -> u64 {
        let sequence = self.records.len() as u64;
        self.records.push(EventRecord {
            sequence,
            timestamp,
            event,
        });
        sequence
    }

    /// Events with `sequence >= cursor`, at most `limit` of them.
    pub fn since(&self, cursor: u64, limit: usize) -> Vec<EventRecord> {
        let start = usize::try_from(cursor).unwrap_or(usize::MAX);
        self.records
            .iter()
            .skip(start)
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Auction module state.
#[derive(Debug)]
pub struct AuctionState {
    config: AuctionGenesisConfig,

    /// Next auction ID to assign
    next_auction_id: AtomicU64,

    /// All live auctions by ID
    auctions: RwLock<HashMap<u64, SharedAuction>>,

    /// Emitted events
    journal: Mutex<EventJournal>,
}

impl Default for AuctionState {
    fn default() -> Self {
        Self::new(AuctionGenesisConfig::default())
    }
}

impl AuctionState {
    /// Create a new auction state.
    pub fn new(config: AuctionGenesisConfig) -> Self {
        Self {
            config,
            next_auction_id: AtomicU64::new(1),
            auctions: RwLock::new(HashMap::new()),
            journal: Mutex::new(EventJournal::default()),
        }
    }

    pub fn config(&self) -> &AuctionGenesisConfig {
        &self.config
    }

    /// Get the next auction ID and increment.
    pub fn allocate_auction_id(&self) -> u64 {
        self.next_auction_id.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn insert_auction(&self, entry: AuctionEntry) -> SharedAuction {
        let auction_id = entry.config.auction_id;
        let shared = Arc::new(Mutex::new(entry));
        self.auctions.write().insert(auction_id, shared.clone());
        shared
    }

    pub(crate) fn remove_auction(&self, auction_id: u64) -> Option<SharedAuction> {
        self.auctions.write().remove(&auction_id)
    }

    /// Get auction by ID.
    pub fn get_auction(&self, auction_id: u64) -> Option<SharedAuction> {
        self.auctions.read().get(&auction_id).cloned()
    }

    /// IDs of all live auctions, ascending.
    pub fn auction_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.auctions.read().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn auction_count(&self) -> usize {
        self.auctions.read().len()
    }

    /// Record an event in the journal and mirror it to the log.
    pub fn emit(&self, timestamp: u64, event: AuctionEvent) -> u64 {
        info!(
            auction_id = event.auction_id(),
            kind = event.kind(),
            "Auction event"
        );
        self.journal.lock().push(timestamp, event)
    }

    /// Journal entries from `cursor` onward.
    pub fn events_since(&self, cursor: u64, limit: usize) -> Vec<EventRecord> {
        self.journal.lock().since(cursor, limit)
    }

    pub fn event_count(&self) -> usize {
        self.journal.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_auction_id() {
        let state = AuctionState::default();
        assert_eq!(state.allocate_auction_id(), 1);
        assert_eq!(state.allocate_auction_id(), 2);
        assert_eq!(state.allocate_auction_id(), 3);
    }

    #[test]
    fn test_journal_cursor() {
        let mut journal = EventJournal::default();
        for auction_id in 1..=5 {
            journal.push(
                auction_id * 10,
                AuctionEvent::AuctionFinalized {
                    auction_id,
                    winner_count: 0,
                },
            );
        }

        let page = journal.since(2, 2);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].sequence, 2);
        assert_eq!(page[1].sequence, 3);
        assert!(journal.since(5, 10).is_empty());
        assert!(journal.since(u64::MAX, 10).is_empty());
    }
}
