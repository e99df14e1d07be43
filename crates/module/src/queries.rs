//! Query handlers for the auction module.
//!
//! These functions provide read-only access to auction state. Each one takes
//! the auction locks one at a time and never while holding the registry lock.

use crate::state::{AuctionEntry, AuctionState as ModuleState};
use auction_selection::can_reveal;
use auction_types::{
    Address, AssetDescriptor, AuctionOutcome, AuctionStatus, EncryptedBid, SelectionStrategy,
};
use serde::{Deserialize, Serialize};

/// Summary of an auction for listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionSummary {
    pub auction_id: u64,
    pub creator: Address,
    pub asset: AssetDescriptor,
    pub total_supply: u64,
    pub winner_count: u64,
    pub strategy: SelectionStrategy,
    pub status: AuctionStatus,
    pub start_time: u64,
    pub end_time: u64,
    pub created_at: u64,
    pub num_bids: usize,
    pub escrow_balance: u64,
}

impl AuctionSummary {
    /// Create summary from an auction entry.
    pub fn from_entry(entry: &AuctionEntry) -> Self {
        let config = &entry.config;
        Self {
            auction_id: config.auction_id,
            creator: config.creator,
            asset: config.asset.clone(),
            total_supply: config.total_supply,
            winner_count: config.winner_count,
            strategy: config.strategy,
            status: entry.status,
            start_time: config.start_time,
            end_time: config.end_time,
            created_at: config.created_at,
            num_bids: entry.bids.len(),
            escrow_balance: entry.escrow.balance(),
        }
    }
}

/// Summaries of every live auction accepted by `filter`, ascending by ID.
fn collect_summaries<F>(state: &ModuleState, mut filter: F) -> Vec<AuctionSummary>
where
    F: FnMut(&AuctionEntry) -> bool,
{
    state
        .auction_ids()
        .into_iter()
        .filter_map(|auction_id| state.get_auction(auction_id))
        .filter_map(|auction| {
            let entry = auction.lock();
            filter(&entry).then(|| AuctionSummary::from_entry(&entry))
        })
        .collect()
}

pub fn get_auction_summary(state: &ModuleState, auction_id: u64) -> Option<AuctionSummary> {
    let auction = state.get_auction(auction_id)?;
    let entry = auction.lock();
    Some(AuctionSummary::from_entry(&entry))
}

/// Get auction summaries for listing.
pub fn get_auction_summaries(
    state: &ModuleState,
    offset: usize,
    limit: usize,
) -> Vec<AuctionSummary> {
    state
        .auction_ids()
        .into_iter()
        .skip(offset)
        .take(limit)
        .filter_map(|auction_id| get_auction_summary(state, auction_id))
        .collect()
}

/// Get active auctions (currently accepting bids).
pub fn get_active_auctions(state: &ModuleState, current_time: u64) -> Vec<AuctionSummary> {
    collect_summaries(state, |entry| {
        !entry.status.is_terminal() && entry.config.in_bidding_window(current_time)
    })
}

/// Get open auctions of `creator` whose reveal gate is open at `current_time`.
pub fn get_finalizable(state: &ModuleState, creator: &Address, current_time: u64) -> Vec<u64> {
    collect_summaries(state, |entry| {
        !entry.status.is_terminal()
            && &entry.config.creator == creator
            && can_reveal(entry.config.end_time, current_time)
    })
    .into_iter()
    .map(|summary| summary.auction_id)
    .collect()
}

/// Bids of an auction in arrival order.
pub fn get_auction_bids(state: &ModuleState, auction_id: u64) -> Option<Vec<EncryptedBid>> {
    let auction = state.get_auction(auction_id)?;
    let bids = auction.lock().bids.clone();
    Some(bids)
}

pub fn get_outcome(state: &ModuleState, auction_id: u64) -> Option<AuctionOutcome> {
    let auction = state.get_auction(auction_id)?;
    let outcome = auction.lock().outcome.clone();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{
        handle_create_auction, handle_finalize, handle_place_bid, CallContext, CreateAuctionParams,
    };
    use crate::mint::{AssetLedger, LedgerMint};
    use parking_lot::RwLock;
    use std::sync::Arc;

    const CREATOR: Address = [1u8; 32];

    fn create(state: &ModuleState, creator: Address, start_time: u64, end_time: u64) -> u64 {
        let ledger = Arc::new(RwLock::new(AssetLedger::new()));
        handle_create_auction(
            state,
            &CallContext::new(creator, 1, 0),
            CreateAuctionParams {
                total_supply: 10,
                winner_count: 1,
                strategy: SelectionStrategy::HighestN,
                start_time,
                end_time,
            },
            Box::new(LedgerMint::new(AssetDescriptor::new("LOT", "Lot"), ledger)),
        )
        .unwrap()
    }

    #[test]
    fn test_get_auction_summary() {
        let state = ModuleState::default();
        let auction_id = create(&state, CREATOR, 0, 100);
        handle_place_bid(&state, &CallContext::new([2u8; 32], 1, 5), auction_id, b"7".to_vec(), 3)
            .unwrap();

        let summary = get_auction_summary(&state, auction_id).unwrap();
        assert_eq!(summary.num_bids, 1);
        assert_eq!(summary.escrow_balance, 3);
        assert_eq!(summary.status, AuctionStatus::Open);

        assert!(get_auction_summary(&state, 99).is_none());
    }

    #[test]
    fn test_list_auctions_paginates_in_id_order() {
        let state = ModuleState::default();
        for _ in 0..5 {
            create(&state, CREATOR, 0, 100);
        }

        let ids: Vec<u64> = get_auction_summaries(&state, 1, 3)
            .iter()
            .map(|s| s.auction_id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
        assert!(get_auction_summaries(&state, 5, 10).is_empty());
    }

    #[test]
    fn test_active_and_finalizable() {
        let state = ModuleState::default();
        let early = create(&state, CREATOR, 0, 100);
        let late = create(&state, CREATOR, 50, 200);
        let other = create(&state, [7u8; 32], 0, 100);

        let active: Vec<u64> = get_active_auctions(&state, 60)
            .iter()
            .map(|s| s.auction_id)
            .collect();
        assert_eq!(active, vec![early, late, other]);

        assert_eq!(get_finalizable(&state, &CREATOR, 99), Vec::<u64>::new());
        assert_eq!(get_finalizable(&state, &CREATOR, 100), vec![early]);
        assert_eq!(get_finalizable(&state, &CREATOR, 200), vec![early, late]);

        handle_finalize(&state, &CallContext::new(CREATOR, 2, 150), early).unwrap();
        assert_eq!(get_finalizable(&state, &CREATOR, 200), vec![late]);
        assert!(get_outcome(&state, early).is_some());
        assert!(get_outcome(&state, late).is_none());
    }

    #[test]
    fn test_events_query() {
        let state = ModuleState::default();
        create(&state, CREATOR, 0, 100);
        create(&state, CREATOR, 0, 100);

        let events = state.events_since(1, 10);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, 1);
        assert_eq!(events[0].event.auction_id(), 2);
    }
}
