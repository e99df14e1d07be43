//! Call handlers for the auction module.
//!
//! These functions implement the business logic for each call type. Every
//! handler that touches an existing auction holds that auction's lock from the
//! first guard to the last mutation.

use crate::error::AuctionError;
use crate::lifecycle::{authorize_transition, ensure_accepting_bids, ensure_open, Transition};
use crate::mint::MintCapability;
use crate::settlement::{plan_refunds, settle, SettleContext, SettlementReceipt};
use crate::state::{AuctionEntry, AuctionState as ModuleState};
use auction_selection::{reveal_gated, select_eligible_winners};
use auction_types::{
    compute_bids_digest, compute_finalize_seed, Address, AuctionConfig, AuctionEvent,
    AuctionStatus, BidIndex, EncryptedBid, Payout, RevealedBid, SelectionStrategy,
};
use tracing::{debug, error, info};

/// Context provided by the runtime for each call.
#[derive(Clone, Debug)]
pub struct CallContext {
    /// Sender of the transaction
    pub sender: Address,
    /// Current block height
    pub block_height: u64,
    /// Current timestamp (milliseconds)
    pub timestamp: u64,
    /// Digest of the transaction carrying the call
    pub tx_digest: [u8; 32],
}

impl CallContext {
    pub fn new(sender: Address, block_height: u64, timestamp: u64) -> Self {
        Self {
            sender,
            block_height,
            timestamp,
            tx_digest: [0u8; 32],
        }
    }

    pub fn with_tx_digest(mut self, tx_digest: [u8; 32]) -> Self {
        self.tx_digest = tx_digest;
        self
    }
}

/// Result type for handlers.
pub type HandlerResult<T> = Result<T, AuctionError>;

/// Parameters of a new auction. The asset comes from the attached capability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateAuctionParams {
    pub total_supply: u64,
    pub winner_count: u64,
    pub strategy: SelectionStrategy,
    pub start_time: u64,
    pub end_time: u64,
}

/// What a cancellation hands back to the host.
#[derive(Debug)]
pub struct CancelReceipt {
    pub auction_id: u64,
    /// Returned to the creator
    pub capability: Box<dyn MintCapability>,
    /// Escrow owed to bidders, if any bid was ever accepted
    pub refunds: Vec<Payout>,
}

/// Check creation parameters against the module limits.
///
/// Hosts call this before detaching a capability from their own bookkeeping, so
/// a rejected creation never strands one.
pub fn validate_create_params(
    state: &ModuleState,
    params: &CreateAuctionParams,
) -> HandlerResult<()> {
    let limits = &state.config().default_params;

    if params.end_time <= params.start_time
        || params.end_time - params.start_time < limits.min_duration
    {
        return Err(AuctionError::InvalidTiming);
    }
    if params.total_supply == 0 {
        return Err(AuctionError::InvalidAmount("total supply must be positive"));
    }
    if params.winner_count == 0 {
        return Err(AuctionError::InvalidAmount("winner count must be positive"));
    }
    if params.winner_count > limits.max_winner_count {
        return Err(AuctionError::InvalidAmount("winner count exceeds limit"));
    }
    Ok(())
}

/// Handle CreateAuction call.
pub fn handle_create_auction(
    state: &ModuleState,
    ctx: &CallContext,
    params: CreateAuctionParams,
    capability: Box<dyn MintCapability>,
) -> HandlerResult<u64> {
    validate_create_params(state, &params)?;

    let auction_id = state.allocate_auction_id();
    let config = AuctionConfig {
        auction_id,
        creator: ctx.sender,
        asset: capability.asset().clone(),
        total_supply: params.total_supply,
        winner_count: params.winner_count,
        strategy: params.strategy,
        start_time: params.start_time,
        end_time: params.end_time,
        created_at: ctx.timestamp,
    };

    let event = AuctionEvent::AuctionCreated {
        auction_id,
        creator: config.creator,
        asset_symbol: config.asset.symbol.clone(),
        total_supply: config.total_supply,
        winner_count: config.winner_count,
        strategy: config.strategy,
        start_time: config.start_time,
        end_time: config.end_time,
    };

    state.insert_auction(AuctionEntry::new(config, capability));
    state.emit(ctx.timestamp, event);

    Ok(auction_id)
}

/// Handle PlaceBid call.
///
/// Guards run in a fixed order: status, then payment, then the bidding window.
pub fn handle_place_bid(
    state: &ModuleState,
    ctx: &CallContext,
    auction_id: u64,
    payload: Vec<u8>,
    payment: u64,
) -> HandlerResult<BidIndex> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;
    let mut entry = auction.lock();

    ensure_open(&entry.config, entry.status)?;
    if payment == 0 {
        return Err(AuctionError::InvalidAmount("payment must be positive"));
    }
    ensure_accepting_bids(&entry.config, entry.status, ctx.timestamp)?;

    entry
        .escrow
        .merge(payment)
        .map_err(|_| AuctionError::InvalidAmount("escrow balance would overflow"))?;

    let bid_index = entry.bids.len() as BidIndex;
    entry.bids.push(EncryptedBid {
        bidder: ctx.sender,
        payload,
        payment_amount: payment,
        submitted_at: ctx.timestamp,
    });
    debug!(
        auction_id,
        bid_index,
        escrow = entry.escrow.balance(),
        "Bid appended"
    );

    state.emit(
        ctx.timestamp,
        AuctionEvent::BidPlaced {
            auction_id,
            bidder: ctx.sender,
            payment_amount: payment,
            bid_index,
        },
    );

    Ok(bid_index)
}

/// Handle Finalize call: reveal, select winners, settle.
///
/// The winners' shares are minted after the auction lock is released.
pub fn handle_finalize(
    state: &ModuleState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<SettlementReceipt> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;

    let (receipt, issuance) = {
        let mut entry = auction.lock();

        authorize_transition(
            &entry.config,
            entry.status,
            &ctx.sender,
            ctx.timestamp,
            Transition::Finalize,
        )?;

        let revealed = reveal_gated(&entry.bids, entry.config.end_time, ctx.timestamp)?;
        let exclude_malformed = state.config().reveal.exclude_malformed;
        let eligible = |bid: &RevealedBid| !(exclude_malformed && bid.malformed);

        let bids_digest = compute_bids_digest(&entry.bids);
        let seed = compute_finalize_seed(auction_id, entry.config.end_time, &bids_digest);
        let winners = select_eligible_winners(
            entry.config.strategy,
            &revealed,
            &eligible,
            entry.config.winner_count,
            &seed,
        )?;

        let settle_ctx = SettleContext {
            caller: ctx.sender,
            now: ctx.timestamp,
            seed,
            bids_digest,
            remainder_policy: state.config().distribution.remainder,
        };
        let settled = settle(&mut entry, &settle_ctx, &winners)?;

        info!(
            auction_id,
            strategy = %entry.config.strategy,
            bids = entry.bids.len(),
            candidates = revealed.iter().filter(|&bid| eligible(bid)).count(),
            winners = winners.len(),
            share = settled.0.outcome.share_per_winner,
            "Auction finalized"
        );
        state.emit(
            ctx.timestamp,
            AuctionEvent::AuctionFinalized {
                auction_id,
                winner_count: winners.len() as u64,
            },
        );
        settled
    };

    issuance.apply();
    Ok(receipt)
}

/// Handle Cancel call.
///
/// Refunds any escrow, hands the capability back and removes the auction, so
/// later lookups report `AuctionNotFound`.
pub fn handle_cancel(
    state: &ModuleState,
    ctx: &CallContext,
    auction_id: u64,
) -> HandlerResult<CancelReceipt> {
    let auction = state
        .get_auction(auction_id)
        .ok_or(AuctionError::AuctionNotFound(auction_id))?;
    let mut entry = auction.lock();

    authorize_transition(
        &entry.config,
        entry.status,
        &ctx.sender,
        ctx.timestamp,
        Transition::Cancel,
    )?;

    let (refunds, escrow_after) = plan_refunds(&entry).map_err(|e| {
        error!(auction_id, error = %e, "Cancellation refunds rejected");
        e
    })?;
    let capability = entry.take_capability().ok_or_else(|| {
        AuctionError::InvariantViolation(format!(
            "auction {auction_id} lost its mint capability"
        ))
    })?;

    entry.escrow = escrow_after;
    entry.status = AuctionStatus::Cancelled;
    state.remove_auction(auction_id);

    let refunded: u64 = refunds.iter().map(|r| r.amount).sum();
    state.emit(
        ctx.timestamp,
        AuctionEvent::AuctionCancelled {
            auction_id,
            refunded,
        },
    );

    Ok(CancelReceipt {
        auction_id,
        capability,
        refunds,
    })
}
