//! Settlement and distribution.
//!
//! Settlement runs in two steps under the auction lock. `plan_settlement` is pure:
//! it computes every mint and refund against a copy of the escrow pool and
//! checks that the pool drains to exactly zero. Only a verified plan is
//! committed, and committing cannot fail, so an auction is either fully settled
//! or untouched.
//!
//! Committing does not mint. It moves the capability out of the auction into a
//! `PendingIssuance` that the caller applies after releasing the auction lock,
//! so the asset ledger is never locked from inside an auction's critical section.
//!
//! Supply is split evenly: `share = total_supply / winners`. The leftover
//! `total_supply % winners` follows the configured `RemainderPolicy`. Escrow is a
//! refundable deposit, so every bid's payment goes back to its bidder whether it
//! won or not.

use auction_types::{Address, AuctionOutcome, AuctionStatus, Payout, RevealedBid, WinnerRecord};
use tracing::{debug, error};

use crate::error::AuctionError;
use crate::escrow::EscrowPool;
use crate::genesis::RemainderPolicy;
use crate::lifecycle::{authorize_transition, Transition};
use crate::mint::MintCapability;
use crate::state::AuctionEntry;

/// Inputs fixed by the finalize call.
#[derive(Debug, Clone)]
pub struct SettleContext {
    pub caller: Address,
    pub now: u64,
    pub seed: [u8; 32],
    pub bids_digest: [u8; 32],
    pub remainder_policy: RemainderPolicy,
}

/// Every effect of a settlement, computed before anything is applied.
#[derive(Debug, Clone)]
pub struct SettlementPlan {
    pub winners: Vec<WinnerRecord>,
    pub share_per_winner: u64,
    pub undistributed_remainder: u64,
    pub remainder_to_creator: u64,
    pub refunds: Vec<Payout>,
    escrow_after: EscrowPool,
}

impl SettlementPlan {
    pub fn total_refunded(&self) -> u64 {
        self.refunds.iter().map(|r| r.amount).sum()
    }
}

/// What a committed settlement produced.
#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub outcome: AuctionOutcome,
    /// Escrow to hand back to bidders, one entry per original bid
    pub refunds: Vec<Payout>,
}

/// One mint a committed settlement owes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintOrder {
    pub recipient: Address,
    pub amount: u64,
}

/// Mints owed by a committed settlement, with the capability that pays them.
///
/// Applying consumes the capability, so a finalized auction can never mint again.
#[derive(Debug)]
#[must_use = "winners receive nothing until the issuance is applied"]
pub struct PendingIssuance {
    capability: Box<dyn MintCapability>,
    orders: Vec<MintOrder>,
}

impl PendingIssuance {
    pub fn orders(&self) -> &[MintOrder] {
        &self.orders
    }

    /// Mint every order.
    pub fn apply(mut self) {
        for order in &self.orders {
            self.capability.mint(order.amount, order.recipient);
        }
        debug!(
            symbol = %self.capability.asset().symbol,
            mints = self.orders.len(),
            "Applied settlement mints"
        );
    }
}

/// Refund every bid's payment from a copy of the escrow pool.
///
/// The returned pool must be empty; any residue or shortfall means escrow and
/// the bid list disagree.
pub(crate) fn plan_refunds(entry: &AuctionEntry) -> Result<(Vec<Payout>, EscrowPool), AuctionError> {
    let auction_id = entry.config.auction_id;
    let mut escrow_after = entry.escrow.clone();
    let mut refunds = Vec::with_capacity(entry.bids.len());
    for (origin_index, bid) in entry.bids.iter().enumerate() {
        let amount = escrow_after.split(bid.payment_amount).map_err(|e| {
            AuctionError::InvariantViolation(format!(
                "refund of bid {origin_index} in auction {auction_id}: {e}"
            ))
        })?;
        refunds.push(Payout {
            recipient: bid.bidder,
            amount,
            origin_index,
        });
    }

    if !escrow_after.is_empty() {
        return Err(AuctionError::InvariantViolation(format!(
            "escrow residue {} after refunds in auction {auction_id}",
            escrow_after.balance()
        )));
    }
    Ok((refunds, escrow_after))
}

/// Compute the settlement of `entry` for `winners` without mutating it.
pub fn plan_settlement(
    entry: &AuctionEntry,
    winners: &[RevealedBid],
    policy: RemainderPolicy,
) -> Result<SettlementPlan, AuctionError> {
    let config = &entry.config;
    let winner_total = winners.len() as u64;

    let share_per_winner = config.total_supply / winner_total.max(1);
    let (undistributed_remainder, remainder_to_creator) = if winner_total == 0 {
        // Nothing is minted without winners.
        (config.total_supply, 0)
    } else {
        let remainder = config.total_supply - share_per_winner * winner_total;
        match policy {
            RemainderPolicy::Discard => (remainder, 0),
            RemainderPolicy::ToCreator => (0, remainder),
        }
    };

    let winners = winners
        .iter()
        .map(|w| WinnerRecord {
            bidder: w.bidder,
            origin_index: w.origin_index,
            amount: w.amount,
            share: share_per_winner,
        })
        .collect();

    let (refunds, escrow_after) = plan_refunds(entry)?;

    Ok(SettlementPlan {
        winners,
        share_per_winner,
        undistributed_remainder,
        remainder_to_creator,
        refunds,
        escrow_after,
    })
}

/// Settle an auction: verify, plan, then mark it finalized.
///
/// Fails with `AlreadyFinalized` on a second call and leaves the auction
/// unchanged on any error. The returned issuance must be applied by the caller.
pub fn settle(
    entry: &mut AuctionEntry,
    ctx: &SettleContext,
    winners: &[RevealedBid],
) -> Result<(SettlementReceipt, PendingIssuance), AuctionError> {
    authorize_transition(
        &entry.config,
        entry.status,
        &ctx.caller,
        ctx.now,
        Transition::Finalize,
    )?;

    let plan = plan_settlement(entry, winners, ctx.remainder_policy).map_err(|e| {
        error!(auction_id = entry.config.auction_id, error = %e, "Settlement plan rejected");
        e
    })?;

    let capability = entry.take_capability().ok_or_else(|| {
        AuctionError::InvariantViolation(format!(
            "auction {} lost its mint capability",
            entry.config.auction_id
        ))
    })?;

    Ok(commit(entry, ctx, plan, capability))
}

fn commit(
    entry: &mut AuctionEntry,
    ctx: &SettleContext,
    plan: SettlementPlan,
    capability: Box<dyn MintCapability>,
) -> (SettlementReceipt, PendingIssuance) {
    let auction_id = entry.config.auction_id;

    let mut orders: Vec<MintOrder> = plan
        .winners
        .iter()
        .map(|winner| MintOrder {
            recipient: winner.bidder,
            amount: winner.share,
        })
        .collect();
    if plan.remainder_to_creator > 0 {
        orders.push(MintOrder {
            recipient: entry.config.creator,
            amount: plan.remainder_to_creator,
        });
    }
    debug!(
        auction_id,
        winners = plan.winners.len(),
        share = plan.share_per_winner,
        "Recorded winner shares"
    );

    let total_refunded = plan.total_refunded();
    let outcome = AuctionOutcome {
        auction_id,
        strategy: entry.config.strategy,
        winners: plan.winners,
        share_per_winner: plan.share_per_winner,
        undistributed_remainder: plan.undistributed_remainder,
        remainder_to_creator: plan.remainder_to_creator,
        total_refunded,
        seed: ctx.seed,
        bids_digest: ctx.bids_digest,
        finalized_at: ctx.now,
        finalized_by: ctx.caller,
    };

    entry.escrow = plan.escrow_after;
    entry.status = AuctionStatus::Finalized;
    entry.outcome = Some(outcome.clone());

    let receipt = SettlementReceipt {
        outcome,
        refunds: plan.refunds,
    };
    (receipt, PendingIssuance { capability, orders })
}
