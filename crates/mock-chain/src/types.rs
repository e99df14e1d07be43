//! RPC-compatible types for the mock chain.
//!
//! The wire structs live in `auction_client::query` so both ends share them;
//! this module converts module types into their wire form.

use auction_module::AuctionSummary;
use auction_types::{AuctionOutcome, EncryptedBid, Payout};

pub use auction_client::query::{
    AuctionRpc, BlockInfo, CancelResponse, CreateAuctionRequest, CreateAuctionResponse,
    EncryptedBidRpc, FinalizeResponse, GenesisConfigRpc, OutcomeRpc, PayoutRpc, PlaceBidRequest,
    PlaceBidResponse, WinnerRpc,
};

pub fn auction_to_rpc(s: &AuctionSummary) -> AuctionRpc {
    AuctionRpc {
        auction_id: s.auction_id,
        creator: hex::encode(s.creator),
        asset_symbol: s.asset.symbol.clone(),
        asset_name: s.asset.name.clone(),
        total_supply: s.total_supply,
        winner_count: s.winner_count,
        strategy: s.strategy.to_string(),
        status: s.status.as_str().to_string(),
        start_time: s.start_time,
        end_time: s.end_time,
        created_at: s.created_at,
        num_bids: s.num_bids as u64,
        escrow_balance: s.escrow_balance,
    }
}

pub fn bid_to_rpc(b: &EncryptedBid) -> EncryptedBidRpc {
    EncryptedBidRpc {
        bidder: hex::encode(b.bidder),
        payload: hex::encode(&b.payload),
        payment_amount: b.payment_amount,
        submitted_at: b.submitted_at,
    }
}

pub fn payout_to_rpc(p: &Payout) -> PayoutRpc {
    PayoutRpc {
        recipient: hex::encode(p.recipient),
        amount: p.amount,
        origin_index: p.origin_index as u64,
    }
}

pub fn outcome_to_rpc(o: &AuctionOutcome) -> OutcomeRpc {
    OutcomeRpc {
        auction_id: o.auction_id,
        strategy: o.strategy.to_string(),
        winners: o
            .winners
            .iter()
            .map(|w| WinnerRpc {
                bidder: hex::encode(w.bidder),
                origin_index: w.origin_index as u64,
                amount: w.amount,
                share: w.share,
            })
            .collect(),
        share_per_winner: o.share_per_winner,
        undistributed_remainder: o.undistributed_remainder,
        remainder_to_creator: o.remainder_to_creator,
        total_refunded: o.total_refunded,
        seed: hex::encode(o.seed),
        bids_digest: hex::encode(o.bids_digest),
        finalized_at: o.finalized_at,
        finalized_by: hex::encode(o.finalized_by),
    }
}
