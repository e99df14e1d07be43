//! Auction module for sealed-bid settlement auctions.
//!
//! This module implements the state-changing logic for sealed-bid auctions:
//!
//! - Auction creation against a borrowed mint capability
//! - Sealed bid submission with pooled escrow
//! - Creator-triggered finalization behind the time-lock reveal gate
//! - Even supply distribution and full escrow refunds
//! - Cancellation before the bidding window opens
//!
//! # Architecture
//!
//! - `call`: Message types for state-changing operations
//! - `handlers`: Business logic for processing calls
//! - `queries`: Read-only state access
//! - `state`: Per-auction records, the registry and the event journal
//! - `escrow`: Pooled escrow balance
//! - `mint`: Issuance capability boundary
//! - `lifecycle`: Transition guards
//! - `settlement`: Distribution and refunds
//! - `genesis`: Initial configuration
//! - `error`: Error types
//!
//! # Example
//!
//! ```ignore
//! use auction_module::{handlers, AuctionState};
//!
//! let state = AuctionState::default();
//! let ctx = handlers::CallContext::new(creator, height, now);
//!
//! // Create an auction
//! let auction_id = handlers::handle_create_auction(&state, &ctx, params, capability)?;
//!
//! // Submit a bid
//! handlers::handle_place_bid(&state, &bid_ctx, auction_id, payload, payment)?;
//! ```

pub mod call;
pub mod error;
pub mod escrow;
pub mod genesis;
pub mod handlers;
pub mod lifecycle;
pub mod mint;
pub mod queries;
pub mod settlement;
pub mod state;

pub use call::AuctionCall;
pub use error::AuctionError;
pub use escrow::{EscrowError, EscrowPool};
pub use genesis::{
    AuctionGenesisConfig, DefaultAuctionParams, DistributionConfig, RemainderPolicy, RevealConfig,
};
pub use handlers::{CallContext, CancelReceipt, CreateAuctionParams, HandlerResult};
pub use mint::{AssetLedger, LedgerMint, MintCapability, SharedAssetLedger};
pub use queries::AuctionSummary;
pub use settlement::{MintOrder, PendingIssuance, SettlementReceipt};
pub use state::AuctionState;
