//! Client SDK for sealed-bid settlement auctions.
//!
//! This crate provides a high-level API for:
//! - Sealing bid amounts into opaque payloads
//! - Submitting calls to the mock chain over JSON-RPC
//! - Querying auctions, outcomes, balances and events

use auction_types::Address;

pub mod bid;
pub mod query;

pub use bid::{create_bid, BidError, BidSealer, PlaintextSealer, PreparedBid};
pub use query::{AuctionRpcClient, RpcError};

/// Parse a hex address, with or without `0x`. Exactly 32 bytes are required.
pub fn parse_address(s: &str) -> Result<Address, BidError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| BidError::InvalidAddress(format!("{s}: {e}")))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| BidError::InvalidAddress(format!("{s}: {} bytes, expected 32", b.len())))
}

/// Hex form used on the wire.
pub fn format_address(address: &Address) -> String {
    hex::encode(address)
}
