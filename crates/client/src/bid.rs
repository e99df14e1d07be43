//! Bid creation and sealing.

use thiserror::Error;

/// Errors that can occur during bid creation.
#[derive(Debug, Error)]
pub enum BidError {
    #[error("Escrow payment must be positive")]
    ZeroPayment,

    #[error("Sealing failed: {0}")]
    SealingFailed(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// Turns a bid amount into the opaque payload stored on chain.
///
/// The settlement engine reads revealed payloads as base-10 ASCII, so whatever
/// a sealer produces must open to the decimal digits of the amount.
pub trait BidSealer {
    fn seal(&self, auction_id: u64, amount: u64) -> Result<Vec<u8>, BidError>;
}

/// Sealer that stores the decimal amount as-is.
///
/// For local chains and tests where payload confidentiality is not needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextSealer;

impl BidSealer for PlaintextSealer {
    fn seal(&self, _auction_id: u64, amount: u64) -> Result<Vec<u8>, BidError> {
        Ok(amount.to_string().into_bytes())
    }
}

/// A prepared bid ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBid {
    pub auction_id: u64,
    /// Sealed amount
    pub payload: Vec<u8>,
    /// Escrow posted with the bid, refunded at settlement
    pub payment: u64,
    /// Original bid value (keep secret)
    pub amount: u64,
}

impl PreparedBid {
    /// Payload in the hex form the RPC expects.
    pub fn payload_hex(&self) -> String {
        hex::encode(&self.payload)
    }
}

/// Create a sealed bid for an auction.
pub fn create_bid<S: BidSealer + ?Sized>(
    sealer: &S,
    auction_id: u64,
    amount: u64,
    payment: u64,
) -> Result<PreparedBid, BidError> {
    if payment == 0 {
        return Err(BidError::ZeroPayment);
    }
    let payload = sealer.seal(auction_id, amount)?;
    Ok(PreparedBid {
        auction_id,
        payload,
        payment,
        amount,
    })
}
