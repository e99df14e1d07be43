//! Bid revelation.
//!
//! Payloads are read as base-10 ASCII. Bytes that are not digits are skipped and
//! digits accumulate left to right, so `b"1a2"` reveals as 12 and an empty
//! payload reveals as 0. This matches the legacy settlement behaviour; instead
//! of coercing silently, every bid whose payload needed coercion is flagged as
//! malformed so the caller can decide whether it competes.

use auction_types::{EncryptedBid, RevealedBid};
use tracing::warn;

use crate::error::SelectionError;
use crate::gate::can_reveal;

/// Amount parsed from a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAmount {
    pub amount: u64,
    /// Payload was empty, contained a non-digit byte, or overflowed `u64`
    pub malformed: bool,
}

/// Parse a payload into a bid amount.
///
/// Overflow saturates at `u64::MAX` and marks the amount malformed rather than
/// failing, so one bad payload can never block settlement.
pub fn parse_bid_amount(payload: &[u8]) -> ParsedAmount {
    let mut amount: u64 = 0;
    let mut malformed = payload.is_empty();

    for &byte in payload {
        if !byte.is_ascii_digit() {
            malformed = true;
            continue;
        }
        let digit = u64::from(byte - b'0');
        match amount.checked_mul(10).and_then(|v| v.checked_add(digit)) {
            Some(next) => amount = next,
            None => {
                amount = u64::MAX;
                malformed = true;
            }
        }
    }

    ParsedAmount { amount, malformed }
}

/// Reveal every bid, preserving arrival order.
///
/// No bid is dropped: `reveal(bids).len() == bids.len()` and each result keeps its
/// `origin_index`.
pub fn reveal(bids: &[EncryptedBid]) -> Vec<RevealedBid> {
    bids.iter()
        .enumerate()
        .map(|(origin_index, bid)| {
            let parsed = parse_bid_amount(&bid.payload);
            if parsed.malformed {
                warn!(
                    origin_index,
                    payload_len = bid.payload.len(),
                    amount = parsed.amount,
                    "Malformed bid payload coerced during reveal"
                );
            }
            RevealedBid {
                bidder: bid.bidder,
                amount: parsed.amount,
                payment_amount: bid.payment_amount,
                origin_index,
                malformed: parsed.malformed,
            }
        })
        .collect()
}

/// Reveal bids only once the time-lock gate is open at `now`.
pub fn reveal_gated(
    bids: &[EncryptedBid],
    end_time: u64,
    now: u64,
) -> Result<Vec<RevealedBid>, SelectionError> {
    if !can_reveal(end_time, now) {
        return Err(SelectionError::RevealLocked { end_time, now });
    }
    Ok(reveal(bids))
}
