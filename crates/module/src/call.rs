//! Call message types for the auction module.

use auction_types::{sha256, Address, AssetDescriptor, SelectionStrategy};
use borsh::{BorshDeserialize, BorshSerialize};

/// Call messages for the auction module.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum AuctionCall {
    // === Auction Lifecycle ===
    /// Create a new auction. The host attaches the mint capability for `asset`.
    CreateAuction {
        asset: AssetDescriptor,
        total_supply: u64,
        winner_count: u64,
        strategy: SelectionStrategy,
        start_time: u64,
        end_time: u64,
    },

    /// Submit a sealed bid with its escrow payment.
    PlaceBid {
        auction_id: u64,
        payload: Vec<u8>,
        payment: u64,
    },

    /// Reveal, select winners and settle (creator only).
    Finalize { auction_id: u64 },

    /// Withdraw an auction before its window opens (creator only).
    Cancel { auction_id: u64 },
}

impl AuctionCall {
    /// The auction this call targets, if it already exists.
    pub fn auction_id(&self) -> Option<u64> {
        match self {
            AuctionCall::CreateAuction { .. } => None,
            AuctionCall::PlaceBid { auction_id, .. }
            | AuctionCall::Finalize { auction_id }
            | AuctionCall::Cancel { auction_id } => Some(*auction_id),
        }
    }

    /// Digest identifying one submission of this call.
    ///
    /// Covers the borsh encoding of the call, the sender and the block height it
    /// was included at.
    pub fn compute_tx_digest(
        &self,
        sender: &Address,
        block_height: u64,
    ) -> std::io::Result<[u8; 32]> {
        let mut preimage = borsh::to_vec(self)?;
        preimage.extend_from_slice(sender);
        preimage.extend_from_slice(&block_height.to_le_bytes());
        Ok(sha256(&preimage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tx_digest_binds_sender_and_height() {
        let call = AuctionCall::Finalize { auction_id: 4 };
        let digest = call.compute_tx_digest(&[1u8; 32], 10).unwrap();

        assert_eq!(digest, call.compute_tx_digest(&[1u8; 32], 10).unwrap());
        assert_ne!(digest, call.compute_tx_digest(&[2u8; 32], 10).unwrap());
        assert_ne!(digest, call.compute_tx_digest(&[1u8; 32], 11).unwrap());
        assert_ne!(
            digest,
            AuctionCall::Finalize { auction_id: 5 }
                .compute_tx_digest(&[1u8; 32], 10)
                .unwrap()
        );
    }

    #[test]
    fn test_borsh_roundtrip() {
        let call = AuctionCall::PlaceBid {
            auction_id: 1,
            payload: b"250".to_vec(),
            payment: 40,
        };
        let bytes = borsh::to_vec(&call).unwrap();
        assert_eq!(AuctionCall::try_from_slice(&bytes).unwrap(), call);
        assert_eq!(call.auction_id(), Some(1));
    }
}
