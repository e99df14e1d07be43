//! JSON-RPC access to the auction chain.
//!
//! The wire types here are shared with the mock chain server: addresses, seeds
//! and payloads travel as lowercase hex strings.

use auction_types::EventRecord;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code the chain reports for broken ledger invariants.
pub const INVARIANT_VIOLATION_CODE: i32 = 5000;

/// Error code for a transfer the sender cannot cover.
pub const INSUFFICIENT_FUNDS_CODE: i32 = 4100;

/// Errors from an RPC call.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Chain rejected call ({code}): {message}")]
    Rejected { code: i32, message: String },

    #[error("RPC transport error: {0}")]
    Transport(String),
}

impl RpcError {
    pub fn code(&self) -> Option<i32> {
        match self {
            RpcError::Rejected { code, .. } => Some(*code),
            RpcError::Transport(_) => None,
        }
    }

    /// The chain hit a logic defect; retrying will not help.
    pub fn is_fatal(&self) -> bool {
        self.code() == Some(INVARIANT_VIOLATION_CODE)
    }
}

impl From<ClientError> for RpcError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Call(obj) => RpcError::Rejected {
                code: obj.code(),
                message: obj.message().to_string(),
            },
            other => RpcError::Transport(other.to_string()),
        }
    }
}

pub type RpcResult<T> = Result<T, RpcError>;

// ============ Wire types ============

/// Chain initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisConfigRpc {
    pub initial_timestamp: Option<u64>,
    /// Auction module genesis document; defaults apply when absent
    pub auction: Option<serde_json::Value>,
}

/// Block info response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub timestamp: u64,
}

/// Parameters for creating an auction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionRequest {
    pub sender: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub total_supply: u64,
    pub winner_count: u64,
    /// "highest_n", "random_n" or "closest_to_mean_n"
    pub strategy: String,
    pub start_time: u64,
    pub end_time: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAuctionResponse {
    pub auction_id: u64,
    pub tx_digest: String,
}

/// Parameters for placing a bid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidRequest {
    pub sender: String,
    pub auction_id: u64,
    /// Hex-encoded sealed payload
    pub payload: String,
    pub payment: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidResponse {
    pub bid_index: u64,
    pub tx_digest: String,
}

/// Auction summary for RPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionRpc {
    pub auction_id: u64,
    pub creator: String,
    pub asset_symbol: String,
    pub asset_name: String,
    pub total_supply: u64,
    pub winner_count: u64,
    pub strategy: String,
    /// "open", "finalized" or "cancelled"
    pub status: String,
    pub start_time: u64,
    pub end_time: u64,
    pub created_at: u64,
    pub num_bids: u64,
    pub escrow_balance: u64,
}

/// Sealed bid for RPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBidRpc {
    pub bidder: String,
    pub payload: String,
    pub payment_amount: u64,
    pub submitted_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerRpc {
    pub bidder: String,
    pub origin_index: u64,
    pub amount: u64,
    pub share: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRpc {
    pub recipient: String,
    pub amount: u64,
    pub origin_index: u64,
}

/// Settlement outcome for RPC responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRpc {
    pub auction_id: u64,
    pub strategy: String,
    pub winners: Vec<WinnerRpc>,
    pub share_per_winner: u64,
    pub undistributed_remainder: u64,
    pub remainder_to_creator: u64,
    pub total_refunded: u64,
    pub seed: String,
    pub bids_digest: String,
    pub finalized_at: u64,
    pub finalized_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub outcome: OutcomeRpc,
    pub refunds: Vec<PayoutRpc>,
    pub tx_digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub auction_id: u64,
    pub refunds: Vec<PayoutRpc>,
    pub tx_digest: String,
}

// ============ Client ============

/// Typed client for the auction chain RPC.
#[derive(Debug, Clone)]
pub struct AuctionRpcClient {
    inner: HttpClient,
}

impl AuctionRpcClient {
    /// Connect to an HTTP JSON-RPC endpoint.
    pub fn new(endpoint: &str) -> RpcResult<Self> {
        let inner = HttpClientBuilder::default().build(endpoint)?;
        Ok(Self { inner })
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: ArrayParams) -> RpcResult<R> {
        Ok(self.inner.request(method, params).await?)
    }

    // ============ Admin ============

    pub async fn init(&self, config: GenesisConfigRpc) -> RpcResult<bool> {
        self.call("admin_init", rpc_params![config]).await
    }

    pub async fn advance_block(&self) -> RpcResult<BlockInfo> {
        self.call("admin_advanceBlock", rpc_params![]).await
    }

    pub async fn set_timestamp(&self, timestamp: u64) -> RpcResult<bool> {
        self.call("admin_setTimestamp", rpc_params![timestamp]).await
    }

    /// Credit native balance; returns the new balance.
    pub async fn fund(&self, address: &str, amount: u64) -> RpcResult<u64> {
        self.call("admin_fund", rpc_params![address, amount]).await
    }

    // ============ Auction calls ============

    pub async fn create_auction(
        &self,
        request: CreateAuctionRequest,
    ) -> RpcResult<CreateAuctionResponse> {
        self.call("auction_create", rpc_params![request]).await
    }

    pub async fn place_bid(&self, request: PlaceBidRequest) -> RpcResult<PlaceBidResponse> {
        self.call("auction_placeBid", rpc_params![request]).await
    }

    pub async fn finalize(&self, sender: &str, auction_id: u64) -> RpcResult<FinalizeResponse> {
        self.call("auction_finalize", rpc_params![sender, auction_id])
            .await
    }

    pub async fn cancel(&self, sender: &str, auction_id: u64) -> RpcResult<CancelResponse> {
        self.call("auction_cancel", rpc_params![sender, auction_id])
            .await
    }

    // ============ Queries ============

    pub async fn block_info(&self) -> RpcResult<BlockInfo> {
        self.call("chain_getBlockInfo", rpc_params![]).await
    }

    pub async fn get_auction(&self, auction_id: u64) -> RpcResult<Option<AuctionRpc>> {
        self.call("query_getAuction", rpc_params![auction_id]).await
    }

    /// Auctions accepting bids right now.
    pub async fn get_active_auctions(&self) -> RpcResult<Vec<AuctionRpc>> {
        self.call("query_getActiveAuctions", rpc_params![]).await
    }

    pub async fn list_auctions(&self, offset: u64, limit: u64) -> RpcResult<Vec<AuctionRpc>> {
        self.call("query_listAuctions", rpc_params![offset, limit])
            .await
    }

    pub async fn get_auction_bids(
        &self,
        auction_id: u64,
    ) -> RpcResult<Option<Vec<EncryptedBidRpc>>> {
        self.call("query_getAuctionBids", rpc_params![auction_id])
            .await
    }

    pub async fn get_outcome(&self, auction_id: u64) -> RpcResult<Option<OutcomeRpc>> {
        self.call("query_getOutcome", rpc_params![auction_id]).await
    }

    pub async fn get_balance(&self, address: &str) -> RpcResult<u64> {
        self.call("query_getBalance", rpc_params![address]).await
    }

    pub async fn get_asset_balance(&self, symbol: &str, address: &str) -> RpcResult<u64> {
        self.call("query_getAssetBalance", rpc_params![symbol, address])
            .await
    }

    /// Open auctions of `creator` whose reveal gate is open on chain now.
    pub async fn get_finalizable(&self, creator: &str) -> RpcResult<Vec<u64>> {
        self.call("query_getFinalizable", rpc_params![creator]).await
    }

    pub async fn get_events(&self, cursor: u64, limit: u64) -> RpcResult<Vec<EventRecord>> {
        self.call("query_getEvents", rpc_params![cursor, limit])
            .await
    }
}
