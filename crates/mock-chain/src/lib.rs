//! Mock chain for local testing of the sealed-bid auction system.
//!
//! This provides a JSON-RPC server that simulates on-chain state management
//! for the auction module without requiring a real blockchain. The chain owns
//! the clock, native balances used for escrow, the asset ledger the mint
//! capabilities write into, and capabilities handed back by cancellation.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use auction_client::parse_address;
use auction_client::query::INSUFFICIENT_FUNDS_CODE;
use auction_module::handlers::{self, CreateAuctionParams};
use auction_module::{
    queries, AssetLedger, AuctionCall, AuctionError, AuctionGenesisConfig,
    AuctionState as ModuleState, CallContext, LedgerMint, MintCapability, SharedAssetLedger,
};
use auction_types::{Address, AssetDescriptor, EventRecord, Payout, SelectionStrategy};
use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::error::{INTERNAL_ERROR_CODE, INVALID_PARAMS_CODE};
use jsonrpsee::types::ErrorObjectOwned;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info};

pub mod types;
use types::*;

/// Milliseconds added per simulated block.
pub const BLOCK_TIME_MS: u64 = 12_000;

/// Largest page `query_getEvents` returns.
pub const MAX_EVENTS_PAGE: u64 = 1_000;

/// Capabilities handed back by cancellation, keyed by creator and asset symbol.
type Treasury = HashMap<(Address, String), Vec<Box<dyn MintCapability>>>;

#[derive(Debug, Clone, Copy, Default)]
struct ChainClock {
    height: u64,
    timestamp: u64,
}

fn auction_error(e: AuctionError) -> ErrorObjectOwned {
    if e.is_fatal() {
        error!(error = %e, "Auction ledger invariant violated");
    } else {
        debug!(error = %e, "Auction call rejected");
    }
    ErrorObjectOwned::owned(e.code(), e.to_string(), None::<()>)
}

fn invalid_params(msg: impl Into<String>) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(INVALID_PARAMS_CODE, msg.into(), None::<()>)
}

fn address_param(s: &str) -> RpcResult<Address> {
    parse_address(s).map_err(|e| invalid_params(e.to_string()))
}

/// Shared chain state.
pub struct ChainState {
    /// Module state
    module: ModuleState,
    /// Native balances; escrow payments are debited from here
    balances: Mutex<HashMap<Address, u64>>,
    /// Balances of auctioned assets
    assets: SharedAssetLedger,
    treasury: Mutex<Treasury>,
    clock: RwLock<ChainClock>,
}

impl ChainState {
    pub fn new(genesis: AuctionGenesisConfig) -> Self {
        Self {
            module: ModuleState::new(genesis),
            balances: Mutex::new(HashMap::new()),
            assets: Arc::new(RwLock::new(AssetLedger::new())),
            treasury: Mutex::new(HashMap::new()),
            clock: RwLock::new(ChainClock::default()),
        }
    }

    pub fn module(&self) -> &ModuleState {
        &self.module
    }

    pub fn block_info(&self) -> BlockInfo {
        let clock = *self.clock.read();
        BlockInfo {
            height: clock.height,
            timestamp: clock.timestamp,
        }
    }

    pub fn advance_block(&self) -> BlockInfo {
        {
            let mut clock = self.clock.write();
            clock.height += 1;
            clock.timestamp += BLOCK_TIME_MS;
        }
        self.block_info()
    }

    pub fn set_timestamp(&self, timestamp: u64) {
        self.clock.write().timestamp = timestamp;
    }

    /// Context for `call` sent by `sender` in the current block.
    fn context(&self, sender: Address, call: &AuctionCall) -> RpcResult<CallContext> {
        let clock = *self.clock.read();
        let tx_digest = call.compute_tx_digest(&sender, clock.height).map_err(|e| {
            error!(error = %e, "Failed to encode call");
            ErrorObjectOwned::owned(INTERNAL_ERROR_CODE, format!("Call encoding: {e}"), None::<()>)
        })?;
        debug!(
            auction_id = ?call.auction_id(),
            height = clock.height,
            tx_digest = %hex::encode(tx_digest),
            "Executing call"
        );
        Ok(CallContext::new(sender, clock.height, clock.timestamp).with_tx_digest(tx_digest))
    }

    pub fn balance(&self, address: &Address) -> u64 {
        self.balances.lock().get(address).copied().unwrap_or(0)
    }

    /// Credit native balance and return the new balance.
    pub fn fund(&self, address: Address, amount: u64) -> u64 {
        let mut balances = self.balances.lock();
        let balance = balances.entry(address).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    fn debit(&self, address: &Address, amount: u64) -> RpcResult<()> {
        let mut balances = self.balances.lock();
        let available = balances.get(address).copied().unwrap_or(0);
        if available < amount {
            return Err(ErrorObjectOwned::owned(
                INSUFFICIENT_FUNDS_CODE,
                format!("Insufficient funds: requested {amount}, available {available}"),
                None::<()>,
            ));
        }
        balances.insert(*address, available - amount);
        Ok(())
    }

    fn credit_refunds(&self, refunds: &[Payout]) {
        let mut balances = self.balances.lock();
        for refund in refunds {
            let balance = balances.entry(refund.recipient).or_insert(0);
            *balance = balance.saturating_add(refund.amount);
        }
    }

    pub fn asset_balance(&self, symbol: &str, holder: &Address) -> u64 {
        self.assets.read().balance_of(symbol, holder)
    }

    /// Number of capabilities `creator` holds back for `symbol`.
    pub fn returned_capabilities(&self, creator: &Address, symbol: &str) -> usize {
        self.treasury
            .lock()
            .get(&(*creator, symbol.to_string()))
            .map_or(0, Vec::len)
    }

    /// A capability for `asset`: one handed back earlier if the creator has
    /// it, otherwise a fresh issuance.
    fn issue_capability(&self, creator: Address, asset: &AssetDescriptor) -> Box<dyn MintCapability> {
        self.treasury
            .lock()
            .get_mut(&(creator, asset.symbol.clone()))
            .and_then(Vec::pop)
            .unwrap_or_else(|| Box::new(LedgerMint::new(asset.clone(), self.assets.clone())))
    }

    pub fn create_auction(&self, request: CreateAuctionRequest) -> RpcResult<CreateAuctionResponse> {
        let sender = address_param(&request.sender)?;
        let strategy: SelectionStrategy = request
            .strategy
            .parse()
            .map_err(|e: auction_types::UnknownStrategy| invalid_params(e.to_string()))?;

        let params = CreateAuctionParams {
            total_supply: request.total_supply,
            winner_count: request.winner_count,
            strategy,
            start_time: request.start_time,
            end_time: request.end_time,
        };
        handlers::validate_create_params(&self.module, &params).map_err(auction_error)?;

        let asset = AssetDescriptor::new(request.asset_symbol, request.asset_name);
        let call = AuctionCall::CreateAuction {
            asset: asset.clone(),
            total_supply: params.total_supply,
            winner_count: params.winner_count,
            strategy,
            start_time: params.start_time,
            end_time: params.end_time,
        };
        let ctx = self.context(sender, &call)?;
        let capability = self.issue_capability(sender, &asset);

        let auction_id = handlers::handle_create_auction(&self.module, &ctx, params, capability)
            .map_err(auction_error)?;

        info!(auction_id, symbol = %asset.symbol, "Created auction");
        Ok(CreateAuctionResponse {
            auction_id,
            tx_digest: hex::encode(ctx.tx_digest),
        })
    }

    pub fn place_bid(&self, request: PlaceBidRequest) -> RpcResult<PlaceBidResponse> {
        let sender = address_param(&request.sender)?;
        let payload = hex::decode(&request.payload)
            .map_err(|e| invalid_params(format!("Invalid payload hex: {e}")))?;

        let call = AuctionCall::PlaceBid {
            auction_id: request.auction_id,
            payload: payload.clone(),
            payment: request.payment,
        };
        let ctx = self.context(sender, &call)?;

        self.debit(&sender, request.payment)?;
        let bid_index = handlers::handle_place_bid(
            &self.module,
            &ctx,
            request.auction_id,
            payload,
            request.payment,
        )
        .map_err(|e| {
            self.fund(sender, request.payment);
            auction_error(e)
        })?;

        info!(
            auction_id = request.auction_id,
            bid_index,
            sender = %request.sender,
            "Bid placed"
        );
        Ok(PlaceBidResponse {
            bid_index,
            tx_digest: hex::encode(ctx.tx_digest),
        })
    }

    pub fn finalize(&self, sender: &str, auction_id: u64) -> RpcResult<FinalizeResponse> {
        let sender = address_param(sender)?;
        let ctx = self.context(sender, &AuctionCall::Finalize { auction_id })?;

        let receipt =
            handlers::handle_finalize(&self.module, &ctx, auction_id).map_err(auction_error)?;
        self.credit_refunds(&receipt.refunds);

        Ok(FinalizeResponse {
            outcome: outcome_to_rpc(&receipt.outcome),
            refunds: receipt.refunds.iter().map(payout_to_rpc).collect(),
            tx_digest: hex::encode(ctx.tx_digest),
        })
    }

    pub fn cancel(&self, sender: &str, auction_id: u64) -> RpcResult<CancelResponse> {
        let sender = address_param(sender)?;
        let ctx = self.context(sender, &AuctionCall::Cancel { auction_id })?;

        let receipt =
            handlers::handle_cancel(&self.module, &ctx, auction_id).map_err(auction_error)?;
        self.credit_refunds(&receipt.refunds);

        let symbol = receipt.capability.asset().symbol.clone();
        self.treasury
            .lock()
            .entry((sender, symbol))
            .or_default()
            .push(receipt.capability);

        info!(auction_id, "Auction cancelled");
        Ok(CancelResponse {
            auction_id,
            refunds: receipt.refunds.iter().map(payout_to_rpc).collect(),
            tx_digest: hex::encode(ctx.tx_digest),
        })
    }

    pub fn active_auctions(&self) -> Vec<auction_module::AuctionSummary> {
        let now = self.clock.read().timestamp;
        queries::get_active_auctions(&self.module, now)
    }

    pub fn finalizable(&self, creator: &Address) -> Vec<u64> {
        let now = self.clock.read().timestamp;
        queries::get_finalizable(&self.module, creator, now)
    }
}

/// RPC API definition for the mock chain.
#[rpc(server)]
pub trait MockChainApi {
    // ============ Admin Methods ============

    /// Reset the chain with a genesis config.
    #[method(name = "admin_init")]
    async fn admin_init(&self, config: GenesisConfigRpc) -> RpcResult<bool>;

    /// Advance the chain by one block.
    #[method(name = "admin_advanceBlock")]
    async fn admin_advance_block(&self) -> RpcResult<BlockInfo>;

    /// Set the current timestamp (for testing time-dependent logic).
    #[method(name = "admin_setTimestamp")]
    async fn admin_set_timestamp(&self, timestamp: u64) -> RpcResult<bool>;

    /// Credit native balance to an address.
    #[method(name = "admin_fund")]
    async fn admin_fund(&self, address: String, amount: u64) -> RpcResult<u64>;

    // ============ Auction Methods ============

    /// Create a new auction.
    #[method(name = "auction_create")]
    async fn auction_create(&self, params: CreateAuctionRequest)
        -> RpcResult<CreateAuctionResponse>;

    /// Submit a sealed bid.
    #[method(name = "auction_placeBid")]
    async fn auction_place_bid(&self, params: PlaceBidRequest) -> RpcResult<PlaceBidResponse>;

    /// Finalize an auction (creator only).
    #[method(name = "auction_finalize")]
    async fn auction_finalize(&self, sender: String, auction_id: u64)
        -> RpcResult<FinalizeResponse>;

    /// Cancel an auction before it starts (creator only).
    #[method(name = "auction_cancel")]
    async fn auction_cancel(&self, sender: String, auction_id: u64) -> RpcResult<CancelResponse>;

    // ============ Query Methods ============

    /// Get current block info.
    #[method(name = "chain_getBlockInfo")]
    async fn chain_get_block_info(&self) -> RpcResult<BlockInfo>;

    /// Get auction by ID.
    #[method(name = "query_getAuction")]
    async fn query_get_auction(&self, auction_id: u64) -> RpcResult<Option<AuctionRpc>>;

    /// List auctions in ID order.
    #[method(name = "query_listAuctions")]
    async fn query_list_auctions(
        &self,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> RpcResult<Vec<AuctionRpc>>;

    /// Auctions accepting bids at the current timestamp.
    #[method(name = "query_getActiveAuctions")]
    async fn query_get_active_auctions(&self) -> RpcResult<Vec<AuctionRpc>>;

    /// Get all bids for an auction.
    #[method(name = "query_getAuctionBids")]
    async fn query_get_auction_bids(
        &self,
        auction_id: u64,
    ) -> RpcResult<Option<Vec<EncryptedBidRpc>>>;

    /// Get the settlement outcome of an auction.
    #[method(name = "query_getOutcome")]
    async fn query_get_outcome(&self, auction_id: u64) -> RpcResult<Option<OutcomeRpc>>;

    /// Native balance of an address.
    #[method(name = "query_getBalance")]
    async fn query_get_balance(&self, address: String) -> RpcResult<u64>;

    /// Asset balance of an address.
    #[method(name = "query_getAssetBalance")]
    async fn query_get_asset_balance(&self, symbol: String, address: String) -> RpcResult<u64>;

    /// Auctions of a creator that can be finalized now.
    #[method(name = "query_getFinalizable")]
    async fn query_get_finalizable(&self, creator: String) -> RpcResult<Vec<u64>>;

    /// Journal events from a cursor.
    #[method(name = "query_getEvents")]
    async fn query_get_events(&self, cursor: u64, limit: Option<u64>)
        -> RpcResult<Vec<EventRecord>>;
}

/// Implementation of the mock chain RPC server.
pub struct MockChainServer {
    genesis: AuctionGenesisConfig,
    state: RwLock<Arc<ChainState>>,
}

impl MockChainServer {
    pub fn new(genesis: AuctionGenesisConfig) -> Self {
        Self {
            state: RwLock::new(Arc::new(ChainState::new(genesis.clone()))),
            genesis,
        }
    }

    /// Current chain. Calls keep the chain they started on even across a reset.
    pub fn chain(&self) -> Arc<ChainState> {
        self.state.read().clone()
    }
}

#[async_trait]
impl MockChainApiServer for MockChainServer {
    async fn admin_init(&self, config: GenesisConfigRpc) -> RpcResult<bool> {
        let genesis = match config.auction {
            Some(value) => {
                let genesis: AuctionGenesisConfig = serde_json::from_value(value)
                    .map_err(|e| invalid_params(format!("Invalid genesis: {e}")))?;
                genesis
                    .validate()
                    .map_err(|e| invalid_params(e.to_string()))?;
                genesis
            }
            None => self.genesis.clone(),
        };

        let chain = ChainState::new(genesis);
        if let Some(ts) = config.initial_timestamp {
            chain.set_timestamp(ts);
        }
        *self.state.write() = Arc::new(chain);

        info!("Chain initialized");
        Ok(true)
    }

    async fn admin_advance_block(&self) -> RpcResult<BlockInfo> {
        Ok(self.chain().advance_block())
    }

    async fn admin_set_timestamp(&self, timestamp: u64) -> RpcResult<bool> {
        self.chain().set_timestamp(timestamp);
        info!("Timestamp set to {}", timestamp);
        Ok(true)
    }

    async fn admin_fund(&self, address: String, amount: u64) -> RpcResult<u64> {
        let address = address_param(&address)?;
        Ok(self.chain().fund(address, amount))
    }

    async fn auction_create(
        &self,
        params: CreateAuctionRequest,
    ) -> RpcResult<CreateAuctionResponse> {
        self.chain().create_auction(params)
    }

    async fn auction_place_bid(&self, params: PlaceBidRequest) -> RpcResult<PlaceBidResponse> {
        self.chain().place_bid(params)
    }

    async fn auction_finalize(
        &self,
        sender: String,
        auction_id: u64,
    ) -> RpcResult<FinalizeResponse> {
        self.chain().finalize(&sender, auction_id)
    }

    async fn auction_cancel(&self, sender: String, auction_id: u64) -> RpcResult<CancelResponse> {
        self.chain().cancel(&sender, auction_id)
    }

    async fn chain_get_block_info(&self) -> RpcResult<BlockInfo> {
        Ok(self.chain().block_info())
    }

    async fn query_get_auction(&self, auction_id: u64) -> RpcResult<Option<AuctionRpc>> {
        let chain = self.chain();
        Ok(queries::get_auction_summary(chain.module(), auction_id).map(|s| auction_to_rpc(&s)))
    }

    async fn query_list_auctions(
        &self,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> RpcResult<Vec<AuctionRpc>> {
        let chain = self.chain();
        let summaries = queries::get_auction_summaries(
            chain.module(),
            offset.unwrap_or(0) as usize,
            limit.unwrap_or(100) as usize,
        );
        Ok(summaries.iter().map(auction_to_rpc).collect())
    }

    async fn query_get_active_auctions(&self) -> RpcResult<Vec<AuctionRpc>> {
        Ok(self.chain().active_auctions().iter().map(auction_to_rpc).collect())
    }

    async fn query_get_auction_bids(
        &self,
        auction_id: u64,
    ) -> RpcResult<Option<Vec<EncryptedBidRpc>>> {
        let chain = self.chain();
        Ok(queries::get_auction_bids(chain.module(), auction_id)
            .map(|bids| bids.iter().map(bid_to_rpc).collect()))
    }

    async fn query_get_outcome(&self, auction_id: u64) -> RpcResult<Option<OutcomeRpc>> {
        let chain = self.chain();
        Ok(queries::get_outcome(chain.module(), auction_id).map(|o| outcome_to_rpc(&o)))
    }

    async fn query_get_balance(&self, address: String) -> RpcResult<u64> {
        let address = address_param(&address)?;
        Ok(self.chain().balance(&address))
    }

    async fn query_get_asset_balance(&self, symbol: String, address: String) -> RpcResult<u64> {
        let address = address_param(&address)?;
        Ok(self.chain().asset_balance(&symbol, &address))
    }

    async fn query_get_finalizable(&self, creator: String) -> RpcResult<Vec<u64>> {
        let creator = address_param(&creator)?;
        Ok(self.chain().finalizable(&creator))
    }

    async fn query_get_events(
        &self,
        cursor: u64,
        limit: Option<u64>,
    ) -> RpcResult<Vec<EventRecord>> {
        let limit = limit.unwrap_or(MAX_EVENTS_PAGE).min(MAX_EVENTS_PAGE);
        Ok(self.chain().module().events_since(cursor, limit as usize))
    }
}

/// Bind the RPC server and start serving.
pub async fn start_server(
    addr: SocketAddr,
    genesis: AuctionGenesisConfig,
) -> anyhow::Result<(SocketAddr, ServerHandle)> {
    let server = Server::builder().build(addr).await?;
    let local_addr = server.local_addr()?;
    let handle = server.start(MockChainServer::new(genesis).into_rpc());
    info!("Mock chain server listening on {}", local_addr);
    Ok((local_addr, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use auction_client::query::INVARIANT_VIOLATION_CODE;

    const CREATOR: Address = [1u8; 32];

    fn addr(a: &Address) -> String {
        hex::encode(a)
    }

    fn bidder(n: u8) -> Address {
        [10 + n; 32]
    }

    fn create(chain: &ChainState, start_time: u64, end_time: u64) -> u64 {
        chain
            .create_auction(CreateAuctionRequest {
                sender: addr(&CREATOR),
                asset_symbol: "LOT".into(),
                asset_name: "Lot token".into(),
                total_supply: 10,
                winner_count: 2,
                strategy: "highest_n".into(),
                start_time,
                end_time,
            })
            .unwrap()
            .auction_id
    }

    fn bid(chain: &ChainState, n: u8, auction_id: u64, amount: &str, payment: u64) -> RpcResult<PlaceBidResponse> {
        chain.place_bid(PlaceBidRequest {
            sender: addr(&bidder(n)),
            auction_id,
            payload: hex::encode(amount),
            payment,
        })
    }

    #[test]
    fn test_error_codes_match_client() {
        assert_eq!(
            AuctionError::InvariantViolation(String::new()).code(),
            INVARIANT_VIOLATION_CODE
        );
        let err = auction_error(AuctionError::Unauthorized);
        assert_eq!(err.code(), 4006);
    }

    #[test]
    fn test_finalize_refunds_escrow_to_bank() {
        let chain = ChainState::new(AuctionGenesisConfig::default());
        let auction_id = create(&chain, 0, 1000);
        for n in 0..3 {
            chain.fund(bidder(n), 50);
        }

        bid(&chain, 0, auction_id, "100", 20).unwrap();
        bid(&chain, 1, auction_id, "300", 30).unwrap();
        bid(&chain, 2, auction_id, "200", 40).unwrap();
        assert_eq!(chain.balance(&bidder(1)), 20);

        let early = chain.finalize(&addr(&CREATOR), auction_id).unwrap_err();
        assert_eq!(early.code(), AuctionError::NotYetFinalizable.code());

        chain.set_timestamp(1000);
        assert_eq!(chain.finalizable(&CREATOR), vec![auction_id]);
        let response = chain.finalize(&addr(&CREATOR), auction_id).unwrap();

        assert_eq!(response.outcome.winners.len(), 2);
        assert_eq!(response.outcome.winners[0].origin_index, 1);
        assert_eq!(response.outcome.winners[1].origin_index, 2);
        for n in 0..3 {
            assert_eq!(chain.balance(&bidder(n)), 50);
        }
        assert_eq!(chain.asset_balance("LOT", &bidder(1)), 5);
        assert_eq!(chain.asset_balance("LOT", &bidder(2)), 5);
        assert_eq!(chain.asset_balance("LOT", &bidder(0)), 0);
        assert!(chain.finalizable(&CREATOR).is_empty());
    }

    #[test]
    fn test_active_auctions_follow_clock() {
        let chain = ChainState::new(AuctionGenesisConfig::default());
        let first = create(&chain, 100, 1000);
        let second = create(&chain, 500, 2000);

        assert!(chain.active_auctions().is_empty());
        chain.set_timestamp(600);
        let active: Vec<u64> = chain.active_auctions().iter().map(|a| a.auction_id).collect();
        assert_eq!(active, vec![first, second]);
        chain.set_timestamp(1000);
        let active: Vec<u64> = chain.active_auctions().iter().map(|a| a.auction_id).collect();
        assert_eq!(active, vec![second]);
    }

    #[test]
    fn test_rejected_bid_keeps_funds() {
        let chain = ChainState::new(AuctionGenesisConfig::default());
        let auction_id = create(&chain, 100, 1000);
        chain.fund(bidder(0), 10);

        let err = bid(&chain, 0, auction_id, "5", 10).unwrap_err();
        assert_eq!(err.code(), AuctionError::NotStarted.code());
        assert_eq!(chain.balance(&bidder(0)), 10);

        chain.set_timestamp(100);
        let err = bid(&chain, 0, auction_id, "5", 11).unwrap_err();
        assert_eq!(err.code(), INSUFFICIENT_FUNDS_CODE);
        assert_eq!(chain.balance(&bidder(0)), 10);
    }

    #[test]
    fn test_cancel_returns_capability_for_reuse() {
        let chain = ChainState::new(AuctionGenesisConfig::default());
        chain.set_timestamp(10);
        let auction_id = create(&chain, 100, 1000);

        chain.cancel(&addr(&CREATOR), auction_id).unwrap();
        assert_eq!(chain.returned_capabilities(&CREATOR, "LOT"), 1);
        assert!(queries::get_auction_summary(chain.module(), auction_id).is_none());

        create(&chain, 100, 1000);
        assert_eq!(chain.returned_capabilities(&CREATOR, "LOT"), 0);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let chain = ChainState::new(AuctionGenesisConfig::default());
        let result = chain.create_auction(CreateAuctionRequest {
            sender: addr(&CREATOR),
            asset_symbol: "LOT".into(),
            asset_name: "Lot".into(),
            total_supply: 10,
            winner_count: 1,
            strategy: "vickrey".into(),
            start_time: 0,
            end_time: 10,
        });
        assert_eq!(result.unwrap_err().code(), INVALID_PARAMS_CODE);

        let result = chain.finalize("not-hex", 1);
        assert_eq!(result.unwrap_err().code(), INVALID_PARAMS_CODE);
    }

    #[test]
    fn test_tx_digest_changes_with_height() {
        let chain = ChainState::new(AuctionGenesisConfig::default());
        let call = AuctionCall::Finalize { auction_id: 1 };

        let first = chain.context(CREATOR, &call).unwrap().tx_digest;
        chain.advance_block();
        let second = chain.context(CREATOR, &call).unwrap().tx_digest;
        assert_ne!(first, second);
        assert_eq!(chain.block_info().timestamp, BLOCK_TIME_MS);
    }

    #[test]
    fn test_random_n_winners_ignore_finalize_height() {
        let draw = |delay_blocks: u64| {
            let chain = ChainState::new(AuctionGenesisConfig::default());
            let auction_id = chain
                .create_auction(CreateAuctionRequest {
                    sender: addr(&CREATOR),
                    asset_symbol: "LOT".into(),
                    asset_name: "Lot token".into(),
                    total_supply: 10,
                    winner_count: 1,
                    strategy: "random_n".into(),
                    start_time: 0,
                    end_time: 1000,
                })
                .unwrap()
                .auction_id;
            for n in 0..5 {
                chain.fund(bidder(n), 10);
                bid(&chain, n, auction_id, &format!("{}", 10 * (n + 1)), 10).unwrap();
            }
            chain.set_timestamp(1000);
            for _ in 0..delay_blocks {
                chain.advance_block();
            }
            let response = chain.finalize(&addr(&CREATOR), auction_id).unwrap();
            (response.outcome.winners[0].origin_index, response.tx_digest)
        };

        let (winner, tx_digest) = draw(0);
        for delay_blocks in 1..20 {
            let (later_winner, later_digest) = draw(delay_blocks);
            assert_eq!(later_winner, winner);
            assert_ne!(later_digest, tx_digest);
        }
    }
}
