//! End-to-end integration tests for the sealed-bid auction system.
//!
//! These tests exercise the full auction lifecycle:
//! 1. Auction creation against a mint capability
//! 2. Sealed bid submission with escrow
//! 3. Reveal and winner selection after the deadline
//! 4. Settlement: minting and refunds
//! 5. The same flow over JSON-RPC with the keeper finalizing

use std::sync::Arc;

use auction_client::query::{CreateAuctionRequest, PlaceBidRequest};
use auction_client::{create_bid, AuctionRpcClient, PlaintextSealer};
use auction_keeper::{FinalizationKeeper, KeeperConfig};
use auction_module::handlers::{
    handle_cancel, handle_create_auction, handle_finalize, handle_place_bid, CreateAuctionParams,
};
use auction_module::{
    queries, AssetLedger, AuctionError, AuctionGenesisConfig, AuctionState, CallContext,
    LedgerMint, RemainderPolicy, SharedAssetLedger, SettlementReceipt,
};
use auction_selection::{parse_bid_amount, truncating_mean};
use auction_types::{Address, AssetDescriptor, AuctionEvent, AuctionStatus, SelectionStrategy};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CREATOR: Address = [0xc0; 32];
const START: u64 = 1_000;
const END: u64 = 2_000;

fn bidder(n: usize) -> Address {
    let mut address = [0u8; 32];
    address[..8].copy_from_slice(&(n as u64 + 1).to_be_bytes());
    address
}

struct Harness {
    state: AuctionState,
    ledger: SharedAssetLedger,
}

impl Harness {
    fn new(config: AuctionGenesisConfig) -> Self {
        Self {
            state: AuctionState::new(config),
            ledger: Arc::new(RwLock::new(AssetLedger::new())),
        }
    }

    fn create(&self, strategy: SelectionStrategy, total_supply: u64, winner_count: u64) -> u64 {
        handle_create_auction(
            &self.state,
            &CallContext::new(CREATOR, 1, 0),
            CreateAuctionParams {
                total_supply,
                winner_count,
                strategy,
                start_time: START,
                end_time: END,
            },
            Box::new(LedgerMint::new(
                AssetDescriptor::new("LOT", "Lot token"),
                self.ledger.clone(),
            )),
        )
        .unwrap()
    }

    fn bid(&self, auction_id: u64, n: usize, amount: u64, payment: u64) {
        let prepared = create_bid(&PlaintextSealer, auction_id, amount, payment).unwrap();
        handle_place_bid(
            &self.state,
            &CallContext::new(bidder(n), 2, START + n as u64),
            auction_id,
            prepared.payload,
            prepared.payment,
        )
        .unwrap();
    }

    fn finalize(&self, auction_id: u64, tx_digest: [u8; 32]) -> Result<SettlementReceipt, AuctionError> {
        let ctx = CallContext::new(CREATOR, 3, END).with_tx_digest(tx_digest);
        handle_finalize(&self.state, &ctx, auction_id)
    }
}

/// Test the complete auction flow with in-memory components.
#[test]
fn test_full_auction_flow() {
    let harness = Harness::new(AuctionGenesisConfig::default());
    let auction_id = harness.create(SelectionStrategy::HighestN, 10, 2);

    for (n, amount) in [100, 300, 300, 50].into_iter().enumerate() {
        harness.bid(auction_id, n, amount, 25);
    }

    // Too early, and only for the creator.
    let early = handle_finalize(&harness.state, &CallContext::new(CREATOR, 3, END - 1), auction_id);
    assert_eq!(early.unwrap_err(), AuctionError::NotYetFinalizable);

    let receipt = harness.finalize(auction_id, [0u8; 32]).unwrap();
    let winners: Vec<usize> = receipt.outcome.winners.iter().map(|w| w.origin_index).collect();
    assert_eq!(winners, vec![1, 2]);
    assert_eq!(receipt.outcome.share_per_winner, 5);
    assert_eq!(receipt.outcome.total_refunded, 100);

    let ledger = harness.ledger.read();
    assert_eq!(ledger.balance_of("LOT", &bidder(1)), 5);
    assert_eq!(ledger.balance_of("LOT", &bidder(2)), 5);
    assert_eq!(ledger.total_minted("LOT"), 10);
    drop(ledger);

    // Terminal: nothing more is accepted.
    assert_eq!(
        harness.finalize(auction_id, [0u8; 32]).unwrap_err(),
        AuctionError::AlreadyFinalized
    );
    let late = handle_place_bid(
        &harness.state,
        &CallContext::new(bidder(9), 4, START),
        auction_id,
        b"1".to_vec(),
        1,
    );
    assert_eq!(late.unwrap_err(), AuctionError::AlreadyFinalized);

    let kinds: Vec<&str> = harness
        .state
        .events_since(0, 100)
        .iter()
        .map(|r| r.event.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "auction_created",
            "bid_placed",
            "bid_placed",
            "bid_placed",
            "bid_placed",
            "auction_finalized"
        ]
    );
}

/// Escrow collected always equals escrow refunded, and supply minted matches
/// the even split, across strategies and random bid sets.
#[test]
fn test_escrow_conservation_randomized() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let strategies = [
        SelectionStrategy::HighestN,
        SelectionStrategy::RandomN,
        SelectionStrategy::ClosestToMeanN,
    ];

    for round in 0..60 {
        let mut config = AuctionGenesisConfig::default();
        if round % 2 == 1 {
            config.distribution.remainder = RemainderPolicy::ToCreator;
        }
        let harness = Harness::new(config);
        let strategy = strategies[round % strategies.len()];
        let total_supply = rng.gen_range(1..10_000u64);
        let winner_count = rng.gen_range(1..8u64);
        let auction_id = harness.create(strategy, total_supply, winner_count);

        let bid_count = rng.gen_range(0..20usize);
        let mut paid = 0u64;
        for n in 0..bid_count {
            let payment = rng.gen_range(1..1_000u64);
            paid += payment;
            harness.bid(auction_id, n, rng.gen_range(0..500u64), payment);
        }

        let mut tx_digest = [0u8; 32];
        rng.fill(&mut tx_digest[..]);
        let receipt = harness.finalize(auction_id, tx_digest).unwrap();
        let outcome = &receipt.outcome;

        let refunded: u64 = receipt.refunds.iter().map(|r| r.amount).sum();
        assert_eq!(refunded, paid);
        assert_eq!(outcome.total_refunded, paid);
        assert_eq!(receipt.refunds.len(), bid_count);

        let expected_winners = (winner_count as usize).min(bid_count);
        assert_eq!(outcome.winners.len(), expected_winners);

        let minted = harness.ledger.read().total_minted("LOT");
        if expected_winners == 0 {
            assert_eq!(minted, 0);
        } else {
            assert_eq!(
                minted,
                outcome.share_per_winner * expected_winners as u64 + outcome.remainder_to_creator
            );
            assert_eq!(
                minted + outcome.undistributed_remainder,
                total_supply,
                "round {round}"
            );
        }

        let auction = harness.state.get_auction(auction_id).unwrap();
        let entry = auction.lock();
        assert_eq!(entry.escrow.balance(), 0);
        assert_eq!(entry.escrow.total_collected(), entry.escrow.total_released());
    }
}

#[test]
fn test_highest_n_winners_dominate_losers() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..30 {
        let harness = Harness::new(AuctionGenesisConfig::default());
        let winner_count = rng.gen_range(1..6u64);
        let auction_id = harness.create(SelectionStrategy::HighestN, 100, winner_count);

        let amounts: Vec<u64> = (0..rng.gen_range(1..15)).map(|_| rng.gen_range(0..50)).collect();
        for (n, &amount) in amounts.iter().enumerate() {
            harness.bid(auction_id, n, amount, 1);
        }

        let outcome = harness.finalize(auction_id, [1u8; 32]).unwrap().outcome;
        let chosen: Vec<usize> = outcome.winners.iter().map(|w| w.origin_index).collect();
        let lowest_winner = outcome.winners.iter().map(|w| w.amount).min().unwrap_or(0);

        for (index, &amount) in amounts.iter().enumerate() {
            if chosen.contains(&index) {
                continue;
            }
            assert!(amount <= lowest_winner);
            // Equal amounts only lose to earlier bids.
            if amount == lowest_winner {
                assert!(outcome
                    .winners
                    .iter()
                    .filter(|w| w.amount == amount)
                    .all(|w| w.origin_index < index));
            }
        }
    }
}

#[test]
fn test_closest_to_mean_winners_are_nearest() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..30 {
        let harness = Harness::new(AuctionGenesisConfig::default());
        let winner_count = rng.gen_range(1..5u64);
        let auction_id = harness.create(SelectionStrategy::ClosestToMeanN, 100, winner_count);

        let amounts: Vec<u64> = (0..rng.gen_range(1..12)).map(|_| rng.gen_range(0..1_000)).collect();
        for (n, &amount) in amounts.iter().enumerate() {
            harness.bid(auction_id, n, amount, 1);
        }

        let mean = truncating_mean(
            &amounts
                .iter()
                .enumerate()
                .map(|(origin_index, &amount)| auction_types::RevealedBid {
                    bidder: bidder(origin_index),
                    amount,
                    payment_amount: 1,
                    origin_index,
                    malformed: false,
                })
                .collect::<Vec<_>>(),
        );

        let outcome = harness.finalize(auction_id, [2u8; 32]).unwrap().outcome;
        let chosen: Vec<usize> = outcome.winners.iter().map(|w| w.origin_index).collect();
        let farthest_winner = outcome
            .winners
            .iter()
            .map(|w| w.amount.abs_diff(mean))
            .max()
            .unwrap_or(0);

        for (index, &amount) in amounts.iter().enumerate() {
            if !chosen.contains(&index) {
                assert!(amount.abs_diff(mean) >= farthest_winner);
            }
        }
    }
}

#[test]
fn test_random_n_is_reproducible_from_public_inputs() {
    let run = |tx_digest: [u8; 32]| {
        let harness = Harness::new(AuctionGenesisConfig::default());
        let auction_id = harness.create(SelectionStrategy::RandomN, 90, 3);
        for n in 0..9 {
            harness.bid(auction_id, n, 10 * n as u64, 5);
        }
        harness.finalize(auction_id, tx_digest).unwrap().outcome
    };

    let a = run([42u8; 32]);
    let mut indices: Vec<usize> = a.winners.iter().map(|w| w.origin_index).collect();
    indices.sort_unstable();
    indices.dedup();
    assert_eq!(indices.len(), 3);

    // A different finalize transaction draws the same winners.
    let b = run([43u8; 32]);
    assert_eq!(a.winners, b.winners);
    assert_eq!(a.seed, b.seed);

    // Anyone can recompute the seed from the published inputs.
    assert_eq!(
        a.seed,
        auction_types::compute_finalize_seed(1, END, &a.bids_digest)
    );
}

#[test]
fn test_window_boundary() {
    let harness = Harness::new(AuctionGenesisConfig::default());
    let auction_id = harness.create(SelectionStrategy::HighestN, 10, 1);
    let place_at = |now: u64| {
        handle_place_bid(
            &harness.state,
            &CallContext::new(bidder(0), 1, now),
            auction_id,
            b"9".to_vec(),
            1,
        )
    };

    assert_eq!(place_at(START - 1), Err(AuctionError::NotStarted));
    assert_eq!(place_at(START), Ok(0));
    assert_eq!(place_at(END - 1), Ok(1));
    assert_eq!(place_at(END), Err(AuctionError::Ended));

    let summary = queries::get_auction_summary(&harness.state, auction_id).unwrap();
    assert_eq!(summary.num_bids, 2);
    assert_eq!(summary.escrow_balance, 2);
}

#[test]
fn test_cancellation_before_start() {
    let harness = Harness::new(AuctionGenesisConfig::default());
    let auction_id = harness.create(SelectionStrategy::HighestN, 10, 1);

    let stranger = handle_cancel(&harness.state, &CallContext::new(bidder(0), 1, 0), auction_id);
    assert_eq!(stranger.unwrap_err(), AuctionError::Unauthorized);

    let receipt = handle_cancel(&harness.state, &CallContext::new(CREATOR, 1, 0), auction_id).unwrap();
    assert_eq!(receipt.capability.asset().symbol, "LOT");
    assert!(queries::get_auction_summary(&harness.state, auction_id).is_none());
    assert_eq!(
        harness.finalize(auction_id, [0u8; 32]).unwrap_err(),
        AuctionError::AuctionNotFound(auction_id)
    );

    let last = harness.state.events_since(0, 10).pop().unwrap();
    assert!(matches!(
        last.event,
        AuctionEvent::AuctionCancelled { refunded: 0, .. }
    ));

    // Once the window opens, cancellation is closed.
    let second = harness.create(SelectionStrategy::HighestN, 10, 1);
    let started = handle_cancel(&harness.state, &CallContext::new(CREATOR, 1, START), second);
    assert_eq!(started.unwrap_err(), AuctionError::AlreadyStarted);
}

#[test]
fn test_concurrent_bidders_across_auctions() {
    let harness = Arc::new(Harness::new(AuctionGenesisConfig::default()));
    let auctions: Vec<u64> = (0..4)
        .map(|_| harness.create(SelectionStrategy::HighestN, 100, 3))
        .collect();

    let workers: Vec<_> = (0..8usize)
        .map(|n| {
            let harness = Arc::clone(&harness);
            let auctions = auctions.clone();
            std::thread::spawn(move || {
                for (i, &auction_id) in auctions.iter().enumerate() {
                    for k in 0..10u64 {
                        harness.bid(auction_id, n, k * (i as u64 + 1), k + 1);
                    }
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    for &auction_id in &auctions {
        let receipt = harness.finalize(auction_id, [3u8; 32]).unwrap();
        assert_eq!(receipt.refunds.len(), 80);
        assert_eq!(receipt.outcome.total_refunded, 8 * (1..=10).sum::<u64>());
        let auction = harness.state.get_auction(auction_id).unwrap();
        assert_eq!(auction.lock().status, AuctionStatus::Finalized);
    }
}

#[test]
fn test_lenient_payload_parse_matches_reveal() {
    assert_eq!(parse_bid_amount(b"1,000").amount, 1000);
    assert!(parse_bid_amount(b"1,000").malformed);

    let harness = Harness::new(AuctionGenesisConfig::default());
    let auction_id = harness.create(SelectionStrategy::HighestN, 10, 1);
    handle_place_bid(
        &harness.state,
        &CallContext::new(bidder(0), 1, START),
        auction_id,
        b"1,000".to_vec(),
        1,
    )
    .unwrap();
    harness.bid(auction_id, 1, 999, 1);

    let outcome = harness.finalize(auction_id, [0u8; 32]).unwrap().outcome;
    assert_eq!(outcome.winners[0].origin_index, 0);
    assert_eq!(outcome.winners[0].amount, 1000);
}

/// The same lifecycle over JSON-RPC, with the keeper finalizing.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rpc_lifecycle_with_keeper() {
    let (addr, handle) = mock_chain::start_server(
        "127.0.0.1:0".parse().unwrap(),
        AuctionGenesisConfig::default(),
    )
    .await
    .unwrap();
    let endpoint = format!("http://{addr}");
    let client = AuctionRpcClient::new(&endpoint).unwrap();

    let creator = hex::encode(CREATOR);
    let bidders: Vec<String> = (0..3).map(|n| hex::encode(bidder(n))).collect();
    for b in &bidders {
        assert_eq!(client.fund(b, 100).await.unwrap(), 100);
    }

    client.set_timestamp(START).await.unwrap();
    let created = client
        .create_auction(CreateAuctionRequest {
            sender: creator.clone(),
            asset_symbol: "LOT".into(),
            asset_name: "Lot token".into(),
            total_supply: 9,
            winner_count: 2,
            strategy: "highest_n".into(),
            start_time: START,
            end_time: END,
        })
        .await
        .unwrap();
    let auction_id = created.auction_id;

    for (n, (amount, payment)) in [(40u64, 10u64), (70, 20), (55, 30)].into_iter().enumerate() {
        let prepared = create_bid(&PlaintextSealer, auction_id, amount, payment).unwrap();
        let response = client
            .place_bid(PlaceBidRequest {
                sender: bidders[n].clone(),
                auction_id,
                payload: prepared.payload_hex(),
                payment,
            })
            .await
            .unwrap();
        assert_eq!(response.bid_index, n as u64);
    }
    assert_eq!(client.get_balance(&bidders[2]).await.unwrap(), 70);
    let active = client.get_active_auctions().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].num_bids, 3);

    let err = client.finalize(&bidders[0], auction_id).await.unwrap_err();
    assert_eq!(err.code(), Some(AuctionError::Unauthorized.code()));
    assert!(!err.is_fatal());

    let mut keeper = FinalizationKeeper::new(KeeperConfig {
        rpc_endpoint: endpoint.clone(),
        creator: creator.clone(),
        ..Default::default()
    })
    .unwrap();

    // Nothing is due before the deadline.
    assert!(keeper.tick().await.unwrap().is_empty());

    client.set_timestamp(END).await.unwrap();
    let report = keeper.tick().await.unwrap();
    assert_eq!(report.finalized, vec![auction_id]);

    let outcome = client.get_outcome(auction_id).await.unwrap().unwrap();
    let winners: Vec<u64> = outcome.winners.iter().map(|w| w.origin_index).collect();
    assert_eq!(winners, vec![1, 2]);
    assert_eq!(outcome.share_per_winner, 4);
    assert_eq!(outcome.undistributed_remainder, 1);

    for b in &bidders {
        assert_eq!(client.get_balance(b).await.unwrap(), 100);
    }
    assert_eq!(client.get_asset_balance("LOT", &bidders[1]).await.unwrap(), 4);
    assert_eq!(client.get_asset_balance("LOT", &bidders[0]).await.unwrap(), 0);

    let auction = client.get_auction(auction_id).await.unwrap().unwrap();
    assert_eq!(auction.status, "finalized");
    assert_eq!(auction.escrow_balance, 0);

    // Already done: the keeper sees nothing further.
    assert!(keeper.tick().await.unwrap().is_empty());

    let events = client.get_events(0, 100).await.unwrap();
    assert_eq!(events.len(), 5);
    assert_eq!(events[4].event.kind(), "auction_finalized");
    assert_eq!(serde_json::to_value(&events[0].event).unwrap()["type"], "auction_created");

    handle.stop().unwrap();
    handle.stopped().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rpc_cancel_and_reinit() {
    let (addr, handle) = mock_chain::start_server(
        "127.0.0.1:0".parse().unwrap(),
        AuctionGenesisConfig::default(),
    )
    .await
    .unwrap();
    let client = AuctionRpcClient::new(&format!("http://{addr}")).unwrap();
    let creator = hex::encode(CREATOR);

    let request = CreateAuctionRequest {
        sender: creator.clone(),
        asset_symbol: "LOT".into(),
        asset_name: "Lot token".into(),
        total_supply: 10,
        winner_count: 1,
        strategy: "random_n".into(),
        start_time: START,
        end_time: END,
    };
    let auction_id = client.create_auction(request.clone()).await.unwrap().auction_id;

    let cancelled = client.cancel(&creator, auction_id).await.unwrap();
    assert!(cancelled.refunds.is_empty());
    assert!(client.get_auction(auction_id).await.unwrap().is_none());

    let err = client.cancel(&creator, auction_id).await.unwrap_err();
    assert_eq!(err.code(), Some(AuctionError::AuctionNotFound(auction_id).code()));

    client
        .init(auction_client::query::GenesisConfigRpc {
            initial_timestamp: Some(5),
            auction: Some(serde_json::json!({ "distribution": { "remainder": "to_creator" } })),
        })
        .await
        .unwrap();
    assert_eq!(client.block_info().await.unwrap().timestamp, 5);
    assert!(client.list_auctions(0, 10).await.unwrap().is_empty());

    let bad = client
        .init(auction_client::query::GenesisConfigRpc {
            initial_timestamp: None,
            auction: Some(serde_json::json!({ "default_params": { "min_duration": 0 } })),
        })
        .await;
    assert!(bad.is_err());

    handle.stop().unwrap();
    handle.stopped().await;
}
