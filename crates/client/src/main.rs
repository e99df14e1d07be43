//! CLI for interacting with sealed-bid settlement auctions.
//!
//! This binary provides commands for:
//! - Creating, finalizing and cancelling auctions
//! - Submitting sealed bids
//! - Querying auctions, outcomes, balances and events
//! - Driving the mock chain clock

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use auction_client::query::{AuctionRpc, CreateAuctionRequest, PayoutRpc, PlaceBidRequest};
use auction_client::{create_bid, parse_address, AuctionRpcClient, PlaintextSealer};
use auction_types::SelectionStrategy;

#[derive(Parser)]
#[command(name = "auction-cli")]
#[command(about = "CLI for sealed-bid settlement auctions")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new auction
    CreateAuction {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        /// Symbol of the asset being distributed
        #[arg(long)]
        symbol: String,

        /// Display name of the asset
        #[arg(long)]
        name: Option<String>,

        /// Units minted across all winners
        #[arg(long)]
        total_supply: u64,

        /// Maximum number of winners
        #[arg(long)]
        winner_count: u64,

        /// Strategy: highest_n, random_n, or closest_to_mean_n
        #[arg(long, default_value = "highest_n")]
        strategy: String,

        /// Start time (milliseconds)
        #[arg(long)]
        start_time: u64,

        /// End time (milliseconds)
        #[arg(long)]
        end_time: u64,
    },

    /// Submit a sealed bid
    Bid {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,

        /// Bid amount (sealed)
        #[arg(long)]
        amount: u64,

        /// Escrow payment (visible on-chain, refunded at settlement)
        #[arg(long)]
        payment: u64,
    },

    /// Finalize an auction (creator only)
    Finalize {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Cancel an auction before it starts (creator only)
    Cancel {
        /// Sender address (hex)
        #[arg(long)]
        sender: String,

        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Get auction details
    GetAuction {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// List auctions
    ListAuctions {
        #[arg(long, default_value = "0")]
        offset: u64,

        #[arg(long, default_value = "50")]
        limit: u64,
    },

    /// List auctions currently accepting bids
    ListActive,

    /// Get bids for an auction
    GetBids {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Get the settlement outcome of an auction
    GetOutcome {
        /// Auction ID
        #[arg(long)]
        auction_id: u64,
    },

    /// Native balance, or asset balance with --symbol
    Balance {
        /// Address (hex)
        #[arg(long)]
        address: String,

        #[arg(long)]
        symbol: Option<String>,
    },

    /// Credit native balance (for testing)
    Fund {
        /// Address (hex)
        #[arg(long)]
        address: String,

        #[arg(long)]
        amount: u64,
    },

    /// Print journal events
    Events {
        #[arg(long, default_value = "0")]
        cursor: u64,

        #[arg(long, default_value = "100")]
        limit: u64,
    },

    /// Advance chain time (for testing)
    AdvanceBlock,

    /// Set chain timestamp (for testing)
    SetTimestamp {
        /// Timestamp to set (milliseconds)
        #[arg(long)]
        timestamp: u64,
    },
}

fn print_auction(a: &AuctionRpc) {
    println!("Auction {}:", a.auction_id);
    println!("  Asset: {} ({})", a.asset_symbol, a.asset_name);
    println!("  Status: {}", a.status);
    println!("  Creator: {}", a.creator);
    println!("  Strategy: {}", a.strategy);
    println!("  Supply: {} across up to {} winners", a.total_supply, a.winner_count);
    println!("  Window: [{}, {})", a.start_time, a.end_time);
    println!("  Bids: {}", a.num_bids);
    println!("  Escrow: {}", a.escrow_balance);
}

fn print_refunds(refunds: &[PayoutRpc]) {
    for r in refunds {
        println!("  Refund [{}] {} -> {}", r.origin_index, r.amount, r.recipient);
    }
}

async fn create_auction_cmd(client: &AuctionRpcClient, request: CreateAuctionRequest) -> Result<()> {
    let response = client.create_auction(request).await?;
    info!("Created auction with ID: {}", response.auction_id);
    println!("Auction ID: {}", response.auction_id);
    println!("  Tx: {}", response.tx_digest);
    Ok(())
}

async fn place_bid_cmd(
    client: &AuctionRpcClient,
    sender: &str,
    auction_id: u64,
    amount: u64,
    payment: u64,
) -> Result<()> {
    parse_address(sender)?;
    let auction = client
        .get_auction(auction_id)
        .await?
        .ok_or_else(|| anyhow!("Auction {} not found", auction_id))?;
    if auction.status != "open" {
        return Err(anyhow!("Auction {} is {}", auction_id, auction.status));
    }

    let prepared = create_bid(&PlaintextSealer, auction_id, amount, payment)?;
    let response = client
        .place_bid(PlaceBidRequest {
            sender: sender.to_string(),
            auction_id,
            payload: prepared.payload_hex(),
            payment,
        })
        .await?;

    info!("Bid submitted for auction {}", auction_id);
    println!("Bid submitted successfully");
    println!("  Auction ID: {}", auction_id);
    println!("  Bid Index: {}", response.bid_index);
    println!("  Amount: {} (sealed)", amount);
    println!("  Payment: {}", payment);
    Ok(())
}

async fn finalize_cmd(client: &AuctionRpcClient, sender: &str, auction_id: u64) -> Result<()> {
    let response = client.finalize(sender, auction_id).await?;
    let outcome = &response.outcome;

    println!("Auction {} finalized:", outcome.auction_id);
    println!("  Strategy: {}", outcome.strategy);
    println!("  Share per winner: {}", outcome.share_per_winner);
    for w in &outcome.winners {
        println!("  Winner [{}] {} bid {}", w.origin_index, w.bidder, w.amount);
    }
    println!("  Undistributed: {}", outcome.undistributed_remainder);
    print_refunds(&response.refunds);
    Ok(())
}

async fn get_outcome_cmd(client: &AuctionRpcClient, auction_id: u64) -> Result<()> {
    match client.get_outcome(auction_id).await? {
        Some(outcome) => {
            println!("Outcome for auction {}:", outcome.auction_id);
            println!("  Finalized at: {}", outcome.finalized_at);
            println!("  Seed: {}", outcome.seed);
            println!("  Share per winner: {}", outcome.share_per_winner);
            for w in &outcome.winners {
                println!("  Winner [{}] {} -> {}", w.origin_index, w.bidder, w.share);
            }
            println!("  Refunded: {}", outcome.total_refunded);
        }
        None => {
            println!("Auction {} not finalized yet", auction_id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auction_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let client = AuctionRpcClient::new(&cli.rpc)?;

    match cli.command {
        Commands::CreateAuction {
            sender,
            symbol,
            name,
            total_supply,
            winner_count,
            strategy,
            start_time,
            end_time,
        } => {
            let strategy: SelectionStrategy = strategy.parse()?;
            let request = CreateAuctionRequest {
                sender,
                asset_name: name.unwrap_or_else(|| symbol.clone()),
                asset_symbol: symbol,
                total_supply,
                winner_count,
                strategy: strategy.to_string(),
                start_time,
                end_time,
            };
            create_auction_cmd(&client, request).await?;
        }

        Commands::Bid {
            sender,
            auction_id,
            amount,
            payment,
        } => {
            place_bid_cmd(&client, &sender, auction_id, amount, payment).await?;
        }

        Commands::Finalize { sender, auction_id } => {
            finalize_cmd(&client, &sender, auction_id).await?;
        }

        Commands::Cancel { sender, auction_id } => {
            let response = client.cancel(&sender, auction_id).await?;
            println!("Auction {} cancelled", response.auction_id);
            print_refunds(&response.refunds);
        }

        Commands::GetAuction { auction_id } => match client.get_auction(auction_id).await? {
            Some(a) => print_auction(&a),
            None => println!("Auction {} not found", auction_id),
        },

        Commands::ListActive => {
            let auctions = client.get_active_auctions().await?;
            if auctions.is_empty() {
                println!("No auctions accepting bids");
            }
            for a in auctions {
                println!(
                    "  [{}] {} {} closes at {} ({} bids)",
                    a.auction_id, a.asset_symbol, a.strategy, a.end_time, a.num_bids
                );
            }
        }

        Commands::ListAuctions { offset, limit } => {
            let auctions = client.list_auctions(offset, limit).await?;
            if auctions.is_empty() {
                println!("No auctions found");
            } else {
                println!("Auctions:");
                for a in auctions {
                    println!(
                        "  [{}] {} {} - {} ({})",
                        a.auction_id, a.asset_symbol, a.strategy, a.status, a.creator
                    );
                }
            }
        }

        Commands::GetBids { auction_id } => match client.get_auction_bids(auction_id).await? {
            Some(bids) if !bids.is_empty() => {
                println!("Bids for auction {}:", auction_id);
                for (i, bid) in bids.iter().enumerate() {
                    println!("  [{}] Bidder: {}", i, bid.bidder);
                    println!("      Payment: {}", bid.payment_amount);
                    println!("      Payload: {} bytes", bid.payload.len() / 2);
                }
            }
            Some(_) => println!("No bids for auction {}", auction_id),
            None => println!("Auction {} not found", auction_id),
        },

        Commands::GetOutcome { auction_id } => {
            get_outcome_cmd(&client, auction_id).await?;
        }

        Commands::Balance { address, symbol } => match symbol {
            Some(symbol) => {
                let balance = client.get_asset_balance(&symbol, &address).await?;
                println!("{} {}", balance, symbol);
            }
            None => {
                println!("{}", client.get_balance(&address).await?);
            }
        },

        Commands::Fund { address, amount } => {
            let balance = client.fund(&address, amount).await?;
            println!("Balance of {}: {}", address, balance);
        }

        Commands::Events { cursor, limit } => {
            for record in client.get_events(cursor, limit).await? {
                println!(
                    "#{} t={} {}",
                    record.sequence,
                    record.timestamp,
                    serde_json::to_string(&record.event)?
                );
            }
        }

        Commands::AdvanceBlock => {
            let info = client.advance_block().await?;
            println!("Block advanced: height={}, timestamp={}", info.height, info.timestamp);
        }

        Commands::SetTimestamp { timestamp } => {
            client.set_timestamp(timestamp).await?;
            println!("Timestamp set to {}", timestamp);
        }
    }

    Ok(())
}
