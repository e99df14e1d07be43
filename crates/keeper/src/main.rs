//! Finalization keeper binary.

use anyhow::Result;
use auction_keeper::{FinalizationKeeper, KeeperConfig};
use clap::Parser;

#[derive(Parser)]
#[command(name = "auction-keeper")]
#[command(about = "Finalizes a creator's auctions once their deadline passes")]
struct Args {
    /// Mock chain RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:9944")]
    rpc: String,

    /// Creator address (hex)
    #[arg(long)]
    creator: String,

    /// Polling interval in milliseconds
    #[arg(long, default_value = "2000")]
    poll_interval_ms: u64,

    /// Rejected finalizations tolerated per auction
    #[arg(long, default_value = "5")]
    max_attempts: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auction_keeper=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let keeper = FinalizationKeeper::new(KeeperConfig {
        rpc_endpoint: args.rpc,
        creator: args.creator,
        poll_interval_ms: args.poll_interval_ms,
        max_attempts: args.max_attempts,
    })?;

    keeper
        .run(async {
            // Ctrl+C failing to register just means we run until killed.
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
