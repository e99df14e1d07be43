//! Mock chain server for local testing of the sealed-bid auction system.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use auction_module::AuctionGenesisConfig;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(name = "mock-chain")]
#[command(about = "JSON-RPC mock chain hosting the auction module")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9944")]
    listen: SocketAddr,

    /// Auction module genesis (JSON); defaults apply when omitted
    #[arg(long)]
    genesis: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mock_chain=info".parse()?)
                .add_directive("auction_module=info".parse()?)
                .add_directive("jsonrpsee=warn".parse()?),
        )
        .init();

    let args = Args::parse();

    let genesis = match &args.genesis {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading genesis {}", path.display()))?;
            AuctionGenesisConfig::from_json(&json)?
        }
        None => AuctionGenesisConfig::default(),
    };

    info!("Starting mock chain server on {}", args.listen);
    let (_, handle) = mock_chain::start_server(args.listen, genesis).await?;

    info!("Mock chain server running. Press Ctrl+C to stop.");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    handle.stop()?;
    handle.stopped().await;

    Ok(())
}
