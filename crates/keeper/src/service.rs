//! Finalization keeper implementation.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use auction_client::{parse_address, AuctionRpcClient, RpcError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Configuration for the keeper.
#[derive(Debug, Clone)]
pub struct KeeperConfig {
    /// RPC endpoint of the chain
    pub rpc_endpoint: String,
    /// Hex address the keeper finalizes for
    pub creator: String,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Rejected finalizations tolerated per auction before giving up
    pub max_attempts: u32,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "http://127.0.0.1:9944".to_string(),
            creator: String::new(),
            poll_interval_ms: 2_000,
            max_attempts: 5,
        }
    }
}

/// What one polling pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub finalized: Vec<u64>,
    /// Rejected this pass, tried again on the next one
    pub retrying: Vec<u64>,
    /// Newly given up on
    pub quarantined: Vec<u64>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.retrying.is_empty() && self.quarantined.is_empty()
    }
}

/// Finalizes one creator's auctions as soon as they are due.
pub struct FinalizationKeeper {
    config: KeeperConfig,
    client: AuctionRpcClient,
    attempts: HashMap<u64, u32>,
    quarantined: BTreeSet<u64>,
}

impl FinalizationKeeper {
    /// Create a new keeper.
    pub fn new(config: KeeperConfig) -> Result<Self> {
        parse_address(&config.creator).context("keeper creator address")?;
        let client = AuctionRpcClient::new(&config.rpc_endpoint)
            .with_context(|| format!("connecting to {}", config.rpc_endpoint))?;
        Ok(Self {
            config,
            client,
            attempts: HashMap::new(),
            quarantined: BTreeSet::new(),
        })
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    /// Auctions the keeper no longer touches.
    pub fn quarantined(&self) -> impl Iterator<Item = u64> + '_ {
        self.quarantined.iter().copied()
    }

    /// Run one polling pass.
    pub async fn tick(&mut self) -> Result<TickReport> {
        let due = self.client.get_finalizable(&self.config.creator).await?;
        let mut report = TickReport::default();

        for auction_id in due {
            if self.quarantined.contains(&auction_id) {
                continue;
            }
            match self.client.finalize(&self.config.creator, auction_id).await {
                Ok(response) => {
                    self.attempts.remove(&auction_id);
                    info!(
                        auction_id,
                        winners = response.outcome.winners.len(),
                        refunded = response.outcome.total_refunded,
                        "Finalized auction"
                    );
                    report.finalized.push(auction_id);
                }
                Err(e) => self.record_failure(auction_id, &e, &mut report),
            }
        }

        Ok(report)
    }

    fn record_failure(&mut self, auction_id: u64, err: &RpcError, report: &mut TickReport) {
        if err.is_fatal() {
            error!(auction_id, error = %err, "Settlement invariant violated; quarantining auction");
            self.quarantined.insert(auction_id);
            report.quarantined.push(auction_id);
            return;
        }

        let attempts = self.attempts.entry(auction_id).or_insert(0);
        *attempts += 1;
        if *attempts >= self.config.max_attempts {
            warn!(auction_id, attempts = *attempts, error = %err, "Giving up on auction");
            self.quarantined.insert(auction_id);
            report.quarantined.push(auction_id);
        } else {
            warn!(auction_id, attempts = *attempts, error = %err, "Finalize rejected; will retry");
            report.retrying.push(auction_id);
        }
    }

    /// Poll until `shutdown` resolves.
    pub async fn run<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let period = Duration::from_millis(self.config.poll_interval_ms.max(1));
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(creator = %self.config.creator, "Keeper started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Keeper stopping");
                    return Ok(());
                }
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(report) if !report.is_empty() => debug!(?report, "Keeper tick"),
                        Ok(_) => {}
                        Err(e) => warn!(error = %e, "Keeper tick failed"),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keeper(max_attempts: u32) -> FinalizationKeeper {
        FinalizationKeeper::new(KeeperConfig {
            creator: "01".repeat(32),
            max_attempts,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_keeper_config_default() {
        let config = KeeperConfig::default();
        assert_eq!(config.poll_interval_ms, 2_000);
        assert_eq!(config.max_attempts, 5);
    }

    #[test]
    fn test_rejects_bad_creator() {
        let result = FinalizationKeeper::new(KeeperConfig {
            creator: "xyz".into(),
            ..Default::default()
        });
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_fatal_error_quarantines_immediately() {
        let mut keeper = keeper(5);
        let mut report = TickReport::default();
        let fatal = RpcError::Rejected {
            code: auction_client::query::INVARIANT_VIOLATION_CODE,
            message: "escrow residue".into(),
        };

        keeper.record_failure(7, &fatal, &mut report);
        assert_eq!(report.quarantined, vec![7]);
        assert_eq!(keeper.quarantined().collect::<Vec<_>>(), vec![7]);
    }

    #[tokio::test]
    async fn test_retryable_error_gives_up_after_limit() {
        let mut keeper = keeper(2);
        let mut report = TickReport::default();
        let transient = RpcError::Transport("connection reset".into());

        keeper.record_failure(3, &transient, &mut report);
        assert_eq!(report.retrying, vec![3]);
        assert!(report.quarantined.is_empty());

        keeper.record_failure(3, &transient, &mut report);
        assert_eq!(report.quarantined, vec![3]);
    }
}
