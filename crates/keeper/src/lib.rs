//! Finalization keeper for sealed-bid settlement auctions.
//!
//! Only an auction's creator may finalize it. The keeper runs on the creator's
//! behalf:
//! 1. Polls the chain for the creator's auctions whose reveal gate is open
//! 2. Submits a finalize call for each
//! 3. Retries rejected calls on the next tick, up to a limit
//! 4. Quarantines auctions whose settlement hit a ledger invariant violation
//!
//! Fatal errors are never retried; they need an operator.

pub mod service;

pub use service::{FinalizationKeeper, KeeperConfig, TickReport};
