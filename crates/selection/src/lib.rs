//! Deterministic reveal and winner selection for sealed-bid auctions.
//!
//! Everything in this crate is pure: given the same bids, deadline, clock reading
//! and seed, every observer computes the same winners. That keeps settlement
//! auditable independently of when the payloads were actually decrypted.
//!
//! - `gate`: the time-lock predicate authorizing disclosure
//! - `reveal`: payload to amount conversion
//! - `strategy`: HighestN, RandomN and ClosestToMeanN selection

pub mod error;
pub mod gate;
pub mod reveal;
pub mod strategy;

pub use error::SelectionError;
pub use gate::can_reveal;
pub use reveal::{parse_bid_amount, reveal, reveal_gated, ParsedAmount};
pub use strategy::{select_eligible_winners, select_winners, truncating_mean};
