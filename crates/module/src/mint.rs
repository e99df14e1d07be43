//! Issuance capability boundary.
//!
//! The asset being auctioned belongs to an external issuance service. An auction
//! holds one `MintCapability` until it closes. Settlement spends it on the
//! winner shares; cancellation hands it back to the creator.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use auction_types::{Address, AssetDescriptor};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Right to mint units of one asset.
pub trait MintCapability: Send + fmt::Debug {
    /// Asset this capability mints.
    fn asset(&self) -> &AssetDescriptor;

    /// Mint `amount` units to `recipient`.
    fn mint(&mut self, amount: u64, recipient: Address);
}

/// A single mint performed through a capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRecord {
    pub symbol: String,
    pub recipient: Address,
    pub amount: u64,
}

/// In-memory asset balances for every symbol issued through `LedgerMint`.
#[derive(Debug, Default)]
pub struct AssetLedger {
    balances: HashMap<(String, Address), u64>,
    supply: HashMap<String, u64>,
    history: Vec<MintRecord>,
}

impl AssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit newly minted units.
    pub fn credit(&mut self, symbol: &str, recipient: Address, amount: u64) {
        let balance = self
            .balances
            .entry((symbol.to_string(), recipient))
            .or_insert(0);
        *balance = balance.saturating_add(amount);

        let supply = self.supply.entry(symbol.to_string()).or_insert(0);
        *supply = supply.saturating_add(amount);

        self.history.push(MintRecord {
            symbol: symbol.to_string(),
            recipient,
            amount,
        });
    }

    pub fn balance_of(&self, symbol: &str, holder: &Address) -> u64 {
        self.balances
            .get(&(symbol.to_string(), *holder))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_minted(&self, symbol: &str) -> u64 {
        self.supply.get(symbol).copied().unwrap_or(0)
    }

    pub fn history(&self) -> &[MintRecord] {
        &self.history
    }
}

/// Ledger shared between the host and the capabilities it hands out.
pub type SharedAssetLedger = Arc<RwLock<AssetLedger>>;

/// Capability that mints into a shared `AssetLedger`.
#[derive(Debug)]
pub struct LedgerMint {
    asset: AssetDescriptor,
    ledger: SharedAssetLedger,
}

impl LedgerMint {
    pub fn new(asset: AssetDescriptor, ledger: SharedAssetLedger) -> Self {
        Self { asset, ledger }
    }
}

impl MintCapability for LedgerMint {
    fn asset(&self) -> &AssetDescriptor {
        &self.asset
    }

    fn mint(&mut self, amount: u64, recipient: Address) {
        self.ledger
            .write()
            .credit(&self.asset.symbol, recipient, amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_mint_credits_balances() {
        let ledger: SharedAssetLedger = Arc::new(RwLock::new(AssetLedger::new()));
        let mut cap = LedgerMint::new(AssetDescriptor::new("LOT", "Lot"), ledger.clone());

        cap.mint(40, [1u8; 32]);
        cap.mint(2, [1u8; 32]);
        cap.mint(8, [2u8; 32]);

        let ledger = ledger.read();
        assert_eq!(ledger.balance_of("LOT", &[1u8; 32]), 42);
        assert_eq!(ledger.balance_of("LOT", &[2u8; 32]), 8);
        assert_eq!(ledger.balance_of("OTHER", &[1u8; 32]), 0);
        assert_eq!(ledger.total_minted("LOT"), 50);
        assert_eq!(ledger.history().len(), 3);
    }
}
