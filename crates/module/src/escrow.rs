//! Escrow pool for bid payments.
//!
//! A pooled, splittable balance. Payments merge in as bids arrive and are split
//! back out as refunds; a split can never exceed what the pool holds.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from escrow arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscrowError {
    #[error("Escrow overflow: balance {balance} + {amount}")]
    Overflow { balance: u64, amount: u64 },

    #[error("Insufficient escrow: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },
}

/// Pooled bid payments held by one auction.
///
/// `total_collected == total_released + balance` holds after every operation.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct EscrowPool {
    balance: u64,
    total_collected: u64,
    total_released: u64,
}

impl EscrowPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a payment into the pool.
    pub fn merge(&mut self, amount: u64) -> Result<(), EscrowError> {
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(EscrowError::Overflow {
                balance: self.balance,
                amount,
            })?;
        // total_collected >= balance, so it overflows first
        let collected = self
            .total_collected
            .checked_add(amount)
            .ok_or(EscrowError::Overflow {
                balance: self.balance,
                amount,
            })?;

        self.balance = balance;
        self.total_collected = collected;
        Ok(())
    }

    /// Split `amount` out of the pool.
    pub fn split(&mut self, amount: u64) -> Result<u64, EscrowError> {
        if amount > self.balance {
            return Err(EscrowError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        self.balance -= amount;
        self.total_released += amount;
        Ok(amount)
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    pub fn total_collected(&self) -> u64 {
        self.total_collected
    }

    pub fn total_released(&self) -> u64 {
        self.total_released
    }

    pub fn is_empty(&self) -> bool {
        self.balance == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_and_split() {
        let mut pool = EscrowPool::new();
        pool.merge(100).unwrap();
        pool.merge(50).unwrap();
        assert_eq!(pool.balance(), 150);

        assert_eq!(pool.split(75), Ok(75));
        assert_eq!(pool.balance(), 75);
        assert_eq!(pool.total_collected(), 150);
        assert_eq!(pool.total_released(), 75);
    }

    #[test]
    fn test_split_cannot_exceed_balance() {
        let mut pool = EscrowPool::new();
        pool.merge(10).unwrap();

        assert_eq!(
            pool.split(11),
            Err(EscrowError::InsufficientBalance {
                requested: 11,
                available: 10
            })
        );
        assert_eq!(pool.balance(), 10);
    }

    #[test]
    fn test_merge_overflow_leaves_pool_unchanged() {
        let mut pool = EscrowPool::new();
        pool.merge(u64::MAX).unwrap();

        assert!(matches!(pool.merge(1), Err(EscrowError::Overflow { .. })));
        assert_eq!(pool.balance(), u64::MAX);
        assert_eq!(pool.total_collected(), u64::MAX);
    }

    #[test]
    fn test_conservation() {
        let mut pool = EscrowPool::new();
        for amount in [3, 9, 27, 81] {
            pool.merge(amount).unwrap();
        }
        for amount in [9, 81] {
            pool.split(amount).unwrap();
        }
        assert_eq!(
            pool.total_collected(),
            pool.total_released() + pool.balance()
        );
        pool.split(pool.balance()).unwrap();
        assert!(pool.is_empty());
    }
}
