//! Genesis configuration for the auction module.
//!
//! This module defines the parameters the module starts with: creation limits,
//! how malformed payloads are treated at reveal, and what happens to supply the
//! integer split cannot distribute.

use serde::{Deserialize, Serialize};

/// Genesis configuration for the auction module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionGenesisConfig {
    /// Limits applied when auctions are created
    pub default_params: DefaultAuctionParams,

    /// Reveal behaviour
    pub reveal: RevealConfig,

    /// Supply distribution behaviour
    pub distribution: DistributionConfig,
}

/// Limits for new auctions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultAuctionParams {
    /// Minimum distance from start to end (milliseconds)
    pub min_duration: u64,
    /// Upper bound on `winner_count`
    pub max_winner_count: u64,
}

impl Default for DefaultAuctionParams {
    fn default() -> Self {
        Self {
            min_duration: 1,
            max_winner_count: 10_000,
        }
    }
}

/// How revealed payloads that needed coercion are treated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Keep malformed bids out of winner selection. They are still refunded.
    pub exclude_malformed: bool,
}

/// What happens to `total_supply % winners`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Not minted; recorded on the outcome as undistributed
    #[default]
    Discard,
    /// Minted to the auction creator
    ToCreator,
}

/// Distribution settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    pub remainder: RemainderPolicy,
}

impl AuctionGenesisConfig {
    /// Parse a JSON genesis document. Missing sections fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self, GenesisValidationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GenesisValidationError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the genesis configuration.
    pub fn validate(&self) -> Result<(), GenesisValidationError> {
        if self.default_params.min_duration == 0 {
            return Err(GenesisValidationError::InvalidDefaultParams(
                "Minimum duration cannot be zero".into(),
            ));
        }
        if self.default_params.max_winner_count == 0 {
            return Err(GenesisValidationError::InvalidDefaultParams(
                "Maximum winner count cannot be zero".into(),
            ));
        }
        Ok(())
    }
}

/// Errors that can occur during genesis validation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenesisValidationError {
    #[error("Invalid default parameters: {0}")]
    InvalidDefaultParams(String),

    #[error("Malformed genesis document: {0}")]
    Malformed(String),
}
