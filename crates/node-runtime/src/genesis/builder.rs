//! # Genesis Block Builder
//!
//! Creates and validates the genesis block for chain initialization.

use pov_01_state_trie::EMPTY_TRIE_ROOT;
use serde::{Deserialize, Serialize};
use shared_types::{Address, PovBlock, PovHeader, U256, ZERO_ADDRESS, ZERO_HASH};
use thiserror::Error;

/// Genesis block creation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenesisError {
    /// Invalid genesis configuration.
    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),
}

/// Genesis block configuration.
///
/// Every node of a network must use the same values; peers with a different
/// genesis hash are ignored by the syncer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Protocol version.
    pub version: u32,

    /// Genesis timestamp (Unix seconds).
    pub timestamp: u64,

    /// Proof-of-work target of the genesis header.
    pub target: U256,

    pub nonce: u64,

    pub coinbase: Address,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            version: 1,
            timestamp: 1_700_000_000,
            target: U256::MAX,
            nonce: 0,
            coinbase: ZERO_ADDRESS,
        }
    }
}

impl GenesisConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.version == 0 {
            return Err(GenesisError::InvalidConfig(
                "Protocol version must be at least 1".to_string(),
            ));
        }

        if self.target.is_zero() {
            return Err(GenesisError::InvalidConfig(
                "Target must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for creating genesis blocks.
pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    /// Create a new genesis builder with configuration.
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// Build the genesis block: height 0, no parent, no transactions and the
    /// empty state.
    pub fn build(self) -> Result<PovBlock, GenesisError> {
        self.config.validate()?;

        let header = PovHeader {
            version: self.config.version,
            previous: ZERO_HASH,
            height: 0,
            timestamp: self.config.timestamp,
            merkle_root: ZERO_HASH,
            state_hash: EMPTY_TRIE_ROOT,
            target: self.config.target,
            nonce: self.config.nonce,
            coinbase: self.config.coinbase,
        };

        Ok(PovBlock::new(header, vec![]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_builder_default() {
        let genesis = GenesisBuilder::new(GenesisConfig::default()).build().unwrap();

        assert_eq!(genesis.height(), 0);
        assert_eq!(genesis.previous(), ZERO_HASH);
        assert_eq!(genesis.state_hash(), EMPTY_TRIE_ROOT);
        assert!(genesis.tx_hashes.is_empty());
    }

    #[test]
    fn test_genesis_hash_deterministic() {
        let genesis1 = GenesisBuilder::new(GenesisConfig::default()).build().unwrap();
        let genesis2 = GenesisBuilder::new(GenesisConfig::default()).build().unwrap();
        assert_eq!(genesis1.hash(), genesis2.hash());

        let other = GenesisBuilder::new(GenesisConfig {
            timestamp: 1_800_000_000,
            ..GenesisConfig::default()
        })
        .build()
        .unwrap();
        assert_ne!(genesis1.hash(), other.hash());
    }

    #[test]
    fn test_config_validation() {
        let config = GenesisConfig {
            target: U256::zero(),
            ..GenesisConfig::default()
        };
        assert!(GenesisBuilder::new(config).build().is_err());

        let config = GenesisConfig {
            version: 0,
            ..GenesisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
