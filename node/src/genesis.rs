use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use gala_api::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bank::GenesisBalance;
use crate::error::NodeError;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankGenesis {
    #[serde(default)]
    pub balances: Vec<GenesisBalance>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingGenesis {
    #[serde(default)]
    pub validators: Vec<Validator>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeGenesis {
    /// Upgrades this state already went through.
    #[serde(default)]
    pub applied: Vec<(String, AppliedUpgrade)>,
    /// Empty means every module starts at its current version.
    #[serde(default)]
    pub module_versions: VersionMap,
}

/// Initial state of every module, as loaded by `init` and written by
/// `export-genesis`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub chain_id: String,
    /// Unix seconds.
    pub genesis_time: u64,
    #[serde(default)]
    pub inflation: InflationGenesis,
    #[serde(default)]
    pub epochs: Vec<EpochInfo>,
    #[serde(default)]
    pub bank: BankGenesis,
    #[serde(default)]
    pub staking: StakingGenesis,
    #[serde(default)]
    pub upgrade: UpgradeGenesis,
}

impl GenesisState {
    pub fn new(chain_id: impl Into<String>, genesis_time: u64) -> Self {
        Self {
            chain_id: chain_id.into(),
            genesis_time,
            inflation: InflationGenesis::default(),
            epochs: default_epochs(genesis_time),
            bank: BankGenesis::default(),
            staking: StakingGenesis::default(),
            upgrade: UpgradeGenesis::default(),
        }
    }

    pub fn validate(&self) -> Result<(), NodeError> {
        if self.chain_id.trim().is_empty() {
            return Err(NodeError::Genesis("chain id is empty".to_string()));
        }
        self.inflation.validate()?;

        let mut identifiers = BTreeSet::new();
        for info in &self.epochs {
            info.validate()?;
            if !identifiers.insert(info.identifier.as_str()) {
                return Err(NodeError::Genesis(format!(
                    "duplicate epoch identifier {}",
                    info.identifier
                )));
            }
        }
        if !identifiers.contains(self.inflation.epoch_identifier.as_str()) {
            return Err(NodeError::Genesis(format!(
                "inflation epoch identifier {} has no epoch",
                self.inflation.epoch_identifier
            )));
        }

        let mut operators = BTreeSet::new();
        for validator in &self.staking.validators {
            if !operators.insert(validator.operator) {
                return Err(NodeError::Genesis(format!(
                    "duplicate validator {}",
                    validator.operator
                )));
            }
        }
        for balance in &self.bank.balances {
            for coin in &balance.coins {
                validate_denom(&coin.denom)?;
            }
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NodeError> {
        let contents = fs::read_to_string(path)?;
        let genesis: GenesisState = serde_json::from_str(&contents)?;
        genesis.validate()?;
        Ok(genesis)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), NodeError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_default_genesis_is_valid() {
        GenesisState::new("galactica_9302-1", 1_700_000_000).validate().unwrap();
    }

    #[test]
    fn test_inflation_needs_its_epoch() {
        let mut genesis = GenesisState::new("galactica_9302-1", 0);
        genesis.epochs.retain(|info| info.identifier != DAY_EPOCH_ID);
        assert!(matches!(genesis.validate(), Err(NodeError::Genesis(_))));
    }

    #[test]
    fn test_save_and_load() -> Result<(), NodeError> {
        let temp_dir = TempDir::new("genesis")?;
        let path = temp_dir.path().join("config").join("genesis.json");
        let mut genesis = GenesisState::new("galactica_9302-1", 10);
        genesis.bank.balances.push(GenesisBalance {
            address: Address::new([3; 20]),
            coins: vec![Coin::new(DEFAULT_DENOM, 5_000)?],
        });

        genesis.save(&path)?;
        assert_eq!(GenesisState::load(&path)?, genesis);
        Ok(())
    }

    #[test]
    fn test_sparse_json_fills_defaults() -> Result<(), NodeError> {
        let genesis: GenesisState =
            serde_json::from_str(r#"{"chain_id":"local","genesis_time":0}"#)?;
        assert_eq!(genesis.inflation, InflationGenesis::default());
        assert!(genesis.epochs.is_empty());
        Ok(())
    }
}
