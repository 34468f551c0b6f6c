//! Runtime configuration.

use serde::Deserialize;

use crate::error::RuntimeError;

/// Settings a `Vm` is created with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Shard count for `Concurrent::Hash` maps. `None` lets the map pick
    /// one from the number of available cores.
    pub hash_shard_amount: Option<usize>,
    /// Log method_missing dispatch and NoMethodError results at debug level.
    pub trace_dispatch: bool,
}

impl VmConfig {
    /// Parse a configuration from a JSON document. Missing fields keep
    /// their defaults.
    pub fn from_json_str(source: &str) -> Result<Self, RuntimeError> {
        let config: VmConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RuntimeError> {
        if let Some(shards) = self.hash_shard_amount {
            if shards < 2 || !shards.is_power_of_two() {
                return Err(RuntimeError::invalid_config(format!(
                    "hash_shard_amount must be a power of two greater than 1, got {}",
                    shards
                )));
            }
        }
        Ok(())
    }
}
