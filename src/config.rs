use std::fs;
use std::path::Path;

use config::{Config, ConfigError, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::ENV_PREFIX;
use crate::error::VaultError;
use crate::key::{KeyConfig, KeyOperation};
use crate::node::NodeId;

/// File-backed client configuration: the cluster's node identities plus the
/// optional key-derivation parameters, loadable from a TOML file with
/// `SHARDVAULT_*` environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Cluster node identities, in fan-out order.
    pub nodes: Vec<NodeId>,
    /// Deterministic seed for a single-party key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_seed: Option<String>,
    /// Request a cluster-party key explicitly.
    #[serde(default)]
    pub cluster_key: bool,
    /// Recombination threshold for a cluster-party key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<usize>,
}

impl VaultConfig {
    /// Loads configuration from `path`, with environment variables layered
    /// on top. `SHARDVAULT_KEY_SEED=...` overrides the file's `key_seed`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let path = path
            .to_str()
            .ok_or_else(|| ConfigError::Message("config path is not valid UTF-8".to_string()))?;
        let settings = Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;
        let parsed: VaultConfig = settings.try_deserialize()?;
        debug!(nodes = parsed.nodes.len(), "loaded configuration");
        Ok(parsed)
    }

    /// Parses configuration from an in-memory TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Writes this configuration to `path` as pretty-printed TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let toml =
            toml::to_string_pretty(self).map_err(|err| ConfigError::Foreign(Box::new(err)))?;
        fs::write(path, toml).map_err(|err| ConfigError::Foreign(Box::new(err)))
    }

    /// Maps the key-related fields onto a [`KeyConfig`], or `None` when no
    /// key parameters are present (fully plaintext operation).
    pub fn key_config(&self) -> Result<Option<KeyConfig>, VaultError> {
        if self.key_seed.is_none() && !self.cluster_key && self.threshold.is_none() {
            return Ok(None);
        }
        KeyConfig::from_parameters(
            KeyOperation::Store,
            self.key_seed.clone(),
            self.cluster_key,
            self.threshold,
            self.nodes.len(),
        )
        .map(Some)
    }
}
