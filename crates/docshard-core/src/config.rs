//! Sharding configuration.
//!
//! Configuration loads from three sources, later ones overriding earlier:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables with the `DOCSHARD_` prefix
//!
//! Environment variables use `__` as the nested-key separator, e.g.
//! `DOCSHARD_SHARDING__BATCH_SIZE=100` overrides `sharding.batch_size`.
//! The loaded config seeds a [`crate::store::ShardedStore`]; individual
//! settings stay mutable at runtime through `update_config`.

use std::path::Path;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for the sharding service.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ShardingConfig {
    /// Per-shard document count above which a shard is flagged critical.
    #[serde(default = "default_max_documents_per_shard")]
    pub max_documents_per_shard: u64,

    /// Allow collection-group scans at the backend.
    #[serde(default)]
    pub enable_collection_groups: bool,

    /// Allow queries that span every tenant's shard. Off by default:
    /// cross-tenant visibility is an explicit, audited opt-in.
    #[serde(default)]
    pub enable_cross_org_queries: bool,

    /// Memoize resolved shard paths.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Default number of documents per migration batch commit.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ShardingConfig {
    fn default() -> Self {
        Self {
            max_documents_per_shard: default_max_documents_per_shard(),
            enable_collection_groups: false,
            enable_cross_org_queries: false,
            cache_enabled: true,
            batch_size: default_batch_size(),
        }
    }
}

fn default_max_documents_per_shard() -> u64 {
    10_000
}

fn default_batch_size() -> usize {
    250
}

fn default_true() -> bool {
    true
}

/// File-level wrapper so YAML nests under a `sharding:` key, matching
/// the env-var prefix scheme.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
struct ConfigFile {
    #[serde(default)]
    sharding: ShardingConfig,
}

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl ShardingConfig {
    /// Loads configuration from a YAML file with environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let file = Config::builder()
            .add_source(Config::try_from(&ConfigFile::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix("DOCSHARD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let parsed: ConfigFile = file.try_deserialize()?;
        parsed.sharding.validate()?;
        Ok(parsed.sharding)
    }

    /// Loads defaults with environment overrides only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let file = Config::builder()
            .add_source(Config::try_from(&ConfigFile::default())?)
            .add_source(
                Environment::with_prefix("DOCSHARD")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let parsed: ConfigFile = file.try_deserialize()?;
        parsed.sharding.validate()?;
        Ok(parsed.sharding)
    }

    /// Rejects settings that would make the service inert or unsafe.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.max_documents_per_shard == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "sharding.max_documents_per_shard must be greater than 0".to_string(),
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "sharding.batch_size must be greater than 0".to_string(),
            });
        }
        if self.enable_cross_org_queries && !self.enable_collection_groups {
            return Err(ConfigLoadError::Invalid {
                message: "sharding.enable_cross_org_queries requires \
                          sharding.enable_collection_groups"
                    .to_string(),
            });
        }
        Ok(())
    }
}
