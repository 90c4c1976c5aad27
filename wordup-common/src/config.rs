//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (applied by the binary)
//! 2. Environment variables (`WORDUP_*`)
//! 3. TOML config file
//! 4. Compiled defaults
//!
//! A missing TOML file is not an error: defaults are used and a warning is
//! logged. A malformed file is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port for wordup-ingest
pub const DEFAULT_PORT: u16 = 5780;

/// Default maximum accepted upload size (5 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest file accepted by the upload endpoints
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where the persisted collection and raw uploads live
    #[serde(default)]
    pub store: StoreConfig,

    /// Where the sharded reference dictionary lives
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    #[serde(default)]
    pub merge: MergeConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Remote collection store location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the contents API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Path of the persisted collection inside the repository
    #[serde(default = "default_collection_path")]
    pub collection_path: String,
    /// Folder receiving verbatim copies of uploaded files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

/// Remote dictionary location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Folder holding `dictionary_<letter>.json` shards
    #[serde(default = "default_shard_dir")]
    pub shard_dir: String,
}

/// Merge behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    #[serde(default)]
    pub dedup: DedupPolicy,
    /// Extra read-merge-write attempts after a version conflict
    #[serde(default)]
    pub conflict_retries: u32,
}

/// How duplicate entries are collapsed when merging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupPolicy {
    /// One entry per name (case-insensitive); the most recently added wins
    #[default]
    Name,
    /// Only structurally identical entries collapse
    Exact,
}

impl std::str::FromStr for DedupPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(DedupPolicy::Name),
            "exact" => Ok(DedupPolicy::Exact),
            other => Err(Error::Config(format!(
                "Unknown dedup policy '{}' (expected 'name' or 'exact')",
                other
            ))),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_collection_path() -> String {
    "data/wordbook.json".to_string()
}

fn default_upload_dir() -> String {
    "upload".to_string()
}

fn default_commit_message() -> String {
    "Update wordbook via upload".to_string()
}

fn default_shard_dir() -> String {
    "dicts".to_string()
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
            dictionary: DictionaryConfig::default(),
            merge: MergeConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            collection_path: default_collection_path(),
            upload_dir: default_upload_dir(),
            commit_message: default_commit_message(),
        }
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
            shard_dir: default_shard_dir(),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            dedup: DedupPolicy::default(),
            conflict_retries: 0,
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from `explicit_path`, or from the default location
    ///
    /// An explicitly requested file must exist. The default file is optional.
    /// Environment overrides are applied in both cases.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::read_file(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read_file(&path)?,
                Some(path) => {
                    warn!(
                        "Config file {} not found, using built-in defaults",
                        path.display()
                    );
                    Self::default()
                }
                None => {
                    warn!("Could not determine config directory, using built-in defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `WORDUP_*` environment variables on top of file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(host) = env_value("WORDUP_HOST") {
            self.host = host;
        }
        if let Some(port) = env_value("WORDUP_PORT") {
            self.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid WORDUP_PORT: {}", port)))?;
        }
        if let Some(level) = env_value("WORDUP_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(owner) = env_value("WORDUP_STORE_OWNER") {
            self.store.owner = owner;
        }
        if let Some(repo) = env_value("WORDUP_STORE_REPO") {
            self.store.repo = repo;
        }
        if let Some(branch) = env_value("WORDUP_STORE_BRANCH") {
            self.store.branch = branch;
        }
        if let Some(path) = env_value("WORDUP_COLLECTION_PATH") {
            self.store.collection_path = path;
        }
        if let Some(owner) = env_value("WORDUP_DICT_OWNER") {
            self.dictionary.owner = owner;
        }
        if let Some(repo) = env_value("WORDUP_DICT_REPO") {
            self.dictionary.repo = repo;
        }
        if let Some(dir) = env_value("WORDUP_DICT_DIR") {
            self.dictionary.shard_dir = dir;
        }
        if let Some(policy) = env_value("WORDUP_DEDUP") {
            self.merge.dedup = policy.parse()?;
        }
        Ok(())
    }

    /// Check that the remote locations needed for online mode are present
    pub fn validate_remote(&self) -> Result<()> {
        if self.store.owner.is_empty() || self.store.repo.is_empty() {
            return Err(Error::Config(
                "store.owner and store.repo must be set (or run with --offline)".to_string(),
            ));
        }
        if self.dictionary.owner.is_empty() || self.dictionary.repo.is_empty() {
            return Err(Error::Config(
                "dictionary.owner and dictionary.repo must be set (or run with --offline)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config file location: `<config_dir>/wordup/wordup.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("wordup").join("wordup.toml"))
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
