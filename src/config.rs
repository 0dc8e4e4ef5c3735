//! User configuration, read from `<config_dir>/gledger/config.toml`.
//!
//! Every key is optional; CLI flags take priority over the file.

use crate::error::{LedgerError, Result};
use crate::report::ReportFormat;
use crate::store::StoreBackend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether `watch` runs sync cycles at all
    #[serde(default = "default_auto_sync")]
    pub auto_sync: bool,

    /// Time between sync cycles, e.g. "15m" or "1h 30m"
    #[serde(default = "default_interval")]
    pub interval: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_format")]
    pub default_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Ledger file; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_auto_sync() -> bool {
    true
}

fn default_interval() -> String {
    "15m".to_string()
}

fn default_format() -> String {
    ReportFormat::StructuredOutline.name().to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: default_auto_sync(),
            interval: default_interval(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gledger").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LedgerError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| LedgerError::Config(format!("Invalid TOML in {}: {e}", path.display())))?;

        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist; otherwise the default location is used when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::info!("Loading config from: {}", path.display());
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(&path)
            }
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let interval = self.sync_interval()?;
        if interval.is_zero() {
            return Err(LedgerError::Config("sync.interval must be greater than zero".into()));
        }
        self.default_format()?;
        Ok(())
    }

    pub fn sync_interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.sync.interval).map_err(|e| {
            LedgerError::Config(format!("Invalid sync.interval '{}': {e}", self.sync.interval))
        })
    }

    pub fn default_format(&self) -> Result<ReportFormat> {
        self.report
            .default_format
            .parse()
            .map_err(|e| LedgerError::Config(format!("report.default_format: {e}")))
    }

    pub fn ledger_path(&self, backend: StoreBackend) -> PathBuf {
        self.store.path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("gledger")
                .join(backend.default_file_name())
        })
    }
}
