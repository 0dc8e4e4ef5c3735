pub mod json;
pub mod sqlite;

pub use json::JsonLedgerStore;
pub use sqlite::SqliteLedgerStore;

use crate::error::Result;
use crate::model::ProjectRecord;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Durable mapping from project identifier to its ledger.
pub trait LedgerStore {
    fn get(&self, identifier: &str) -> Result<Option<ProjectRecord>>;

    /// All projects, ordered by identifier.
    fn list(&self) -> Result<Vec<ProjectRecord>>;

    fn put(&mut self, project: ProjectRecord) -> Result<()>;

    /// Returns whether a project was removed.
    fn delete(&mut self, identifier: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Json,
    Sqlite,
}

impl StoreBackend {
    pub fn default_file_name(self) -> &'static str {
        match self {
            StoreBackend::Json => "ledger.json",
            StoreBackend::Sqlite => "ledger.db",
        }
    }
}

pub fn open_store(backend: StoreBackend, path: &Path) -> Result<Box<dyn LedgerStore>> {
    Ok(match backend {
        StoreBackend::Json => Box::new(JsonLedgerStore::open(path)?),
        StoreBackend::Sqlite => Box::new(SqliteLedgerStore::open(path)?),
    })
}

/// Move an unreadable ledger file out of the way so a fresh one can take its place.
pub(crate) fn quarantine(path: &Path) -> Result<PathBuf> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".corrupt");
    let target = path.with_file_name(name);
    std::fs::rename(path, &target)?;
    Ok(target)
}
