use crate::error::{LedgerError, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Version string written into the persisted ledger document.
pub const LEDGER_VERSION: &str = "1.0.0";
/// `PRAGMA user_version` of the SQLite ledger schema.
pub const SCHEMA_VERSION: u32 = 1;
/// Number of most recent commits fetched per sync cycle.
pub const LOOKBACK_WINDOW: usize = 50;
/// Upper bound on the number of commits kept per project.
pub const MAX_LEDGER_COMMITS: usize = 1000;

/// Commit metadata as produced by a repository adapter, before diffing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitInfo {
    pub id: String,
    pub author_name: String,
    pub author_email: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub parent_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub filename: String,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
    #[serde(default)]
    pub changes: u32,
}

impl FileChange {
    pub fn new(filename: impl Into<String>, additions: u32, deletions: u32) -> Self {
        Self {
            filename: filename.into(),
            additions,
            deletions,
            changes: additions + deletions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<FileChange>,
}

impl CommitRecord {
    pub fn from_info(info: CommitInfo, files: Vec<FileChange>) -> Self {
        Self {
            hash: info.id,
            message: info.message,
            author_name: info.author_name,
            author_email: info.author_email,
            timestamp: info.timestamp,
            files,
        }
    }

    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }

    pub fn additions(&self) -> u64 {
        self.files.iter().map(|f| f.additions as u64).sum()
    }

    pub fn deletions(&self) -> u64 {
        self.files.iter().map(|f| f.deletions as u64).sum()
    }
}

/// A tracked repository and its ledger, newest commit first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub identifier: String,
    pub path: PathBuf,
    #[serde(default)]
    pub commits: Vec<CommitRecord>,
    #[serde(default = "Utc::now")]
    pub last_activity: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ProjectRecord {
    pub fn new(identifier: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            identifier: identifier.into(),
            path: path.into(),
            commits: Vec::new(),
            last_activity: now,
            created_at: now,
        }
    }

    /// Hash of the newest stored commit, the stop condition for incremental syncs.
    pub fn boundary_hash(&self) -> Option<&str> {
        self.commits.first().map(|c| c.hash.as_str())
    }
}

/// Persisted form of the whole ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDocument {
    #[serde(default)]
    pub projects: Vec<ProjectRecord>,
    #[serde(default = "default_ledger_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn default_ledger_version() -> String {
    LEDGER_VERSION.to_string()
}

impl Default for LedgerDocument {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            version: default_ledger_version(),
            last_updated: Utc::now(),
        }
    }
}

/// Inclusive range of calendar dates a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(LedgerError::InvalidRange(format!(
                "start ({start}) is after end ({end})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn day_count(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        (0..self.day_count() as i64).map(move |offset| start + Duration::days(offset))
    }
}
