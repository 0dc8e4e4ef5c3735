use super::GitRepo;
use crate::error::{LedgerError, Result};
use crate::model::{CommitInfo, FileChange};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// What the synchronizer needs from a version-control working copy.
pub trait RepositoryAdapter {
    fn is_repository(&mut self, path: &Path) -> bool;

    /// Most recent commits, newest first.
    fn recent_commits(&mut self, path: &Path, max_count: usize) -> Result<Vec<CommitInfo>>;

    /// Fails when either side does not name a valid commit.
    fn diff_summary(&mut self, path: &Path, from: &str, to: &str) -> Result<Vec<FileChange>>;
}

/// gix-backed adapter holding one opened repository per path, opened on first use.
#[derive(Default)]
pub struct GixAdapter {
    repos: HashMap<PathBuf, GitRepo>,
}

impl GixAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for the working copy rooted exactly at `path`. A directory that only sits inside
    /// some other repository is not a working copy, and a cached handle is dropped once the
    /// working copy's `.git` disappears.
    fn repo(&mut self, path: &Path) -> Result<&GitRepo> {
        if !path.join(".git").exists() {
            if self.evict(path) {
                tracing::debug!(path = %path.display(), "repository vanished, dropped handle");
            }
            return Err(LedgerError::NotARepository(path.to_path_buf()));
        }

        if !self.repos.contains_key(path) {
            let repo = GitRepo::open(path)?;
            if !same_location(repo.path(), path) {
                tracing::debug!(
                    path = %path.display(),
                    workdir = %repo.path().display(),
                    "path is nested in another repository"
                );
                return Err(LedgerError::NotARepository(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "opened repository");
            self.repos.insert(path.to_path_buf(), repo);
        }
        self.repos
            .get(path)
            .ok_or_else(|| LedgerError::NotARepository(path.to_path_buf()))
    }

    fn evict(&mut self, path: &Path) -> bool {
        self.repos.remove(path).is_some()
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

impl RepositoryAdapter for GixAdapter {
    fn is_repository(&mut self, path: &Path) -> bool {
        path.is_dir() && self.repo(path).is_ok()
    }

    fn recent_commits(&mut self, path: &Path, max_count: usize) -> Result<Vec<CommitInfo>> {
        self.repo(path)?.recent_commits(max_count)
    }

    fn diff_summary(&mut self, path: &Path, from: &str, to: &str) -> Result<Vec<FileChange>> {
        self.repo(path)?.diff_summary(from, to)
    }
}
