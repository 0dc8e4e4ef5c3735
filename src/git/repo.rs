use crate::error::{LedgerError, Result};
use crate::model::{CommitInfo, FileChange};
use chrono::DateTime;
use gix::object::tree::diff::ChangeDetached;
use gix::{discover, ObjectId, Repository};
use similar::{ChangeTag, TextDiff};
use std::collections::{BinaryHeap, HashSet};
use std::path::{Path, PathBuf};

pub struct GitRepo {
    repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open the repository containing `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = discover(path.as_ref())?;
        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The `max_count` most recent commits reachable from HEAD, newest first.
    pub fn recent_commits(&self, max_count: usize) -> Result<Vec<CommitInfo>> {
        let mut head = self.repo.head()?;
        if head.is_unborn() {
            return Ok(Vec::new());
        }
        let head_commit = head.peel_to_commit_in_place()?;

        let mut commits = Vec::with_capacity(max_count);
        let mut seen: HashSet<ObjectId> = HashSet::new();
        let mut queue: BinaryHeap<(i64, ObjectId)> = BinaryHeap::new();
        queue.push((head_commit.time()?.seconds, head_commit.id));

        while let Some((_, commit_id)) = queue.pop() {
            if commits.len() >= max_count {
                break;
            }
            if !seen.insert(commit_id) {
                continue;
            }

            let commit = self.repo.find_commit(commit_id)?;
            let secs = commit.time()?.seconds;
            let timestamp = DateTime::from_timestamp(secs, 0)
                .ok_or_else(|| LedgerError::InvalidDate(format!("Invalid timestamp: {secs}")))?;

            let parents: Vec<ObjectId> = commit.parent_ids().map(|id| id.into()).collect();
            for parent_id in &parents {
                if !seen.contains(parent_id) {
                    let parent = self.repo.find_commit(*parent_id)?;
                    queue.push((parent.time()?.seconds, *parent_id));
                }
            }

            let author = commit.author()?;
            let message = commit.message()?;
            let mut full_message = message.title.to_string().trim_end().to_string();
            if let Some(body) = message.body {
                let body = body.to_string();
                if !body.trim().is_empty() {
                    full_message.push_str("\n\n");
                    full_message.push_str(body.trim_end());
                }
            }

            commits.push(CommitInfo {
                id: commit_id.to_string(),
                author_name: author.name.to_string(),
                author_email: author.email.to_string(),
                message: full_message,
                timestamp,
                parent_ids: parents.iter().map(|id| id.to_string()).collect(),
            });
        }

        Ok(commits)
    }

    /// Per-file line counts for the changes between two commits.
    pub fn diff_summary(&self, from: &str, to: &str) -> Result<Vec<FileChange>> {
        let from_tree = self.repo.find_commit(parse_object_id(from)?)?.tree()?;
        let to_tree = self.repo.find_commit(parse_object_id(to)?)?.tree()?;

        let changes: Vec<ChangeDetached> =
            self.repo.diff_tree_to_tree(Some(&from_tree), Some(&to_tree), None)?;

        let mut files = Vec::new();
        for change in changes {
            if let Some(file) = self.file_change(change) {
                files.push(file);
            }
        }
        Ok(files)
    }

    fn file_change(&self, change: ChangeDetached) -> Option<FileChange> {
        match change {
            ChangeDetached::Addition { id, location, entry_mode, .. } => {
                if entry_mode.is_tree() {
                    return None;
                }
                let object = self.repo.find_object(id).ok()?;
                Some(FileChange::new(location.to_string(), count_lines(&object.data), 0))
            }
            ChangeDetached::Deletion { id, location, entry_mode, .. } => {
                if entry_mode.is_tree() {
                    return None;
                }
                let object = self.repo.find_object(id).ok()?;
                Some(FileChange::new(location.to_string(), 0, count_lines(&object.data)))
            }
            ChangeDetached::Modification {
                previous_id,
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() {
                    return None;
                }
                let old = self.repo.find_object(previous_id).ok()?;
                let new = self.repo.find_object(id).ok()?;
                let (added, deleted) = line_diff(&old.data, &new.data);
                Some(FileChange::new(location.to_string(), added, deleted))
            }
            ChangeDetached::Rewrite {
                source_id,
                id,
                location,
                entry_mode,
                ..
            } => {
                if entry_mode.is_tree() {
                    return None;
                }
                let old = self.repo.find_object(source_id).ok()?;
                let new = self.repo.find_object(id).ok()?;
                let (added, deleted) = line_diff(&old.data, &new.data);
                Some(FileChange::new(location.to_string(), added, deleted))
            }
        }
    }
}

fn parse_object_id(hex: &str) -> Result<ObjectId> {
    ObjectId::from_hex(hex.as_bytes())
        .map_err(|e| LedgerError::Parse(format!("Invalid commit ID '{hex}': {e}")))
}

fn is_binary(data: &[u8]) -> bool {
    data.iter().take(8192).any(|&b| b == 0)
}

fn count_lines(data: &[u8]) -> u32 {
    if is_binary(data) {
        return 0;
    }
    std::str::from_utf8(data)
        .map(|text| text.lines().count() as u32)
        .unwrap_or(0)
}

/// Binary or non-UTF-8 blobs count as zero lines either way.
fn line_diff(old: &[u8], new: &[u8]) -> (u32, u32) {
    if is_binary(old) || is_binary(new) {
        return (0, 0);
    }
    let (Ok(old_text), Ok(new_text)) = (std::str::from_utf8(old), std::str::from_utf8(new)) else {
        return (0, 0);
    };

    let diff = TextDiff::from_lines(old_text, new_text);
    let mut added = 0u32;
    let mut deleted = 0u32;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => added += 1,
            ChangeTag::Delete => deleted += 1,
            ChangeTag::Equal => {}
        }
    }
    (added, deleted)
}
