use crate::error::Result;
use crate::git::RepositoryAdapter;
use crate::model::{CommitRecord, ProjectRecord, LOOKBACK_WINDOW, MAX_LEDGER_COMMITS};
use crate::store::LedgerStore;
use std::collections::HashSet;

/// Result of reconciling one project's ledger with its repository.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub project: ProjectRecord,
    pub new_commits: usize,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.new_commits > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Stop at the newest stored commit.
    Incremental,
    /// Drop the stored ledger and re-ingest the lookback window.
    Full,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Updated { new_commits: usize },
    Unchanged,
    /// Path is not (or no longer) a repository; retried next cycle.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ProjectSync {
    pub identifier: String,
    pub status: SyncStatus,
}

/// Bot-generated pull request merges are noise; hand-made merges are kept.
pub fn is_merge_bot_commit(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.starts_with("merge ") && lower.contains("pull request")
}

/// Pull the lookback window from the adapter and prepend everything newer than the stored
/// boundary hash, keeping at most [`MAX_LEDGER_COMMITS`] entries.
pub fn sync_project<A>(project: &ProjectRecord, adapter: &mut A) -> Result<SyncOutcome>
where
    A: RepositoryAdapter + ?Sized,
{
    let boundary = project.boundary_hash();
    let fetched = adapter.recent_commits(&project.path, LOOKBACK_WINDOW)?;

    let mut seen: HashSet<String> = project.commits.iter().map(|c| c.hash.clone()).collect();
    let mut retained: Vec<CommitRecord> = Vec::new();
    for info in fetched {
        if boundary == Some(info.id.as_str()) {
            break;
        }
        if !seen.insert(info.id.clone()) {
            tracing::debug!(project = %project.identifier, commit = %info.id, "already in ledger");
            continue;
        }
        if is_merge_bot_commit(&info.message) {
            tracing::debug!(project = %project.identifier, commit = %info.id, "skipping pull request merge");
            continue;
        }

        let files = match info.parent_ids.first() {
            Some(parent) => match adapter.diff_summary(&project.path, parent, &info.id) {
                Ok(files) => files,
                Err(e) => {
                    tracing::debug!(
                        project = %project.identifier,
                        commit = %info.id,
                        error = %e,
                        "diff unavailable, recording no files"
                    );
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        retained.push(CommitRecord::from_info(info, files));
    }

    let mut updated = project.clone();
    let new_commits = retained.len();
    if let Some(newest) = retained.first() {
        updated.last_activity = newest.timestamp;
        retained.append(&mut updated.commits);
        retained.truncate(MAX_LEDGER_COMMITS);
        updated.commits = retained;
    }

    Ok(SyncOutcome {
        project: updated,
        new_commits,
    })
}

/// Full resync: same walk as [`sync_project`] over an emptied ledger.
pub fn refresh_project<A>(project: &ProjectRecord, adapter: &mut A) -> Result<SyncOutcome>
where
    A: RepositoryAdapter + ?Sized,
{
    let mut cleared = project.clone();
    cleared.commits.clear();
    sync_project(&cleared, adapter)
}

/// Sync one project and write the result back. Never fails: every error becomes a status and
/// leaves the stored ledger as it was.
pub fn sync_one<A>(
    store: &mut dyn LedgerStore,
    adapter: &mut A,
    project: &ProjectRecord,
    mode: SyncMode,
) -> SyncStatus
where
    A: RepositoryAdapter + ?Sized,
{
    if !adapter.is_repository(&project.path) {
        tracing::info!(
            project = %project.identifier,
            path = %project.path.display(),
            "not a repository, skipping"
        );
        return SyncStatus::Skipped;
    }

    let outcome = match mode {
        SyncMode::Incremental => sync_project(project, adapter),
        SyncMode::Full => refresh_project(project, adapter),
    };

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(project = %project.identifier, error = %e, "sync failed");
            return SyncStatus::Failed(e.to_string());
        }
    };

    let must_write = outcome.changed() || (mode == SyncMode::Full && outcome.project != *project);
    if must_write {
        if let Err(e) = store.put(outcome.project) {
            tracing::warn!(project = %project.identifier, error = %e, "failed to write ledger");
            return SyncStatus::Failed(e.to_string());
        }
    }

    if outcome.new_commits > 0 {
        tracing::info!(project = %project.identifier, new_commits = outcome.new_commits, "ledger updated");
        SyncStatus::Updated {
            new_commits: outcome.new_commits,
        }
    } else {
        tracing::debug!(project = %project.identifier, "no new commits");
        SyncStatus::Unchanged
    }
}

/// One sync cycle over every tracked project, strictly one project at a time so no two writes
/// for the same project can overlap. `on_result` sees each project's status as it completes.
pub fn sync_all<A, F>(
    store: &mut dyn LedgerStore,
    adapter: &mut A,
    mut on_result: F,
) -> Result<Vec<ProjectSync>>
where
    A: RepositoryAdapter + ?Sized,
    F: FnMut(&ProjectSync),
{
    let projects = store.list()?;
    let mut results = Vec::with_capacity(projects.len());

    for project in &projects {
        let status = sync_one(store, adapter, project, SyncMode::Incremental);
        let result = ProjectSync {
            identifier: project.identifier.clone(),
            status,
        };
        on_result(&result);
        results.push(result);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::model::{CommitInfo, FileChange};
    use crate::store::SqliteLedgerStore;
    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::{HashMap, HashSet};
    use std::path::{Path, PathBuf};

    #[derive(Default)]
    struct FakeRepo {
        /// newest first
        commits: Vec<CommitInfo>,
        diffs: HashMap<String, Vec<FileChange>>,
        broken_diffs: HashSet<String>,
        broken_history: bool,
    }

    #[derive(Default)]
    struct FakeAdapter {
        repos: HashMap<PathBuf, FakeRepo>,
        history_calls: usize,
    }

    impl FakeAdapter {
        fn repo(&mut self, path: &str) -> &mut FakeRepo {
            self.repos.entry(PathBuf::from(path)).or_default()
        }
    }

    impl RepositoryAdapter for FakeAdapter {
        fn is_repository(&mut self, path: &Path) -> bool {
            self.repos.contains_key(path)
        }

        fn recent_commits(&mut self, path: &Path, max_count: usize) -> Result<Vec<CommitInfo>> {
            self.history_calls += 1;
            let repo = self
                .repos
                .get(path)
                .ok_or_else(|| LedgerError::NotARepository(path.to_path_buf()))?;
            if repo.broken_history {
                return Err(LedgerError::GitRepo("object database unavailable".into()));
            }
            Ok(repo.commits.iter().take(max_count).cloned().collect())
        }

        fn diff_summary(&mut self, path: &Path, _from: &str, to: &str) -> Result<Vec<FileChange>> {
            let repo = self
                .repos
                .get(path)
                .ok_or_else(|| LedgerError::NotARepository(path.to_path_buf()))?;
            if repo.broken_diffs.contains(to) {
                return Err(LedgerError::Parse(format!("bad revision {to}^")));
            }
            Ok(repo.diffs.get(to).cloned().unwrap_or_default())
        }
    }

    /// Builds a linear history; `n` is also the commit's minute offset so newer means larger.
    fn linear_history(prefix: &str, count: usize) -> Vec<CommitInfo> {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let mut commits: Vec<CommitInfo> = (0..count)
            .map(|n| CommitInfo {
                id: format!("{prefix}{n}"),
                author_name: "Ada".into(),
                author_email: "ada@example.com".into(),
                message: format!("change {n}"),
                timestamp: base + Duration::minutes(n as i64),
                parent_ids: if n == 0 { vec![] } else { vec![format!("{prefix}{}", n - 1)] },
            })
            .collect();
        commits.reverse();
        commits
    }

    fn push_commit(repo: &mut FakeRepo, id: &str, message: &str) {
        let parent = repo.commits.first().map(|c| c.id.clone());
        let timestamp = repo
            .commits
            .first()
            .map(|c| c.timestamp + Duration::minutes(1))
            .unwrap_or_else(|| Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        repo.commits.insert(
            0,
            CommitInfo {
                id: id.into(),
                author_name: "Ada".into(),
                author_email: "ada@example.com".into(),
                message: message.into(),
                timestamp,
                parent_ids: parent.into_iter().collect(),
            },
        );
    }

    fn hashes(project: &ProjectRecord) -> Vec<&str> {
        project.commits.iter().map(|c| c.hash.as_str()).collect()
    }

    #[test]
    fn first_sync_ingests_history_newest_first() {
        let mut adapter = FakeAdapter::default();
        adapter.repo("/demo").commits = linear_history("c", 3);
        let project = ProjectRecord::new("demo", "/demo");

        let outcome = sync_project(&project, &mut adapter).unwrap();
        assert!(outcome.changed());
        assert_eq!(outcome.new_commits, 3);
        assert_eq!(hashes(&outcome.project), vec!["c2", "c1", "c0"]);
        assert_eq!(outcome.project.last_activity, outcome.project.commits[0].timestamp);
    }

    #[test]
    fn second_sync_without_upstream_changes_is_a_no_op() {
        let mut adapter = FakeAdapter::default();
        adapter.repo("/demo").commits = linear_history("c", 5);
        let first = sync_project(&ProjectRecord::new("demo", "/demo"), &mut adapter).unwrap();

        let second = sync_project(&first.project, &mut adapter).unwrap();
        assert!(!second.changed());
        assert_eq!(second.project, first.project);
        assert_eq!(
            serde_json::to_string(&second.project.commits).unwrap(),
            serde_json::to_string(&first.project.commits).unwrap()
        );
    }

    #[test]
    fn sync_stops_at_boundary_hash() {
        let mut adapter = FakeAdapter::default();
        adapter.repo("/demo").commits = linear_history("c", 2);
        let first = sync_project(&ProjectRecord::new("demo", "/demo"), &mut adapter).unwrap();

        push_commit(adapter.repo("/demo"), "n1", "add feature");
        push_commit(adapter.repo("/demo"), "n2", "fix feature");

        let second = sync_project(&first.project, &mut adapter).unwrap();
        assert_eq!(second.new_commits, 2);
        assert_eq!(hashes(&second.project), vec!["n2", "n1", "c1", "c0"]);
    }

    #[test]
    fn stored_commits_above_the_boundary_are_not_duplicated() {
        let mut adapter = FakeAdapter::default();
        adapter.repo("/demo").commits = linear_history("c", 3);
        let first = sync_project(&ProjectRecord::new("demo", "/demo"), &mut adapter).unwrap();

        // Clock skew: an older stored commit now sorts ahead of the boundary.
        push_commit(adapter.repo("/demo"), "n1", "add feature");
        let skewed = adapter.repo("/demo").commits.remove(2);
        assert_eq!(skewed.id, "c1");
        adapter.repo("/demo").commits.insert(0, skewed);

        let second = sync_project(&first.project, &mut adapter).unwrap();
        assert_eq!(second.new_commits, 1);
        assert_eq!(hashes(&second.project), vec!["n1", "c2", "c1", "c0"]);

        let unique: HashSet<&str> = hashes(&second.project).into_iter().collect();
        assert_eq!(unique.len(), second.project.commits.len());
    }

    #[test]
    fn pull_request_merges_are_filtered_but_branch_merges_kept() {
        let mut adapter = FakeAdapter::default();
        let repo = adapter.repo("/demo");
        push_commit(repo, "base", "initial import");
        push_commit(repo, "pr", "Merge pull request #12 from x/y");
        push_commit(repo, "branch", "Merge branch 'dev'");
        push_commit(repo, "shout", "MERGE PULL REQUEST #13 FROM x/z");

        let outcome = sync_project(&ProjectRecord::new("demo", "/demo"), &mut adapter).unwrap();
        assert_eq!(hashes(&outcome.project), vec!["branch", "base"]);
    }

    #[test]
    fn merge_heuristic_needs_both_markers() {
        assert!(is_merge_bot_commit("Merge pull request #1 from a/b"));
        assert!(is_merge_bot_commit("merge remote pull request"));
        assert!(!is_merge_bot_commit("Merge branch 'main'"));
        assert!(!is_merge_bot_commit("Revert merge pull request"));
        assert!(!is_merge_bot_commit("Merged pull request"));
    }

    #[test]
    fn ledger_is_capped_at_most_recent_commits() {
        let mut adapter = FakeAdapter::default();
        let mut project = ProjectRecord::new("demo", "/demo");
        project.commits = linear_history("old", 990)
            .into_iter()
            .map(|info| CommitRecord::from_info(info, vec![]))
            .collect();
        let expected_tail: Vec<String> = project.commits[..950].iter().map(|c| c.hash.clone()).collect();

        let mut fresh = linear_history("new", 50);
        for info in &mut fresh {
            info.timestamp += Duration::days(30);
        }
        adapter.repo("/demo").commits = fresh;

        let outcome = sync_project(&project, &mut adapter).unwrap();
        assert_eq!(outcome.new_commits, 50);
        assert_eq!(outcome.project.commits.len(), MAX_LEDGER_COMMITS);
        assert_eq!(outcome.project.commits[0].hash, "new49");
        assert_eq!(outcome.project.commits[49].hash, "new0");
        let tail: Vec<String> = outcome.project.commits[50..].iter().map(|c| c.hash.clone()).collect();
        assert_eq!(tail, expected_tail);
    }

    #[test]
    fn fetch_is_limited_to_lookback_window() {
        let mut adapter = FakeAdapter::default();
        adapter.repo("/demo").commits = linear_history("c", 60);

        let outcome = sync_project(&ProjectRecord::new("demo", "/demo"), &mut adapter).unwrap();
        assert_eq!(outcome.new_commits, LOOKBACK_WINDOW);
        assert_eq!(outcome.project.commits.last().map(|c| c.hash.as_str()), Some("c10"));
    }

    #[test]
    fn root_commit_and_failed_diffs_record_no_files() {
        let mut adapter = FakeAdapter::default();
        let repo = adapter.repo("/demo");
        repo.commits = linear_history("c", 3);
        repo.diffs.insert("c1".into(), vec![FileChange::new("a.txt", 3, 1)]);
        repo.diffs.insert("c0".into(), vec![FileChange::new("never.txt", 1, 0)]);
        repo.broken_diffs.insert("c2".into());

        let outcome = sync_project(&ProjectRecord::new("demo", "/demo"), &mut adapter).unwrap();
        let files: Vec<usize> = outcome.project.commits.iter().map(|c| c.files.len()).collect();
        assert_eq!(files, vec![0, 1, 0]);
        assert_eq!(outcome.project.commits[1].files[0], FileChange::new("a.txt", 3, 1));
    }

    #[test]
    fn history_failure_propagates_from_sync_project() {
        let mut adapter = FakeAdapter::default();
        adapter.repo("/demo").broken_history = true;
        assert!(sync_project(&ProjectRecord::new("demo", "/demo"), &mut adapter).is_err());
    }

    #[test]
    fn refresh_reingests_from_scratch() {
        let mut adapter = FakeAdapter::default();
        adapter.repo("/demo").commits = linear_history("c", 3);
        let mut project = ProjectRecord::new("demo", "/demo");
        project.commits = linear_history("stale", 2)
            .into_iter()
            .map(|info| CommitRecord::from_info(info, vec![]))
            .collect();

        let outcome = refresh_project(&project, &mut adapter).unwrap();
        assert_eq!(hashes(&outcome.project), vec!["c2", "c1", "c0"]);
        assert_eq!(outcome.new_commits, 3);
    }

    #[test]
    fn batch_isolates_failures_and_skips_non_repositories() {
        let mut store = SqliteLedgerStore::in_memory().unwrap();
        let mut adapter = FakeAdapter::default();

        adapter.repo("/good").commits = linear_history("g", 2);
        adapter.repo("/broken").broken_history = true;

        let mut broken = ProjectRecord::new("broken", "/broken");
        broken.commits = linear_history("b", 1)
            .into_iter()
            .map(|info| CommitRecord::from_info(info, vec![]))
            .collect();
        let broken = store_roundtrip(&mut store, broken);
        store.put(ProjectRecord::new("good", "/good")).unwrap();
        let gone = store_roundtrip(&mut store, ProjectRecord::new("gone", "/gone"));

        let mut seen = Vec::new();
        let results = sync_all(&mut store, &mut adapter, |r| seen.push(r.identifier.clone())).unwrap();

        let statuses: Vec<(&str, &SyncStatus)> =
            results.iter().map(|r| (r.identifier.as_str(), &r.status)).collect();
        assert_eq!(statuses[0].0, "broken");
        assert!(matches!(statuses[0].1, SyncStatus::Failed(_)));
        assert_eq!(statuses[1], ("gone", &SyncStatus::Skipped));
        assert_eq!(statuses[2], ("good", &SyncStatus::Updated { new_commits: 2 }));
        assert_eq!(seen, vec!["broken", "gone", "good"]);

        assert_eq!(store.get("broken").unwrap(), Some(broken));
        assert_eq!(store.get("gone").unwrap(), Some(gone));
        assert_eq!(store.get("good").unwrap().unwrap().commits.len(), 2);
    }

    #[test]
    fn unchanged_projects_are_not_rewritten() {
        let mut store = SqliteLedgerStore::in_memory().unwrap();
        let mut adapter = FakeAdapter::default();
        adapter.repo("/demo").commits = linear_history("c", 2);
        let project = ProjectRecord::new("demo", "/demo");
        store.put(project.clone()).unwrap();

        let first = sync_one(&mut store, &mut adapter, &project, SyncMode::Incremental);
        assert_eq!(first, SyncStatus::Updated { new_commits: 2 });
        let stored = store.get("demo").unwrap().unwrap();

        let second = sync_one(&mut store, &mut adapter, &stored, SyncMode::Incremental);
        assert_eq!(second, SyncStatus::Unchanged);
        assert_eq!(store.get("demo").unwrap().unwrap(), stored);
        assert_eq!(adapter.history_calls, 2);
    }

    fn store_roundtrip(store: &mut SqliteLedgerStore, project: ProjectRecord) -> ProjectRecord {
        let id = project.identifier.clone();
        store.put(project).unwrap();
        store.get(&id).unwrap().unwrap()
    }
}
