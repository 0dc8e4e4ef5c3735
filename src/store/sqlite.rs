use super::{quarantine, LedgerStore};
use crate::error::{LedgerError, Result};
use crate::model::{CommitRecord, FileChange, ProjectRecord, SCHEMA_VERSION};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Normalised SQLite form of the ledger.
pub struct SqliteLedgerStore {
    conn: Connection,
}

impl SqliteLedgerStore {
    /// Open or create the database at `path`. A file that is not a ledger database, or carries
    /// another schema version, is moved aside and replaced by an empty one.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match Self::connect(path) {
            Ok(store) => Ok(store),
            Err(e @ (LedgerError::Database(_) | LedgerError::Store(_))) if path.exists() => {
                let moved = quarantine(path)?;
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %moved.display(),
                    error = %e,
                    "ledger database unreadable, reinitializing empty ledger"
                );
                Self::connect(path)
            }
            Err(e) => Err(e),
        }
    }

    pub fn in_memory() -> Result<Self> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.initialize()?;
        Ok(store)
    }

    fn connect(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&mut self) -> Result<()> {
        self.check_schema_version()?;
        self.conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            CREATE TABLE IF NOT EXISTS projects (
                identifier TEXT PRIMARY KEY,
                path TEXT NOT NULL,
                last_activity INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS commits (
                project_id TEXT NOT NULL,
                hash TEXT NOT NULL,
                position INTEGER NOT NULL,
                message TEXT NOT NULL,
                author_name TEXT NOT NULL,
                author_email TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                PRIMARY KEY (project_id, hash),
                FOREIGN KEY (project_id) REFERENCES projects(identifier) ON DELETE CASCADE
            );
            CREATE TABLE IF NOT EXISTS files (
                project_id TEXT NOT NULL,
                commit_hash TEXT NOT NULL,
                filename TEXT NOT NULL,
                additions INTEGER NOT NULL DEFAULT 0,
                deletions INTEGER NOT NULL DEFAULT 0,
                changes INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (project_id, commit_hash) REFERENCES commits(project_id, hash) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_commits_position ON commits(project_id, position);
            CREATE INDEX IF NOT EXISTS idx_files_commit ON files(project_id, commit_hash);
            ",
        )?;
        Ok(())
    }

    fn check_schema_version(&mut self) -> Result<()> {
        let user_version: i64 = self
            .conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))?;

        if user_version == 0 {
            let set_stmt = format!("PRAGMA user_version = {SCHEMA_VERSION};");
            self.conn.execute_batch(&set_stmt)?;
        } else if user_version != SCHEMA_VERSION as i64 {
            return Err(LedgerError::Store(format!(
                "Schema version mismatch: expected {}, found {}",
                SCHEMA_VERSION, user_version
            )));
        }

        Ok(())
    }

    fn load_commits(&self, identifier: &str) -> Result<Vec<CommitRecord>> {
        let mut files_stmt = self.conn.prepare(
            "SELECT commit_hash, filename, additions, deletions, changes
             FROM files WHERE project_id = ? ORDER BY rowid",
        )?;
        let mut files_by_commit: HashMap<String, Vec<FileChange>> = HashMap::new();
        let rows = files_stmt.query_map(params![identifier], |row| {
            Ok((
                row.get::<_, String>(0)?,
                FileChange {
                    filename: row.get(1)?,
                    additions: row.get(2)?,
                    deletions: row.get(3)?,
                    changes: row.get(4)?,
                },
            ))
        })?;
        for row in rows {
            let (hash, file) = row?;
            files_by_commit.entry(hash).or_default().push(file);
        }

        let mut commits_stmt = self.conn.prepare(
            "SELECT hash, message, author_name, author_email, timestamp
             FROM commits WHERE project_id = ? ORDER BY position",
        )?;
        let rows = commits_stmt.query_map(params![identifier], |row| {
            Ok(CommitRecord {
                hash: row.get(0)?,
                message: row.get(1)?,
                author_name: row.get(2)?,
                author_email: row.get(3)?,
                timestamp: timestamp_from_row(row.get(4)?, 4)?,
                files: Vec::new(),
            })
        })?;

        let mut commits = Vec::new();
        for row in rows {
            let mut commit = row?;
            commit.files = files_by_commit.remove(&commit.hash).unwrap_or_default();
            commits.push(commit);
        }
        Ok(commits)
    }

    fn load_project(&self, row: ProjectRow) -> Result<ProjectRecord> {
        let (identifier, path, last_activity, created_at) = row;
        let commits = self.load_commits(&identifier)?;
        Ok(ProjectRecord {
            path: PathBuf::from(path),
            commits,
            last_activity: timestamp_from_row(last_activity, 2)?,
            created_at: timestamp_from_row(created_at, 3)?,
            identifier,
        })
    }
}

fn timestamp_from_row(secs: i64, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single().ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(
            column,
            "timestamp".to_string(),
            rusqlite::types::Type::Integer,
        )
    })
}

type ProjectRow = (String, String, i64, i64);

fn project_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

impl LedgerStore for SqliteLedgerStore {
    fn get(&self, identifier: &str) -> Result<Option<ProjectRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT identifier, path, last_activity, created_at FROM projects WHERE identifier = ?",
                params![identifier],
                project_row,
            )
            .optional()?;
        row.map(|r| self.load_project(r)).transpose()
    }

    fn list(&self) -> Result<Vec<ProjectRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT identifier, path, last_activity, created_at FROM projects ORDER BY identifier",
        )?;
        let rows = stmt
            .query_map([], project_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(|r| self.load_project(r)).collect()
    }

    fn put(&mut self, project: ProjectRecord) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO projects (identifier, path, last_activity, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(identifier) DO UPDATE SET
                path = excluded.path,
                last_activity = excluded.last_activity,
                created_at = excluded.created_at",
            params![
                project.identifier,
                project.path.to_string_lossy(),
                project.last_activity.timestamp(),
                project.created_at.timestamp()
            ],
        )?;
        tx.execute("DELETE FROM files WHERE project_id = ?", params![project.identifier])?;
        tx.execute("DELETE FROM commits WHERE project_id = ?", params![project.identifier])?;

        {
            let mut insert_commit_stmt = tx.prepare(
                "INSERT OR IGNORE INTO commits
                 (project_id, hash, position, message, author_name, author_email, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )?;
            let mut insert_file_stmt = tx.prepare(
                "INSERT INTO files (project_id, commit_hash, filename, additions, deletions, changes)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?;

            for (position, commit) in project.commits.iter().enumerate() {
                let inserted = insert_commit_stmt.execute(params![
                    project.identifier,
                    commit.hash,
                    position as i64,
                    commit.message,
                    commit.author_name,
                    commit.author_email,
                    commit.timestamp.timestamp()
                ])?;
                if inserted == 0 {
                    continue;
                }
                for f in &commit.files {
                    insert_file_stmt.execute(params![
                        project.identifier,
                        commit.hash,
                        f.filename,
                        f.additions,
                        f.deletions,
                        f.changes
                    ])?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn delete(&mut self, identifier: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM files WHERE project_id = ?", params![identifier])?;
        tx.execute("DELETE FROM commits WHERE project_id = ?", params![identifier])?;
        let removed = tx.execute("DELETE FROM projects WHERE identifier = ?", params![identifier])?;
        tx.commit()?;
        Ok(removed > 0)
    }
}
