use super::{quarantine, LedgerStore};
use crate::error::Result;
use crate::model::{LedgerDocument, ProjectRecord};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

/// Ledger persisted as a single JSON document, rewritten on every change.
pub struct JsonLedgerStore {
    path: PathBuf,
    document: LedgerDocument,
}

impl JsonLedgerStore {
    /// Load the document at `path`. A missing file starts an empty ledger; an unparsable one is
    /// moved aside to `<name>.corrupt` and replaced by an empty ledger.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "ledger file not found, starting empty");
            return Ok(Self {
                path,
                document: LedgerDocument::default(),
            });
        }

        let content = fs::read_to_string(&path)?;
        let document = match serde_json::from_str::<LedgerDocument>(&content) {
            Ok(mut document) => {
                document.projects.sort_by(|a, b| a.identifier.cmp(&b.identifier));
                tracing::info!(
                    path = %path.display(),
                    projects = document.projects.len(),
                    version = %document.version,
                    "loaded ledger"
                );
                document
            }
            Err(e) => {
                let moved = quarantine(&path)?;
                tracing::warn!(
                    path = %path.display(),
                    moved_to = %moved.display(),
                    error = %e,
                    "ledger document unreadable, reinitializing empty ledger"
                );
                LedgerDocument::default()
            }
        };

        Ok(Self { path, document })
    }

    pub fn document(&self) -> &LedgerDocument {
        &self.document
    }

    fn save(&mut self) -> Result<()> {
        self.document.last_updated = Utc::now();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&self.document)?;
        let mut tmp_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "saved ledger");
        Ok(())
    }
}

impl LedgerStore for JsonLedgerStore {
    fn get(&self, identifier: &str) -> Result<Option<ProjectRecord>> {
        Ok(self
            .document
            .projects
            .iter()
            .find(|p| p.identifier == identifier)
            .cloned())
    }

    fn list(&self) -> Result<Vec<ProjectRecord>> {
        Ok(self.document.projects.clone())
    }

    fn put(&mut self, project: ProjectRecord) -> Result<()> {
        let projects = &mut self.document.projects;
        match projects.binary_search_by(|p| p.identifier.as_str().cmp(&project.identifier)) {
            Ok(index) => projects[index] = project,
            Err(index) => projects.insert(index, project),
        }
        self.save()
    }

    fn delete(&mut self, identifier: &str) -> Result<bool> {
        let before = self.document.projects.len();
        self.document.projects.retain(|p| p.identifier != identifier);
        if self.document.projects.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }
}
