use crate::cli::CommonArgs;
use crate::error::LedgerError;
use crate::git::{GitRepo, GixAdapter};
use crate::model::ProjectRecord;
use crate::sync::{sync_one, SyncMode, SyncStatus};
use crate::util::{display_name, identifier_from_path};
use anyhow::Context;
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListing {
    pub identifier: String,
    pub name: String,
    pub path: PathBuf,
    pub commit_count: usize,
    pub last_commit: Option<String>,
    pub last_activity: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<&ProjectRecord> for ProjectListing {
    fn from(project: &ProjectRecord) -> Self {
        Self {
            identifier: project.identifier.clone(),
            name: display_name(&project.identifier),
            path: project.path.clone(),
            commit_count: project.commits.len(),
            last_commit: project.boundary_hash().map(str::to_string),
            last_activity: project.last_activity,
            created_at: project.created_at,
        }
    }
}

/// Identifiers are lowercase alphanumeric words joined by single hyphens.
pub fn validate_identifier(identifier: &str) -> crate::error::Result<()> {
    let well_formed = !identifier.is_empty()
        && identifier
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() && !c.is_uppercase()));
    if well_formed {
        Ok(())
    } else {
        Err(LedgerError::Parse(format!(
            "invalid project identifier '{identifier}' (use lowercase letters, digits and single hyphens)"
        )))
    }
}

/// Resolve `path` to its working-copy root.
fn working_copy_root(path: &Path) -> anyhow::Result<PathBuf> {
    let canonical = std::fs::canonicalize(path)
        .with_context(|| format!("Path does not exist: {}", path.display()))?;
    let repo = GitRepo::open(&canonical)
        .map_err(|_| LedgerError::NotARepository(canonical.clone()))?;
    Ok(repo.path().to_path_buf())
}

pub fn track(
    common: &CommonArgs,
    path: Option<PathBuf>,
    name: Option<String>,
    no_sync: bool,
) -> anyhow::Result<()> {
    let config = common.load_config()?;
    let mut store = common.open_store(&config)?;

    let path = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let root = working_copy_root(&path)?;

    let identifier = match name {
        Some(name) => name,
        None => identifier_from_path(&root).ok_or_else(|| {
            LedgerError::Parse(format!("cannot derive an identifier from {}", root.display()))
        })?,
    };
    validate_identifier(&identifier)?;

    let tracked = store.list()?;
    if tracked.iter().any(|p| p.identifier == identifier) {
        return Err(LedgerError::ProjectExists(identifier).into());
    }
    if let Some(existing) = tracked.iter().find(|p| p.path == root) {
        return Err(LedgerError::ProjectExists(format!(
            "{} already tracks {}",
            existing.identifier,
            root.display()
        ))
        .into());
    }

    let project = ProjectRecord::new(identifier.as_str(), root.clone());
    store.put(project.clone())?;
    tracing::info!(project = %identifier, path = %root.display(), "tracking");
    println!(
        "{} Tracking {} ({})",
        style("✓").green(),
        style(display_name(&identifier)).bold(),
        root.display()
    );

    if no_sync {
        return Ok(());
    }

    let mut adapter = GixAdapter::new();
    match sync_one(store.as_mut(), &mut adapter, &project, SyncMode::Incremental) {
        SyncStatus::Updated { new_commits } => println!(
            "  ingested {} {}",
            new_commits,
            if new_commits == 1 { "commit" } else { "commits" }
        ),
        SyncStatus::Unchanged => println!("  no commits yet"),
        SyncStatus::Skipped | SyncStatus::Failed(_) => {}
    }
    Ok(())
}

pub fn untrack(common: &CommonArgs, identifier: &str) -> anyhow::Result<()> {
    let config = common.load_config()?;
    let mut store = common.open_store(&config)?;

    if !store.delete(identifier)? {
        return Err(LedgerError::ProjectNotFound(identifier.to_string()).into());
    }
    tracing::info!(project = %identifier, "untracked");
    println!("{} Untracked {}", style("✓").green(), display_name(identifier));
    Ok(())
}

pub fn list(common: &CommonArgs, json: bool) -> anyhow::Result<()> {
    let config = common.load_config()?;
    let store = common.open_store(&config)?;
    let listings: Vec<ProjectListing> = store.list()?.iter().map(ProjectListing::from).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    if listings.is_empty() {
        println!("No projects tracked yet. Add one with `gledger track <path>`.");
        return Ok(());
    }

    println!(
        "{:<24} {:>8} {:<17} {}",
        style("Project").bold(),
        style("Commits").bold(),
        style("Last activity").bold(),
        style("Path").bold()
    );
    println!("{}", "─".repeat(80));
    for p in &listings {
        println!(
            "{:<24} {:>8} {:<17} {}",
            p.identifier,
            p.commit_count,
            p.last_activity
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M"),
            p.path.display()
        );
    }
    Ok(())
}
