use super::engine::{sync_all, sync_one, ProjectSync, SyncMode, SyncStatus};
use crate::cli::CommonArgs;
use crate::error::LedgerError;
use crate::git::{GixAdapter, RepositoryAdapter};
use crate::store::LedgerStore;
use crate::util::display_name;
use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleTally {
    pub projects: usize,
    pub updated: usize,
    pub new_commits: usize,
}

impl CycleTally {
    fn record(&mut self, result: &ProjectSync) {
        self.projects += 1;
        if let SyncStatus::Updated { new_commits } = result.status {
            self.updated += 1;
            self.new_commits += new_commits;
        }
    }
}

pub fn exec(common: &CommonArgs, project: Option<&str>) -> anyhow::Result<()> {
    let config = common.load_config()?;
    let mut store = common.open_store(&config)?;
    let mut adapter = GixAdapter::new();

    match project {
        Some(identifier) => {
            let record = store
                .get(identifier)?
                .ok_or_else(|| LedgerError::ProjectNotFound(identifier.to_string()))?;
            let status = sync_one(store.as_mut(), &mut adapter, &record, SyncMode::Incremental);
            print_status(identifier, &status);
        }
        None => {
            let tally = run_cycle(store.as_mut(), &mut adapter)?;
            print_tally(&tally);
        }
    }

    Ok(())
}

pub fn refresh(common: &CommonArgs, identifier: &str) -> anyhow::Result<()> {
    let config = common.load_config()?;
    let mut store = common.open_store(&config)?;
    let mut adapter = GixAdapter::new();

    let record = store
        .get(identifier)?
        .ok_or_else(|| LedgerError::ProjectNotFound(identifier.to_string()))?;
    let status = sync_one(store.as_mut(), &mut adapter, &record, SyncMode::Full);
    print_status(identifier, &status);
    Ok(())
}

pub fn watch(common: &CommonArgs, interval: Option<&str>, max_cycles: Option<u32>) -> anyhow::Result<()> {
    let config = common.load_config()?;
    if !config.sync.auto_sync {
        println!(
            "{} Automatic sync is disabled in the configuration",
            style("!").yellow()
        );
        return Ok(());
    }

    let interval = match interval {
        Some(raw) => parse_interval(raw)?,
        None => config.sync_interval()?,
    };

    println!(
        "Syncing every {} (Ctrl-C to stop)",
        style(humantime::format_duration(interval)).cyan()
    );

    // Repository handles live across cycles; the ledger is reopened so projects tracked
    // from another shell are picked up.
    let mut adapter = GixAdapter::new();
    let mut cycles = 0u32;
    loop {
        let mut store = common.open_store(&config)?;
        let tally = run_cycle(store.as_mut(), &mut adapter)?;
        print_tally(&tally);
        cycles += 1;

        if max_cycles.is_some_and(|max| cycles >= max) {
            break;
        }
        std::thread::sleep(interval);
    }

    Ok(())
}

fn parse_interval(raw: &str) -> anyhow::Result<Duration> {
    let interval = humantime::parse_duration(raw)
        .with_context(|| format!("Invalid interval '{raw}'"))?;
    if interval.is_zero() {
        return Err(LedgerError::Config("interval must be greater than zero".into()).into());
    }
    Ok(interval)
}

fn run_cycle<A>(store: &mut dyn LedgerStore, adapter: &mut A) -> anyhow::Result<CycleTally>
where
    A: RepositoryAdapter + ?Sized,
{
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Syncing projects...");

    let mut tally = CycleTally::default();
    sync_all(store, adapter, |result| {
        tally.record(result);
        pb.set_message(format!("Synced {}", result.identifier));
        if let SyncStatus::Updated { new_commits } = result.status {
            pb.suspend(|| println!("{}", updated_line(&result.identifier, new_commits)));
        }
    })
    .context("Failed to list tracked projects")?;

    pb.finish_and_clear();
    Ok(tally)
}

fn updated_line(identifier: &str, new_commits: usize) -> String {
    format!(
        "{} {}: {} new {}",
        style("✓").green(),
        display_name(identifier),
        new_commits,
        if new_commits == 1 { "commit" } else { "commits" }
    )
}

// Failures and skips are only logged.
fn print_status(identifier: &str, status: &SyncStatus) {
    match status {
        SyncStatus::Updated { new_commits } => println!("{}", updated_line(identifier, *new_commits)),
        SyncStatus::Unchanged => {
            println!("{} {}: up to date", style("·").dim(), display_name(identifier))
        }
        _ => {}
    }
}

fn print_tally(tally: &CycleTally) {
    println!(
        "Synced {} {}: {} updated, {} new {}",
        tally.projects,
        if tally.projects == 1 { "project" } else { "projects" },
        tally.updated,
        tally.new_commits,
        if tally.new_commits == 1 { "commit" } else { "commits" }
    );
}
