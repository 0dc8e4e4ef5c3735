use crate::config::Config;
use crate::report::{Period, ReportFormat};
use crate::store::{open_store, LedgerStore, StoreBackend};
use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gledger")]
#[command(about = "Track commit activity across repositories and turn it into reports")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Path to ledger file")]
    pub ledger: Option<PathBuf>,

    #[arg(long, global = true, value_enum, help = "Ledger storage backend")]
    pub backend: Option<StoreBackend>,

    #[arg(short, long, global = true, action = ArgAction::Count, help = "Increase log verbosity")]
    pub verbose: u8,
}

impl CommonArgs {
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config.as_deref()).context("Failed to load configuration")
    }

    pub fn open_store(&self, config: &Config) -> Result<Box<dyn LedgerStore>> {
        let backend = self.backend.unwrap_or(config.store.backend);
        let path = self
            .ledger
            .clone()
            .unwrap_or_else(|| config.ledger_path(backend));
        open_store(backend, &path)
            .with_context(|| format!("Failed to open ledger at {}", path.display()))
    }
}

#[derive(Args, Clone)]
pub struct ReportArgs {
    #[arg(long, help = "First day (YYYY-MM-DD, RFC3339, today, yesterday, or 'N days ago')")]
    pub since: Option<String>,

    #[arg(long, help = "Last day, inclusive (defaults to today)")]
    pub until: Option<String>,

    #[arg(long, value_enum, conflicts_with_all = ["since", "until"], help = "Named period")]
    pub period: Option<Period>,

    #[arg(long, help = "Only report on this project")]
    pub project: Option<String>,

    #[arg(
        long,
        value_parser = parse_format,
        help = "structured-outline (markdown), decorated-text (text) or styled-markup (html)"
    )]
    pub format: Option<ReportFormat>,

    #[arg(long, short, help = "Write the report to this file instead of stdout")]
    pub output: Option<PathBuf>,
}

fn parse_format(value: &str) -> std::result::Result<ReportFormat, String> {
    value.parse().map_err(|e: crate::error::LedgerError| e.to_string())
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start tracking a repository
    Track {
        #[arg(help = "Repository path (defaults to the current directory)")]
        path: Option<PathBuf>,

        #[arg(long, help = "Project identifier (defaults to the directory name)")]
        name: Option<String>,

        #[arg(long, help = "Do not ingest history right away")]
        no_sync: bool,
    },
    /// Stop tracking a project and drop its ledger
    Untrack { identifier: String },
    /// List tracked projects
    List {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Pull new commits for every tracked project
    Sync {
        #[arg(long, help = "Only sync this project")]
        project: Option<String>,
    },
    /// Drop a project's ledger and re-ingest recent history
    Refresh { identifier: String },
    /// Sync periodically
    Watch {
        #[arg(long, help = "Time between cycles, e.g. 15m (overrides config)")]
        interval: Option<String>,

        #[arg(long, help = "Stop after this many cycles")]
        max_cycles: Option<u32>,
    },
    /// Render an activity report
    Report(ReportArgs),
}

impl Cli {
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Track { path, name, no_sync } => {
                crate::projects::track(&self.common, path, name, no_sync)
            }
            Commands::Untrack { identifier } => crate::projects::untrack(&self.common, &identifier),
            Commands::List { json } => crate::projects::list(&self.common, json),
            Commands::Sync { project } => crate::sync::exec(&self.common, project.as_deref()),
            Commands::Refresh { identifier } => crate::sync::refresh(&self.common, &identifier),
            Commands::Watch { interval, max_cycles } => {
                crate::sync::watch(&self.common, interval.as_deref(), max_cycles)
            }
            Commands::Report(args) => crate::report::exec(&self.common, args),
        }
    }
}
