use super::range::{resolve_range, Period};
use super::{build_report, ReportFormat};
use crate::cli::{CommonArgs, ReportArgs};
use crate::error::LedgerError;
use crate::model::{ProjectRecord, ReportRange};
use crate::util::local_date;
use anyhow::Context;
use chrono::{Local, NaiveDate, TimeZone};
use console::style;

pub fn exec(common: &CommonArgs, args: ReportArgs) -> anyhow::Result<()> {
    let config = common.load_config()?;
    let store = common.open_store(&config)?;

    let format = match args.format {
        Some(format) => format,
        None => config.default_format()?,
    };

    let today = Local::now().date_naive();
    let explicit = resolve_range(
        args.since.as_deref(),
        args.until.as_deref(),
        args.period,
        today,
        &Local,
    )?;

    let projects = match args.project.as_deref() {
        Some(identifier) => vec![store
            .get(identifier)?
            .ok_or_else(|| LedgerError::ProjectNotFound(identifier.to_string()))?],
        None => store.list()?,
    };

    let range = match (explicit, args.project.as_ref()) {
        (Some(range), _) => range,
        (None, Some(_)) => projects
            .first()
            .and_then(|p| commit_span(p, &Local))
            .unwrap_or_else(|| ReportRange::single(today)),
        (None, None) => Period::Today.range(today),
    };
    tracing::debug!(start = %range.start, end = %range.end, format = %format, "building report");

    let report = build_report(&projects, range, format, &Local);

    match args.output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(format.file_name(&range))
            } else {
                path
            };
            std::fs::write(&path, &report)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!(
                "{} Wrote {} report to {}",
                style("✓").green(),
                format,
                style(path.display()).bold()
            );
        }
        None => print!("{}", ensure_trailing_newline(report)),
    }

    Ok(())
}

/// Local dates of a project's oldest and newest stored commits.
pub fn commit_span<Tz: TimeZone>(project: &ProjectRecord, tz: &Tz) -> Option<ReportRange> {
    let dates = project.commits.iter().map(|c| local_date(&c.timestamp, tz));
    let (start, end) = dates.fold(None::<(NaiveDate, NaiveDate)>, |acc, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })?;
    Some(ReportRange { start, end })
}

fn ensure_trailing_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
