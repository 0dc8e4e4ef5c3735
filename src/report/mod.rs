pub mod aggregate;
pub mod exec;
pub mod message;
pub mod range;
pub mod render;

pub use aggregate::{
    CommitLine, DailyActivity, DayGroup, ProjectSection, ReportModel, ReportSummary,
};
pub use exec::exec;
pub use message::{file_summary, summary_line};
pub use range::{parse_date, resolve_range, Period};
pub use render::render;

use crate::error::LedgerError;
use crate::model::{ProjectRecord, ReportRange};
use chrono::TimeZone;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportFormat {
    /// Markdown outline
    StructuredOutline,
    /// Plain text with box-drawing decoration
    DecoratedText,
    /// Self-contained HTML page
    StyledMarkup,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [
        ReportFormat::StructuredOutline,
        ReportFormat::DecoratedText,
        ReportFormat::StyledMarkup,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReportFormat::StructuredOutline => "structured-outline",
            ReportFormat::DecoratedText => "decorated-text",
            ReportFormat::StyledMarkup => "styled-markup",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::StructuredOutline => "md",
            ReportFormat::DecoratedText => "txt",
            ReportFormat::StyledMarkup => "html",
        }
    }

    /// Suggested file name for a report over `range`.
    pub fn file_name(self, range: &ReportRange) -> String {
        if range.start == range.end {
            format!("activity-{}.{}", range.start, self.extension())
        } else {
            format!("activity-{}-to-{}.{}", range.start, range.end, self.extension())
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportFormat {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "structured-outline" | "markdown" | "md" => Ok(ReportFormat::StructuredOutline),
            "decorated-text" | "text" | "txt" => Ok(ReportFormat::DecoratedText),
            "styled-markup" | "html" => Ok(ReportFormat::StyledMarkup),
            _ => Err(LedgerError::UnknownFormat(s.to_string())),
        }
    }
}

/// Aggregate `projects` over `range` once and render the result as `format`.
pub fn build_report<Tz: TimeZone>(
    projects: &[ProjectRecord],
    range: ReportRange,
    format: ReportFormat,
    tz: &Tz,
) -> String {
    let model = ReportModel::build(projects, range, tz);
    render(&model, format)
}
