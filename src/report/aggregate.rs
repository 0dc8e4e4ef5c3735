use super::message::{file_summary, summary_line};
use crate::model::{CommitRecord, ProjectRecord, ReportRange};
use crate::util::{display_name, local_date};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;

/// One commit as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLine {
    pub hash: String,
    pub short_hash: String,
    pub local_time: NaiveDateTime,
    pub author_name: String,
    pub summary: String,
    /// File summary, e.g. `a.txt (+10/-2)`.
    pub files: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub commits: Vec<CommitLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSection {
    pub identifier: String,
    pub display_name: String,
    pub commit_count: usize,
    /// Newest date first.
    pub days: Vec<DayGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSummary {
    pub total_commits: usize,
    pub project_count: usize,
    pub files_modified: usize,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub commit_count: usize,
    pub file_count: usize,
    /// Display names, in order of first appearance.
    pub projects: Vec<String>,
}

/// Format-independent view of a ledger slice, computed once per report request.
#[derive(Debug, Clone)]
pub struct ReportModel {
    pub range: ReportRange,
    pub summary: ReportSummary,
    /// One entry per date in `range`, oldest first.
    pub daily: Vec<DailyActivity>,
    /// Projects with at least one commit in range, ordered by identifier.
    pub projects: Vec<ProjectSection>,
    pub generated_at: DateTime<Utc>,
}

impl ReportModel {
    /// Calendar dates and times of day are taken in `tz`.
    pub fn build<Tz: TimeZone>(projects: &[ProjectRecord], range: ReportRange, tz: &Tz) -> Self {
        let mut daily: BTreeMap<NaiveDate, DailyActivity> = range
            .days()
            .map(|date| {
                (
                    date,
                    DailyActivity {
                        date,
                        commit_count: 0,
                        file_count: 0,
                        projects: Vec::new(),
                    },
                )
            })
            .collect();

        let mut summary = ReportSummary::default();
        let mut sorted: Vec<&ProjectRecord> = projects.iter().collect();
        sorted.sort_by(|a, b| a.identifier.cmp(&b.identifier));

        let mut sections = Vec::new();
        for project in sorted {
            let mut eligible: Vec<&CommitRecord> = project
                .commits
                .iter()
                .filter(|c| range.contains(local_date(&c.timestamp, tz)))
                .collect();
            if eligible.is_empty() {
                continue;
            }
            eligible.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

            let name = display_name(&project.identifier);
            let mut days: Vec<DayGroup> = Vec::new();

            for commit in &eligible {
                let date = local_date(&commit.timestamp, tz);

                summary.total_commits += 1;
                summary.files_modified += commit.files.len();
                summary.lines_added += commit.additions();
                summary.lines_deleted += commit.deletions();

                if let Some(day) = daily.get_mut(&date) {
                    day.commit_count += 1;
                    day.file_count += commit.files.len();
                    if !day.projects.contains(&name) {
                        day.projects.push(name.clone());
                    }
                }

                let line = commit_line(commit, tz);
                match days.last_mut() {
                    Some(group) if group.date == date => group.commits.push(line),
                    _ => days.push(DayGroup {
                        date,
                        commits: vec![line],
                    }),
                }
            }

            summary.project_count += 1;
            sections.push(ProjectSection {
                identifier: project.identifier.clone(),
                display_name: name,
                commit_count: eligible.len(),
                days,
            });
        }

        Self {
            range,
            summary,
            daily: daily.into_values().collect(),
            projects: sections,
            generated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.total_commits == 0
    }
}

fn commit_line<Tz: TimeZone>(commit: &CommitRecord, tz: &Tz) -> CommitLine {
    CommitLine {
        hash: commit.hash.clone(),
        short_hash: commit.short_hash().to_string(),
        local_time: commit.timestamp.with_timezone(tz).naive_local(),
        author_name: commit.author_name.clone(),
        summary: summary_line(&commit.message),
        files: file_summary(&commit.files),
    }
}
