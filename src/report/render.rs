use super::aggregate::{CommitLine, ReportModel};
use super::ReportFormat;

const TITLE: &str = "Activity Report";
const RULE_WIDTH: usize = 60;

/// Section delimiters and emphasis for one output encoding. The walk over the model lives in
/// [`render`]; implementations only decide how each piece is spelled.
trait Markup {
    fn open(&self, out: &mut String, title: &str);
    fn close(&self, out: &mut String, footer: &str);
    fn section(&self, out: &mut String, title: &str);
    fn subsection(&self, out: &mut String, title: &str);
    fn note(&self, out: &mut String, text: &str);
    fn field(&self, out: &mut String, label: &str, value: &str);
    fn table(&self, out: &mut String, headers: &[&str], rows: &[Vec<String>]);
    fn entry(&self, out: &mut String, commit: &CommitLine, text: &str);
}

pub fn render(model: &ReportModel, format: ReportFormat) -> String {
    match format {
        ReportFormat::StructuredOutline => render_with(model, &Outline),
        ReportFormat::DecoratedText => render_with(model, &Decorated),
        ReportFormat::StyledMarkup => render_with(model, &Html),
    }
}

fn render_with(model: &ReportModel, markup: &dyn Markup) -> String {
    let mut out = String::new();
    let footer = format!(
        "Generated by gledger on {}",
        model.generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    markup.open(&mut out, TITLE);
    markup.note(&mut out, &period_label(model));

    if model.is_empty() {
        markup.note(&mut out, "No commits recorded for this period.");
        markup.close(&mut out, &footer);
        return out;
    }

    let summary = &model.summary;
    markup.section(&mut out, "Summary");
    markup.field(&mut out, "Total commits", &summary.total_commits.to_string());
    markup.field(&mut out, "Projects", &summary.project_count.to_string());
    markup.field(&mut out, "Files modified", &summary.files_modified.to_string());
    markup.field(&mut out, "Lines added", &format!("+{}", summary.lines_added));
    markup.field(&mut out, "Lines deleted", &format!("-{}", summary.lines_deleted));

    markup.section(&mut out, "Daily Activity");
    let rows: Vec<Vec<String>> = model
        .daily
        .iter()
        .map(|day| {
            vec![
                day.date.format("%Y-%m-%d %a").to_string(),
                day.commit_count.to_string(),
                day.file_count.to_string(),
                if day.projects.is_empty() {
                    "-".to_string()
                } else {
                    day.projects.join(", ")
                },
            ]
        })
        .collect();
    markup.table(&mut out, &["Date", "Commits", "Files", "Projects"], &rows);

    for project in &model.projects {
        markup.section(&mut out, &project.display_name);
        let noun = if project.commit_count == 1 { "commit" } else { "commits" };
        markup.note(&mut out, &format!("{} {noun}", project.commit_count));
        for day in &project.days {
            markup.subsection(&mut out, &day.date.format("%Y-%m-%d (%A)").to_string());
            for commit in &day.commits {
                markup.entry(&mut out, commit, &entry_text(commit));
            }
        }
    }

    markup.close(&mut out, &footer);
    out
}

fn period_label(model: &ReportModel) -> String {
    let range = model.range;
    if range.start == range.end {
        format!("Date: {}", range.start.format("%Y-%m-%d"))
    } else {
        format!(
            "Period: {} to {}",
            range.start.format("%Y-%m-%d"),
            range.end.format("%Y-%m-%d")
        )
    }
}

fn entry_text(commit: &CommitLine) -> String {
    format!(
        "{} {} ({}) by {}",
        commit.local_time.format("%H:%M"),
        commit.summary,
        commit.files,
        commit.author_name
    )
}

struct Outline;

impl Markup for Outline {
    fn open(&self, out: &mut String, title: &str) {
        out.push_str(&format!("# {title}\n\n"));
    }

    fn close(&self, out: &mut String, footer: &str) {
        out.push_str(&format!("\n---\n\n*{footer}*\n"));
    }

    fn section(&self, out: &mut String, title: &str) {
        out.push_str(&format!("\n## {title}\n\n"));
    }

    fn subsection(&self, out: &mut String, title: &str) {
        out.push_str(&format!("\n### {title}\n\n"));
    }

    fn note(&self, out: &mut String, text: &str) {
        out.push_str(&format!("_{text}_\n"));
    }

    fn field(&self, out: &mut String, label: &str, value: &str) {
        out.push_str(&format!("- **{label}:** {value}\n"));
    }

    fn table(&self, out: &mut String, headers: &[&str], rows: &[Vec<String>]) {
        out.push_str(&format!("| {} |\n", headers.join(" | ")));
        out.push_str(&format!("|{}\n", "---|".repeat(headers.len())));
        for row in rows {
            out.push_str(&format!("| {} |\n", row.join(" | ")));
        }
    }

    fn entry(&self, out: &mut String, commit: &CommitLine, text: &str) {
        out.push_str(&format!("- `{}` {text}\n", commit.short_hash));
    }
}

struct Decorated;

impl Markup for Decorated {
    fn open(&self, out: &mut String, title: &str) {
        let rule = "═".repeat(RULE_WIDTH);
        out.push_str(&format!("{rule}\n  {}\n{rule}\n", title.to_uppercase()));
    }

    fn close(&self, out: &mut String, footer: &str) {
        out.push_str(&format!("\n{}\n{footer}\n", "═".repeat(RULE_WIDTH)));
    }

    fn section(&self, out: &mut String, title: &str) {
        let title = title.to_uppercase();
        let underline = "─".repeat(title.chars().count());
        out.push_str(&format!("\n{title}\n{underline}\n"));
    }

    fn subsection(&self, out: &mut String, title: &str) {
        out.push_str(&format!("\n  ▸ {title}\n"));
    }

    fn note(&self, out: &mut String, text: &str) {
        out.push_str(&format!("{text}\n"));
    }

    fn field(&self, out: &mut String, label: &str, value: &str) {
        out.push_str(&format!("  {:<16} {value}\n", format!("{label}:")));
    }

    fn table(&self, out: &mut String, headers: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |cells: Vec<&str>| -> String {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| format!("{cell:<width$}"))
                .collect();
            format!("  {}\n", padded.join("  │ ").trim_end())
        };

        out.push_str(&line(headers.to_vec()));
        let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
        out.push_str(&format!("  {}\n", separator.join("──┼─")));
        for row in rows {
            out.push_str(&line(row.iter().map(String::as_str).collect()));
        }
    }

    fn entry(&self, out: &mut String, commit: &CommitLine, text: &str) {
        out.push_str(&format!("    • [{}] {text}\n", commit.short_hash));
    }
}

struct Html;

const STYLE: &str = "body{font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem;color:#24292f}\
h1{border-bottom:2px solid #d0d7de;padding-bottom:.3rem}\
h2{margin-top:2rem;border-bottom:1px solid #d0d7de}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #d0d7de;padding:.3rem .6rem;text-align:left}\
th{background:#f6f8fa}\
code{background:#f6f8fa;padding:.1rem .3rem;border-radius:4px}\
.note{color:#57606a;font-style:italic}\
.commit{margin:.2rem 0 .2rem 1rem}\
footer{margin-top:2rem;color:#57606a;font-size:.85rem}";

impl Markup for Html {
    fn open(&self, out: &mut String, title: &str) {
        let title = escape_html(title);
        out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"));
        out.push_str(&format!("<h1>{title}</h1>\n"));
    }

    fn close(&self, out: &mut String, footer: &str) {
        out.push_str(&format!("<footer>{}</footer>\n</body>\n</html>\n", escape_html(footer)));
    }

    fn section(&self, out: &mut String, title: &str) {
        out.push_str(&format!("<h2>{}</h2>\n", escape_html(title)));
    }

    fn subsection(&self, out: &mut String, title: &str) {
        out.push_str(&format!("<h3>{}</h3>\n", escape_html(title)));
    }

    fn note(&self, out: &mut String, text: &str) {
        out.push_str(&format!("<p class=\"note\">{}</p>\n", escape_html(text)));
    }

    fn field(&self, out: &mut String, label: &str, value: &str) {
        out.push_str(&format!(
            "<p><strong>{}:</strong> {}</p>\n",
            escape_html(label),
            escape_html(value)
        ));
    }

    fn table(&self, out: &mut String, headers: &[&str], rows: &[Vec<String>]) {
        out.push_str("<table>\n<thead><tr>");
        for header in headers {
            out.push_str(&format!("<th>{}</th>", escape_html(header)));
        }
        out.push_str("</tr></thead>\n<tbody>\n");
        for row in rows {
            out.push_str("<tr>");
            for cell in row {
                out.push_str(&format!("<td>{}</td>", escape_html(cell)));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n</table>\n");
    }

    fn entry(&self, out: &mut String, commit: &CommitLine, text: &str) {
        out.push_str(&format!(
            "<div class=\"commit\"><code title=\"{}\">{}</code> {}</div>\n",
            escape_html(&commit.hash),
            escape_html(&commit.short_hash),
            escape_html(text)
        ));
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommitRecord, FileChange, ProjectRecord, ReportRange};
    use chrono::{DateTime, NaiveDate, Utc};

    fn demo_model(start: (i32, u32, u32), end: (i32, u32, u32)) -> ReportModel {
        let mut project = ProjectRecord::new("demo", "/src/demo");
        for (hash, ts, message, file, added, deleted) in [
            ("bbbbbbbbbb", "2025-01-16T09:00:00Z", "feat: <b> & more", "b.txt", 5, 1),
            ("aaaaaaaaaa", "2025-01-15T10:00:00Z", "add a", "a.txt", 10, 2),
        ] {
            project.commits.push(CommitRecord {
                hash: hash.into(),
                message: message.into(),
                author_name: "Ada".into(),
                author_email: "ada@example.com".into(),
                timestamp: DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc),
                files: vec![FileChange::new(file, added, deleted)],
            });
        }
        let range = ReportRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap();
        ReportModel::build(&[project], range, &Utc)
    }

    #[test]
    fn outline_has_sections_and_entries() {
        let out = render(&demo_model((2025, 1, 15), (2025, 1, 16)), ReportFormat::StructuredOutline);
        assert!(out.starts_with("# Activity Report\n"));
        assert!(out.contains("_Period: 2025-01-15 to 2025-01-16_"));
        assert!(out.contains("- **Total commits:** 2"));
        assert!(out.contains("- **Lines added:** +15"));
        assert!(out.contains("| 2025-01-15 Wed | 1 | 1 | Demo |"));
        assert!(out.contains("## Demo"));
        assert!(out.contains("- `aaaaaaa` 10:00 add a (a.txt (+10/-2)) by Ada"));

        let newer = out.find("### 2025-01-16 (Thursday)").unwrap();
        let older = out.find("### 2025-01-15 (Wednesday)").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn decorated_text_uses_rules_and_bullets() {
        let out = render(&demo_model((2025, 1, 15), (2025, 1, 16)), ReportFormat::DecoratedText);
        assert!(out.contains("ACTIVITY REPORT"));
        assert!(out.contains("SUMMARY\n───────\n"));
        assert!(out.contains("  Total commits:   2"));
        assert!(out.contains("▸ 2025-01-16 (Thursday)"));
        assert!(out.contains("• [bbbbbbb] 09:00 <b> & more (b.txt (+5/-1)) by Ada"));
        assert!(!out.contains("**"));
    }

    #[test]
    fn styled_markup_is_a_complete_escaped_document() {
        let out = render(&demo_model((2025, 1, 15), (2025, 1, 16)), ReportFormat::StyledMarkup);
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.trim_end().ends_with("</html>"));
        assert!(out.contains("<h2>Daily Activity</h2>"));
        assert!(out.contains("<td>2025-01-16 Thu</td>"));
        assert!(out.contains("&lt;b&gt; &amp; more"));
        assert!(!out.contains("<b> & more"));
        assert!(out.contains("<code title=\"bbbbbbbbbb\">bbbbbbb</code>"));
    }

    #[test]
    fn empty_range_renders_no_data_message_in_each_format() {
        let model = demo_model((2024, 6, 1), (2024, 6, 3));
        assert!(model.is_empty());
        for format in ReportFormat::ALL {
            let out = render(&model, format);
            assert!(out.contains("No commits recorded for this period."), "{format}");
            assert!(!out.contains("Daily Activity"), "{format}");
            assert!(!out.contains("Summary"), "{format}");
        }
    }

    #[test]
    fn single_day_uses_date_label() {
        let out = render(&demo_model((2025, 1, 16), (2025, 1, 16)), ReportFormat::DecoratedText);
        assert!(out.contains("Date: 2025-01-16\n"));
    }

    #[test]
    fn escape_covers_quotes() {
        assert_eq!(escape_html(r#"a "b" 'c'"#), "a &quot;b&quot; &#39;c&#39;");
    }
}
