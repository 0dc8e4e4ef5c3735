use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::path::Path;

/// Presentation name for a project: `my-cool-app` becomes `My Cool App`.
pub fn display_name(identifier: &str) -> String {
    identifier
        .split('-')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ledger identifier for a working copy, derived from its directory name.
pub fn identifier_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();
    let mut identifier = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            identifier.push(ch);
        } else if !identifier.ends_with('-') {
            identifier.push('-');
        }
    }
    let identifier = identifier.trim_matches('-').to_string();
    if identifier.is_empty() {
        None
    } else {
        Some(identifier)
    }
}

pub fn local_date<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    timestamp.with_timezone(tz).date_naive()
}
