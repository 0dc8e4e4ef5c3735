use crate::model::FileChange;
use regex::Regex;
use std::sync::LazyLock;

static CONVENTIONAL_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(feat|fix|docs|style|refactor|test|chore)(\([^)]*\))?:\s*")
        .expect("conventional prefix pattern is valid")
});

static WORD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w+:\s*").expect("word prefix pattern is valid"));

/// First line of a commit message with any `type(scope):` or `word:` prefix removed.
pub fn summary_line(message: &str) -> String {
    let first = message.lines().next().unwrap_or("").trim();
    let stripped = CONVENTIONAL_PREFIX.replace(first, "");
    let stripped = WORD_PREFIX.replace(&stripped, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        first.to_string()
    } else {
        stripped.to_string()
    }
}

/// `a.txt (+10/-2)` for a single file, `3 files (+12/-4)` otherwise.
pub fn file_summary(files: &[FileChange]) -> String {
    match files {
        [only] => format!("{} (+{}/-{})", only.filename, only.additions, only.deletions),
        _ => {
            let added: u64 = files.iter().map(|f| f.additions as u64).sum();
            let deleted: u64 = files.iter().map(|f| f.deletions as u64).sum();
            format!("{} files (+{}/-{})", files.len(), added, deleted)
        }
    }
}
