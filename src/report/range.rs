use crate::error::{LedgerError, Result};
use crate::model::ReportRange;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};

/// Named report periods. Weeks start on Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Period {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
}

impl Period {
    pub fn range(self, today: NaiveDate) -> ReportRange {
        let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let first_of_month = today.with_day(1).unwrap_or(today);

        match self {
            Period::Today => ReportRange::single(today),
            Period::Yesterday => ReportRange::single(today - Duration::days(1)),
            Period::ThisWeek => ReportRange { start: monday, end: today },
            Period::LastWeek => ReportRange {
                start: monday - Duration::days(7),
                end: monday - Duration::days(1),
            },
            Period::ThisMonth => ReportRange {
                start: first_of_month,
                end: today,
            },
            Period::LastMonth => {
                let end = first_of_month - Duration::days(1);
                ReportRange {
                    start: end.with_day(1).unwrap_or(end),
                    end,
                }
            }
        }
    }
}

/// Parse a report boundary: `YYYY-MM-DD`, RFC 3339 (taken as a date in `tz`), `today`,
/// `yesterday`, or `N days|weeks|months ago`.
pub fn parse_date<Tz: TimeZone>(input: &str, today: NaiveDate, tz: &Tz) -> Result<NaiveDate> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(tz).date_naive());
    }

    match trimmed.to_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if let Some(days) = parse_days_ago(trimmed) {
        return Duration::try_days(days)
            .and_then(|offset| today.checked_sub_signed(offset))
            .ok_or_else(|| LedgerError::InvalidDate(format!("'{input}' is out of range")));
    }

    Err(LedgerError::InvalidDate(format!(
        "Cannot parse '{input}' (expected YYYY-MM-DD, RFC 3339, today, yesterday or 'N days ago')"
    )))
}

fn parse_days_ago(input: &str) -> Option<i64> {
    let input = input.trim().to_lowercase();

    for (suffix, factor) in [
        (" days ago", 1),
        (" day ago", 1),
        (" weeks ago", 7),
        (" week ago", 7),
        (" months ago", 30),
        (" month ago", 30),
    ] {
        if let Some(n) = input.strip_suffix(suffix) {
            if let Ok(n) = n.trim().parse::<u32>() {
                return i64::from(n).checked_mul(factor);
            }
        }
    }

    None
}

/// Turn the report command's range options into a range. `None` means no option was given.
pub fn resolve_range<Tz: TimeZone>(
    since: Option<&str>,
    until: Option<&str>,
    period: Option<Period>,
    today: NaiveDate,
    tz: &Tz,
) -> Result<Option<ReportRange>> {
    if let Some(period) = period {
        if since.is_some() || until.is_some() {
            return Err(LedgerError::InvalidRange(
                "a named period cannot be combined with --since/--until".into(),
            ));
        }
        return Ok(Some(period.range(today)));
    }

    match (since, until) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(LedgerError::InvalidRange("--until requires --since".into())),
        (Some(since), until) => {
            let start = parse_date(since, today, tz)?;
            let end = match until {
                Some(until) => parse_date(until, today, tz)?,
                None => today,
            };
            ReportRange::new(start, end).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // Thursday
    fn today() -> NaiveDate {
        date(2025, 1, 16)
    }

    #[test]
    fn named_periods() {
        assert_eq!(Period::Today.range(today()), ReportRange::single(today()));
        assert_eq!(Period::Yesterday.range(today()), ReportRange::single(date(2025, 1, 15)));
        assert_eq!(
            Period::ThisWeek.range(today()),
            ReportRange { start: date(2025, 1, 13), end: today() }
        );
        assert_eq!(
            Period::LastWeek.range(today()),
            ReportRange { start: date(2025, 1, 6), end: date(2025, 1, 12) }
        );
        assert_eq!(
            Period::ThisMonth.range(today()),
            ReportRange { start: date(2025, 1, 1), end: today() }
        );
        assert_eq!(
            Period::LastMonth.range(today()),
            ReportRange { start: date(2024, 12, 1), end: date(2024, 12, 31) }
        );
    }

    #[test]
    fn parses_supported_date_forms() {
        assert_eq!(parse_date("2025-01-02", today(), &Utc).unwrap(), date(2025, 1, 2));
        assert_eq!(parse_date("Yesterday", today(), &Utc).unwrap(), date(2025, 1, 15));
        assert_eq!(parse_date("3 days ago", today(), &Utc).unwrap(), date(2025, 1, 13));
        assert_eq!(parse_date("2 weeks ago", today(), &Utc).unwrap(), date(2025, 1, 2));
        assert_eq!(parse_date("1 month ago", today(), &Utc).unwrap(), date(2024, 12, 17));

        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(
            parse_date("2025-01-15T20:00:00Z", today(), &tokyo).unwrap(),
            date(2025, 1, 16)
        );
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(matches!(
            parse_date("next tuesday", today(), &Utc),
            Err(LedgerError::InvalidDate(_))
        ));
        assert!(parse_date("2025-13-40", today(), &Utc).is_err());
        assert!(parse_date("-3 days ago", today(), &Utc).is_err());
    }

    #[test]
    fn oversized_relative_dates_are_rejected() {
        for input in [
            "200000000000000 days ago",
            "2000000000000000000 weeks ago",
            "4000000000 months ago",
            "4294967295 weeks ago",
        ] {
            assert!(
                matches!(parse_date(input, today(), &Utc), Err(LedgerError::InvalidDate(_))),
                "{input}"
            );
        }
    }

    #[test]
    fn resolve_range_combinations() {
        assert_eq!(resolve_range(None, None, None, today(), &Utc).unwrap(), None);
        assert_eq!(
            resolve_range(Some("2025-01-10"), None, None, today(), &Utc).unwrap(),
            Some(ReportRange { start: date(2025, 1, 10), end: today() })
        );
        assert_eq!(
            resolve_range(None, None, Some(Period::Yesterday), today(), &Utc).unwrap(),
            Some(ReportRange::single(date(2025, 1, 15)))
        );
        assert!(matches!(
            resolve_range(Some("2025-01-16"), Some("2025-01-15"), None, today(), &Utc),
            Err(LedgerError::InvalidRange(_))
        ));
        assert!(resolve_range(None, Some("2025-01-15"), None, today(), &Utc).is_err());
        assert!(resolve_range(Some("today"), None, Some(Period::Today), today(), &Utc).is_err());
    }
}
