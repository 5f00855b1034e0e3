use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WEEKS: u32 = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoDescriptor {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub primary_language: Option<String>,
    pub languages: Vec<String>,
}

/// One week of the code frequency series, as delivered by GitHub:
/// `deletions` is a negative magnitude.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WeeklyDelta {
    pub week_start: i64,
    pub additions: i64,
    pub deletions: i64,
}

impl From<(i64, i64, i64)> for WeeklyDelta {
    fn from((week_start, additions, deletions): (i64, i64, i64)) -> Self {
        Self { week_start, additions, deletions }
    }
}

/// Columnwise sums over a slice of weekly deltas, deletions reported as a
/// positive magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Totals {
    pub additions: u64,
    pub deletions: u64,
}

/// Which part of each repository's series is summed for the windowed
/// columns. Resolved once per run from the configuration and passed by
/// value through aggregation and report building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowSpec {
    LastWeeks(u32),
    Range { from: NaiveDate, to: NaiveDate },
}

impl WindowSpec {
    /// Resolve the window from raw configuration values. A date range is
    /// used only when both bounds are present and parse as `YYYY-MM-DD`;
    /// otherwise a trailing-weeks window, with a lenient fallback to
    /// [`DEFAULT_WEEKS`] when `weeks` is absent or not an integer.
    pub fn resolve(weeks: Option<&str>, from: Option<&str>, to: Option<&str>) -> Self {
        if let (Some(from), Some(to)) = (from, to) {
            let parsed = (
                NaiveDate::parse_from_str(from, "%Y-%m-%d"),
                NaiveDate::parse_from_str(to, "%Y-%m-%d"),
            );
            if let (Ok(from), Ok(to)) = parsed {
                return WindowSpec::Range { from, to };
            }
        }

        let weeks = weeks
            .and_then(|w| w.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_WEEKS);
        WindowSpec::LastWeeks(weeks)
    }

    /// Inclusive `[from, to]` bounds in Unix seconds at UTC midnight, for
    /// range windows.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match self {
            WindowSpec::LastWeeks(_) => None,
            WindowSpec::Range { from, to } => {
                let from = from.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
                let to = to.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
                Some((from, to))
            }
        }
    }

    /// Label interpolated into the windowed CSV column headers.
    pub fn column_label(&self) -> String {
        match self {
            WindowSpec::LastWeeks(weeks) => format!("<{weeks} weeks"),
            WindowSpec::Range { from, to } => format!("{from} to {to}"),
        }
    }

    /// Label embedded in the report filename.
    pub fn file_label(&self) -> String {
        match self {
            WindowSpec::LastWeeks(weeks) => format!("{weeks}-weeks"),
            WindowSpec::Range { from, to } => format!("{from}-to-{to}"),
        }
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        WindowSpec::LastWeeks(DEFAULT_WEEKS)
    }
}

/// One report row: a repository's descriptor fields merged with its
/// windowed and all-time totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub repo_name: String,
    pub window_additions: u64,
    pub window_deletions: u64,
    pub all_time_additions: u64,
    pub all_time_deletions: u64,
    pub primary_language: Option<String>,
    pub all_languages: Vec<String>,
    pub created_date: String,
}
