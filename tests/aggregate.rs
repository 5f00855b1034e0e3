use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;

use freqreport::aggregate::{reduce, select_window, summarize, summarize_with};
use freqreport::error::ReportError;
use freqreport::model::{RepoDescriptor, Totals, WeeklyDelta, WindowSpec};

fn wd(week_start: i64, additions: i64, deletions: i64) -> WeeklyDelta {
    WeeklyDelta { week_start, additions, deletions }
}

fn descriptor(name: &str) -> RepoDescriptor {
    RepoDescriptor {
        name: name.to_string(),
        created_at: Utc.with_ymd_and_hms(2021, 3, 14, 9, 26, 53).unwrap(),
        primary_language: Some("Rust".to_string()),
        languages: vec!["Rust".to_string(), "Shell".to_string()],
    }
}

#[test]
fn empty_reduction_is_zero() {
    assert_eq!(reduce(&[]), Totals { additions: 0, deletions: 0 });
}

#[test]
fn deletions_are_reported_as_positive_magnitudes() {
    let series = [wd(0, 10, -3), wd(604_800, 5, -2)];
    assert_eq!(reduce(&series), Totals { additions: 15, deletions: 5 });
}

#[test]
fn last_weeks_window_is_a_suffix() {
    let series = [wd(0, 1, -1), wd(604_800, 2, -2), wd(1_209_600, 3, -3)];

    let window = select_window(&series, &WindowSpec::LastWeeks(2));
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].week_start, 604_800);

    // More weeks than history: the whole series.
    let window = select_window(&series, &WindowSpec::LastWeeks(10));
    assert_eq!(window.len(), 3);
}

#[test]
fn all_time_totals_dominate_suffix_window_totals() {
    let series = [wd(0, 100, -20), wd(604_800, 50, -10), wd(1_209_600, 7, -4)];
    let window = reduce(select_window(&series, &WindowSpec::LastWeeks(2)));
    let all_time = reduce(&series);
    assert!(all_time.additions >= window.additions);
    assert!(all_time.deletions >= window.deletions);
}

#[test]
fn date_range_is_inclusive_at_both_bounds() {
    // 1970-01-01 and 1970-01-08 at UTC midnight are exactly weeks 0 and
    // 604800 of the epoch.
    let spec = WindowSpec::resolve(None, Some("1970-01-01"), Some("1970-01-08"));
    let series = [wd(0, 1, -1), wd(604_800, 2, -2), wd(1_209_600, 4, -4)];

    let window = select_window(&series, &spec);
    assert_eq!(window.len(), 2);
    assert_eq!(reduce(window), Totals { additions: 3, deletions: 3 });
}

#[test]
fn date_range_outside_history_reduces_to_zero() {
    let spec = WindowSpec::resolve(None, Some("2050-01-01"), Some("2050-02-01"));
    let series = [wd(0, 100, -20), wd(604_800, 50, -10)];

    let window = select_window(&series, &spec);
    assert!(window.is_empty());
    assert_eq!(reduce(window), Totals { additions: 0, deletions: 0 });
}

#[test]
fn summarize_merges_descriptor_and_reductions() {
    let series = [wd(0, 100, -20), wd(604_800, 50, -10)];
    let record = summarize(&descriptor("widget"), &series, &WindowSpec::LastWeeks(1));

    assert_eq!(record.repo_name, "widget");
    assert_eq!(record.window_additions, 50);
    assert_eq!(record.window_deletions, 10);
    assert_eq!(record.all_time_additions, 150);
    assert_eq!(record.all_time_deletions, 30);
    assert_eq!(record.primary_language.as_deref(), Some("Rust"));
    assert_eq!(record.created_date, "2021-03-14");
}

#[tokio::test]
async fn repos_without_data_or_with_failed_fetches_are_omitted() {
    let repos = vec![descriptor("alpha"), descriptor("beta"), descriptor("gamma")];
    let spec = WindowSpec::LastWeeks(1);

    let records = summarize_with(&repos, &spec, |repo| {
        let outcome = match repo.name.as_str() {
            "alpha" => Ok(Some(vec![wd(0, 100, -20), wd(604_800, 50, -10)])),
            // No code frequency data at all.
            "beta" => Ok(None),
            // Stats never settled; aggregation of the others must survive.
            _ => Err(ReportError::StatsNotReady {
                repo: repo.name.clone(),
                attempts: 10,
            }),
        };
        async move { outcome }
    })
    .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].repo_name, "alpha");
    assert_eq!(records[0].window_additions, 50);
    assert_eq!(records[0].window_deletions, 10);
    assert_eq!(records[0].all_time_additions, 150);
    assert_eq!(records[0].all_time_deletions, 30);
}

#[test]
fn weeks_value_falls_back_to_default_when_not_an_integer() {
    assert_eq!(WindowSpec::resolve(None, None, None), WindowSpec::LastWeeks(4));
    assert_eq!(WindowSpec::resolve(Some("six"), None, None), WindowSpec::LastWeeks(4));
    assert_eq!(WindowSpec::resolve(Some(" 12 "), None, None), WindowSpec::LastWeeks(12));
}

#[test]
fn range_requires_both_dates_to_parse() {
    // A broken bound falls back to the weeks window instead of erroring.
    let spec = WindowSpec::resolve(Some("2"), Some("2024-01-01"), Some("soon"));
    assert_eq!(spec, WindowSpec::LastWeeks(2));

    let spec = WindowSpec::resolve(Some("2"), Some("2024-01-01"), None);
    assert_eq!(spec, WindowSpec::LastWeeks(2));
}

#[test]
fn window_labels() {
    assert_eq!(WindowSpec::LastWeeks(4).column_label(), "<4 weeks");
    assert_eq!(WindowSpec::LastWeeks(4).file_label(), "4-weeks");

    let spec = WindowSpec::resolve(None, Some("2024-01-01"), Some("2024-02-01"));
    assert_eq!(spec.column_label(), "2024-01-01 to 2024-02-01");
    assert_eq!(spec.file_label(), "2024-01-01-to-2024-02-01");
}
