use std::future::Future;

use futures_util::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::error::Result;
use crate::github::{self, GithubClient};
use crate::model::{RepoDescriptor, SummaryRecord, Totals, WeeklyDelta, WindowSpec};

/// Repositories aggregated in flight at once. The buffered stream preserves
/// input order, so report ordering never depends on response arrival order.
const MAX_CONCURRENT_REPOS: usize = 8;

/// Select the sub-slice of the series covered by the window: a trailing
/// suffix for `LastWeeks`, or the contiguous run of weeks inside the
/// inclusive `[from, to]` bounds for `Range`. Relies on the series being
/// ordered by `week_start` ascending.
pub fn select_window<'a>(series: &'a [WeeklyDelta], spec: &WindowSpec) -> &'a [WeeklyDelta] {
    match spec.bounds() {
        None => {
            let weeks = match spec {
                WindowSpec::LastWeeks(weeks) => *weeks as usize,
                WindowSpec::Range { .. } => unreachable!("range windows always have bounds"),
            };
            &series[series.len().saturating_sub(weeks)..]
        }
        Some((from, to)) => {
            let start = series.partition_point(|d| d.week_start < from);
            let end = series.partition_point(|d| d.week_start <= to);
            &series[start..end.max(start)]
        }
    }
}

/// Columnwise sums over the deltas; the raw series stores deletions as
/// negative numbers, the totals report them as positive magnitudes. An
/// empty slice reduces to `(0, 0)`.
pub fn reduce(deltas: &[WeeklyDelta]) -> Totals {
    let additions: i64 = deltas.iter().map(|d| d.additions).sum();
    let deletions: i64 = deltas.iter().map(|d| d.deletions).sum();
    Totals {
        additions: additions.max(0) as u64,
        deletions: deletions.unsigned_abs(),
    }
}

/// Merge a repository's descriptor with the windowed and all-time
/// reductions of its series.
pub fn summarize(
    repo: &RepoDescriptor,
    series: &[WeeklyDelta],
    spec: &WindowSpec,
) -> SummaryRecord {
    let window = reduce(select_window(series, spec));
    let all_time = reduce(series);

    SummaryRecord {
        repo_name: repo.name.clone(),
        window_additions: window.additions,
        window_deletions: window.deletions,
        all_time_additions: all_time.additions,
        all_time_deletions: all_time.deletions,
        primary_language: repo.primary_language.clone(),
        all_languages: repo.languages.clone(),
        created_date: repo.created_at.format("%Y-%m-%d").to_string(),
    }
}

/// Aggregate every repository concurrently (bounded, order-preserving).
/// A repository whose fetch fails after retries is logged and skipped so
/// one bad repository cannot sink the whole report.
pub async fn summarize_all(
    client: &GithubClient,
    org: &str,
    repos: &[RepoDescriptor],
    spec: &WindowSpec,
) -> Vec<SummaryRecord> {
    summarize_with(repos, spec, |repo| {
        github::fetch_code_frequency(client, org, &repo.name)
    })
    .await
}

/// Drive aggregation over a per-repository fetch function. Generic so the
/// skip behavior (no data, exhausted retries) is testable without a
/// network.
pub async fn summarize_with<'a, F, Fut>(
    repos: &'a [RepoDescriptor],
    spec: &WindowSpec,
    mut fetch: F,
) -> Vec<SummaryRecord>
where
    F: FnMut(&'a RepoDescriptor) -> Fut,
    Fut: Future<Output = Result<Option<Vec<WeeklyDelta>>>>,
{
    let bar = ProgressBar::new(repos.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:30.green} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message("Fetching code frequency");

    let outcomes: Vec<_> = stream::iter(repos)
        .map(|repo| {
            let bar = bar.clone();
            let fetched = fetch(repo);
            async move {
                let outcome = fetched
                    .await
                    .map(|maybe| maybe.map(|series| summarize(repo, &series, spec)));
                bar.inc(1);
                (repo.name.clone(), outcome)
            }
        })
        .buffered(MAX_CONCURRENT_REPOS)
        .collect()
        .await;
    bar.finish_and_clear();

    outcomes
        .into_iter()
        .filter_map(|(name, outcome)| match outcome {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                debug!("no code frequency data for {name}, skipping");
                None
            }
            Err(err) => {
                warn!("skipping {name}: {err}");
                None
            }
        })
        .collect()
}
