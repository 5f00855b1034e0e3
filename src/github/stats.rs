use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::github::GithubClient;
use crate::model::WeeklyDelta;

/// GitHub computes code frequency lazily and answers 202 until the series
/// is ready. The poll loop is bounded so a repository that never settles
/// cannot block the run.
const MAX_POLLS: u32 = 10;
const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Fetch the weekly code frequency series for one repository. `Ok(None)`
/// means the repository has no stats (empty repo, or an empty series) and
/// should be skipped rather than reported.
pub async fn fetch_code_frequency(
    client: &GithubClient,
    org: &str,
    repo: &str,
) -> Result<Option<Vec<WeeklyDelta>>> {
    let path = format!("/repos/{org}/{repo}/stats/code_frequency");

    for attempt in 1..=MAX_POLLS {
        let response = client.get(&path).await?;
        match response.status() {
            StatusCode::ACCEPTED => {
                debug!("stats for {repo} still computing (poll {attempt}/{MAX_POLLS})");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            StatusCode::NO_CONTENT => return Ok(None),
            StatusCode::OK => {
                let rows: Vec<(i64, i64, i64)> = response.json().await?;
                if rows.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(rows.into_iter().map(WeeklyDelta::from).collect()));
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                return Err(ReportError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
        }
    }

    Err(ReportError::StatsNotReady {
        repo: repo.to_string(),
        attempts: MAX_POLLS,
    })
}
