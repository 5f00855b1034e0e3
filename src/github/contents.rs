use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::github::GithubClient;

#[derive(Debug, Clone, Serialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
struct PutFilePayload<'a> {
    message: &'a str,
    content: String,
    committer: &'a Committer,
}

/// Create or update `path` in `owner/repo` via the contents API. Conflicts
/// are fatal; there is nothing sensible to retry once the report exists.
pub async fn put_file(
    client: &GithubClient,
    owner: &str,
    repo: &str,
    path: &str,
    content: &[u8],
    message: &str,
    committer: &Committer,
) -> Result<()> {
    let payload = PutFilePayload {
        message,
        content: BASE64.encode(content),
        committer,
    };

    let api_path = format!("/repos/{owner}/{repo}/contents/{path}");
    let response = client.put_json(&api_path, &payload).await?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::CONFLICT || status == StatusCode::UNPROCESSABLE_ENTITY {
        return Err(ReportError::Commit(format!(
            "conflict writing {path} ({status}): {body}"
        )));
    }
    Err(ReportError::Api {
        status: status.as_u16(),
        message: body,
    })
}
