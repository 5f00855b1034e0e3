use std::time::Duration;

use reqwest::header::{HeaderValue, ACCEPT, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ReportError, Result};
use crate::github::auth::AuthStrategy;

pub(crate) const API_ROOT: &str = "https://api.github.com";
const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = concat!("freqreport/", env!("CARGO_PKG_VERSION"));
const ACCEPT_JSON: &str = "application/vnd.github+json";

const MAX_ATTEMPTS: u32 = 3;
/// Fallback wait on rate-limit responses that carry no `Retry-After`.
const BACKOFF_UNIT: Duration = Duration::from_secs(180);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Authenticated GitHub API client shared read-only across all concurrent
/// aggregation calls. Requests pass through a retry wrapper that sleeps on
/// rate-limit and transient failures, up to [`MAX_ATTEMPTS`].
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
}

impl GithubClient {
    /// Build the HTTP client and resolve the auth strategy into a bearer
    /// token (a PAT as-is, or an App installation token).
    pub async fn connect(auth: AuthStrategy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let token = auth.resolve(&http).await?;
        Ok(Self { http, token })
    }

    /// GET a REST path (relative to the API root) and return the raw
    /// response; callers inspect the status (the stats endpoint signals
    /// "still computing" with 202).
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{API_ROOT}{path}");
        let req = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, ACCEPT_JSON);
        self.send_with_retry(req).await
    }

    /// PUT a JSON body to a REST path and return the raw response.
    pub async fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Response> {
        let url = format!("{API_ROOT}{path}");
        let req = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(ACCEPT, ACCEPT_JSON)
            .json(body);
        self.send_with_retry(req).await
    }

    /// Execute a GraphQL query and deserialize the `data` field, surfacing
    /// GraphQL-level errors as [`ReportError::Api`].
    pub async fn graphql<V: Serialize, T: DeserializeOwned>(
        &self,
        query: &str,
        variables: V,
    ) -> Result<T> {
        #[derive(Serialize)]
        struct Payload<'a, V> {
            query: &'a str,
            variables: V,
        }

        #[derive(Deserialize)]
        struct Envelope<T> {
            data: Option<T>,
            errors: Option<Vec<GraphqlError>>,
        }

        #[derive(Deserialize)]
        struct GraphqlError {
            message: String,
        }

        let req = self
            .http
            .post(GRAPHQL_URL)
            .bearer_auth(&self.token)
            .json(&Payload { query, variables });
        let response = self.send_with_retry(req).await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ReportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = response.json().await?;
        if let Some(errors) = envelope.errors {
            let message = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ReportError::Api { status: 200, message });
        }

        envelope.data.ok_or_else(|| ReportError::Api {
            status: 200,
            message: "GraphQL response carried no data".to_string(),
        })
    }

    async fn send_with_retry(&self, req: RequestBuilder) -> Result<Response> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let this_try = req.try_clone().ok_or_else(|| ReportError::Api {
                status: 0,
                message: "request body is not retryable".to_string(),
            })?;

            let response = match this_try.send().await {
                Ok(response) => response,
                Err(err) if attempt < MAX_ATTEMPTS && (err.is_connect() || err.is_timeout()) => {
                    warn!("transient HTTP failure (attempt {attempt}): {err}, retrying");
                    tokio::time::sleep(transient_backoff(attempt)).await;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let status = response.status();
            match classify(status, throttle_hinted(&response)) {
                Disposition::CredentialFailure => {
                    return Err(ReportError::Auth(format!(
                        "GitHub rejected the credentials ({status})"
                    )));
                }
                Disposition::RateLimited => {
                    if attempt >= MAX_ATTEMPTS {
                        return Err(ReportError::RateLimited { attempts: attempt });
                    }
                    let wait = retry_after(&response).unwrap_or(BACKOFF_UNIT);
                    warn!(
                        "request quota exhausted for {} (attempt {attempt}), retrying after {}s",
                        response.url(),
                        wait.as_secs()
                    );
                    tokio::time::sleep(wait).await;
                }
                Disposition::Transient if attempt < MAX_ATTEMPTS => {
                    warn!(
                        "GitHub returned {status} for {} (attempt {attempt}), retrying",
                        response.url()
                    );
                    tokio::time::sleep(transient_backoff(attempt)).await;
                }
                Disposition::Transient | Disposition::Proceed => return Ok(response),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Proceed,
    RateLimited,
    Transient,
    CredentialFailure,
}

/// Map a response status to what the retry loop should do with it.
/// `throttled` is true when the rate-limit/abuse headers mark a 403 as
/// throttling; a 403 without those hints is a credential failure, as is
/// any 401.
fn classify(status: StatusCode, throttled: bool) -> Disposition {
    if status == StatusCode::UNAUTHORIZED {
        return Disposition::CredentialFailure;
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Disposition::RateLimited;
    }
    if status == StatusCode::FORBIDDEN {
        return if throttled {
            Disposition::RateLimited
        } else {
            Disposition::CredentialFailure
        };
    }
    if status.is_server_error() {
        return Disposition::Transient;
    }
    Disposition::Proceed
}

fn throttle_hinted(response: &Response) -> bool {
    let remaining_zero = response
        .headers()
        .get("x-ratelimit-remaining")
        .map(|v| v == HeaderValue::from_static("0"))
        .unwrap_or(false);
    remaining_zero || response.headers().contains_key(RETRY_AFTER)
}

fn retry_after(response: &Response) -> Option<Duration> {
    let secs = response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(secs))
}

fn transient_backoff(attempt: u32) -> Duration {
    Duration::from_secs(2u64.saturating_pow(attempt))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_forbidden_is_a_credential_failure() {
        assert_eq!(
            classify(StatusCode::FORBIDDEN, false),
            Disposition::CredentialFailure
        );
        assert_eq!(
            classify(StatusCode::UNAUTHORIZED, false),
            Disposition::CredentialFailure
        );
    }

    #[test]
    fn throttled_forbidden_and_429_are_retried_as_rate_limits() {
        assert_eq!(classify(StatusCode::FORBIDDEN, true), Disposition::RateLimited);
        assert_eq!(
            classify(StatusCode::TOO_MANY_REQUESTS, false),
            Disposition::RateLimited
        );
    }

    #[test]
    fn server_errors_are_transient_and_the_rest_pass_through() {
        assert_eq!(classify(StatusCode::BAD_GATEWAY, false), Disposition::Transient);
        assert_eq!(classify(StatusCode::OK, false), Disposition::Proceed);
        // Client errors other than auth/throttling are the caller's to
        // interpret (202 drives the stats poll, 404/422 surface as API
        // errors).
        assert_eq!(classify(StatusCode::NOT_FOUND, false), Disposition::Proceed);
        assert_eq!(classify(StatusCode::ACCEPTED, false), Disposition::Proceed);
    }
}
