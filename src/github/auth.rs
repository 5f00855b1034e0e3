use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::github::client::API_ROOT;

/// How the run authenticates against GitHub: a personal access token used
/// directly, or GitHub App credentials exchanged for a short-lived
/// installation token. Both paths feed the same client.
pub enum AuthStrategy {
    Token(String),
    App {
        app_id: String,
        installation_id: u64,
        private_key_pem: String,
    },
}

#[derive(Serialize)]
struct AppClaims {
    iat: i64,
    exp: i64,
    iss: String,
}

#[derive(Deserialize)]
struct InstallationToken {
    token: String,
}

impl AuthStrategy {
    /// Turn the strategy into a bearer token.
    pub(crate) async fn resolve(self, http: &reqwest::Client) -> Result<String> {
        match self {
            AuthStrategy::Token(token) => Ok(token),
            AuthStrategy::App {
                app_id,
                installation_id,
                private_key_pem,
            } => {
                // App JWTs are capped at 10 minutes; backdate iat to absorb
                // clock skew.
                let now = Utc::now().timestamp();
                let claims = AppClaims {
                    iat: now - 60,
                    exp: now + 540,
                    iss: app_id,
                };
                let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())?;
                let jwt = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

                let url = format!("{API_ROOT}/app/installations/{installation_id}/access_tokens");
                let response = http
                    .post(&url)
                    .bearer_auth(jwt)
                    .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(ReportError::Auth(format!(
                        "installation token request failed ({status}): {body}"
                    )));
                }

                let token: InstallationToken = response.json().await?;
                Ok(token.token)
            }
        }
    }
}
