use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Rate limited after {attempts} attempts")]
    RateLimited { attempts: u32 },
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Code frequency stats for '{repo}' still computing after {attempts} polls")]
    StatsNotReady { repo: String, attempts: u32 },
    #[error("Commit failed: {0}")]
    Commit(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("App token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
