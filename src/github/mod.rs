pub mod auth;
pub mod client;
pub mod contents;
pub mod repos;
pub mod stats;

pub use auth::AuthStrategy;
pub use client::GithubClient;
pub use contents::{put_file, Committer};
pub use repos::list_org_repos;
pub use stats::fetch_code_frequency;
