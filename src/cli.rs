use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use console::style;
use std::path::PathBuf;

use crate::aggregate;
use crate::github::{self, AuthStrategy, Committer, GithubClient};
use crate::model::WindowSpec;
use crate::report::{self, SortKey, SortOrder};

#[derive(Parser)]
#[command(name = "freqreport")]
#[command(about = "Code frequency CSV reports for a whole GitHub organization")]
#[command(version)]
pub struct Cli {
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, help = "GitHub token for API access")]
    pub token: Option<String>,

    #[arg(long, env = "FREQREPORT_ORG", help = "Organization to report on")]
    pub org: String,

    #[arg(long, help = "Trailing weeks to sum (default 4; non-integers fall back to the default)")]
    pub weeks: Option<String>,

    #[arg(long, help = "Window start date (YYYY-MM-DD); used only together with --to-date")]
    pub from_date: Option<String>,

    #[arg(long, help = "Window end date (YYYY-MM-DD); used only together with --from-date")]
    pub to_date: Option<String>,

    #[arg(long, value_enum, default_value_t = SortKey::Additions, help = "Column to sort by")]
    pub sort: SortKey,

    #[arg(long, value_enum, default_value_t = SortOrder::Desc, help = "Sort direction")]
    pub sort_order: SortOrder,

    #[arg(long, default_value = "github-actions", help = "Committer name for the report commit")]
    pub committer_name: String,

    #[arg(long, default_value = "github-actions@github.com", help = "Committer email for the report commit")]
    pub committer_email: String,

    #[arg(long, env = "GITHUB_REPOSITORY", help = "Repository receiving the report, as owner/name")]
    pub report_repo: Option<String>,

    #[arg(long, help = "Write the CSV to this local path instead of committing it")]
    pub out: Option<PathBuf>,

    #[arg(long, env = "FREQREPORT_APP_ID", help = "GitHub App id (app auth)")]
    pub app_id: Option<String>,

    #[arg(long, env = "FREQREPORT_INSTALLATION_ID", help = "GitHub App installation id (app auth)")]
    pub installation_id: Option<u64>,

    #[arg(long, env = "FREQREPORT_PRIVATE_KEY", help = "Path to the GitHub App private key PEM (app auth)")]
    pub private_key: Option<PathBuf>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub async fn execute(self) -> Result<()> {
        let auth = self.auth_strategy()?;
        let spec = WindowSpec::resolve(
            self.weeks.as_deref(),
            self.from_date.as_deref(),
            self.to_date.as_deref(),
        );

        // Validate the destination before spending API quota on the run.
        if self.out.is_none() {
            self.report_target()?;
        }

        let client = GithubClient::connect(auth)
            .await
            .context("Failed to authenticate with GitHub")?;

        println!(
            "Retrieving repository code frequency data for the {} organization:",
            style(&self.org).bold()
        );

        let repos = github::list_org_repos(&client, &self.org)
            .await
            .context("Failed to enumerate organization repositories")?;
        let repo_count = repos.len();

        let mut records = aggregate::summarize_all(&client, &self.org, &repos, &spec).await;
        report::sort_records(&mut records, self.sort, self.sort_order);

        let csv = report::build_csv(&records, &spec).context("Failed to render CSV report")?;
        let now = Utc::now();

        if let Some(path) = &self.out {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, &csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Report written to {}", style(path.display()).cyan());
        } else {
            let (owner, repo) = self.report_target()?;
            let report_path = report::report_path(&self.org, now, &spec);
            let committer = Committer {
                name: self.committer_name.clone(),
                email: self.committer_email.clone(),
            };

            println!(
                "Pushing final CSV report to repository path: {}",
                style(&report_path).cyan()
            );
            github::put_file(
                &client,
                owner,
                repo,
                &report_path,
                &csv,
                &report::commit_message(now),
                &committer,
            )
            .await
            .context("Failed to commit the report")?;
        }

        println!(
            "{} repositories scanned, {} reported ({} skipped)",
            style(repo_count).cyan(),
            style(records.len()).green(),
            style(repo_count - records.len()).yellow()
        );
        Ok(())
    }

    fn auth_strategy(&self) -> Result<AuthStrategy> {
        if let (Some(app_id), Some(installation_id), Some(key_path)) =
            (&self.app_id, self.installation_id, &self.private_key)
        {
            let private_key_pem = std::fs::read_to_string(key_path)
                .with_context(|| format!("Failed to read {}", key_path.display()))?;
            return Ok(AuthStrategy::App {
                app_id: app_id.clone(),
                installation_id,
                private_key_pem,
            });
        }

        match &self.token {
            Some(token) => Ok(AuthStrategy::Token(token.clone())),
            None => bail!(
                "no credentials: pass --token or the --app-id/--installation-id/--private-key triple"
            ),
        }
    }

    fn report_target(&self) -> Result<(&str, &str)> {
        let target = self.report_repo.as_deref().context(
            "no report destination: pass --report-repo owner/name, or --out for a local file",
        )?;
        parse_report_target(target)
            .with_context(|| format!("invalid --report-repo '{target}', expected owner/name"))
    }
}

/// Split a `owner/name` destination, rejecting empty halves and anything
/// with a deeper path (the contents API would silently misroute it).
pub fn parse_report_target(target: &str) -> Option<(&str, &str)> {
    let (owner, repo) = target.split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}
