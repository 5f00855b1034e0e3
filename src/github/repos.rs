use std::future::Future;

use serde::Deserialize;

use crate::error::Result;
use crate::github::GithubClient;
use crate::model::RepoDescriptor;

const REPOS_QUERY: &str = r#"
query ($owner: String!, $cursorID: String) {
  organization(login: $owner) {
    repositories(first: 100, after: $cursorID) {
      nodes {
        name
        createdAt
        primaryLanguage {
          name
        }
        languages(first: 100) {
          nodes {
            name
          }
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}
"#;

/// One page of the repository listing: the descriptors plus the cursor to
/// request the next page, if any.
pub struct RepoPage {
    pub repos: Vec<RepoDescriptor>,
    pub next_cursor: Option<String>,
}

/// Enumerate every repository in the organization, fully materialized,
/// preserving arrival order across pages. Any failure here is fatal to the
/// run; there is no partial-success mode at this stage.
pub async fn list_org_repos(client: &GithubClient, org: &str) -> Result<Vec<RepoDescriptor>> {
    collect_pages(|cursor| fetch_page(client, org, cursor)).await
}

/// Drive the cursor loop over a page-fetching function. Generic so the
/// pagination behavior is testable without a network.
pub async fn collect_pages<F, Fut>(mut fetch: F) -> Result<Vec<RepoDescriptor>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<RepoPage>>,
{
    let mut repos = Vec::new();
    let mut cursor = None;
    loop {
        let page = fetch(cursor.take()).await?;
        repos.extend(page.repos);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    Ok(repos)
}

#[derive(Deserialize)]
struct QueryData {
    organization: Organization,
}

#[derive(Deserialize)]
struct Organization {
    repositories: RepositoryConnection,
}

#[derive(Deserialize)]
struct RepositoryConnection {
    nodes: Vec<RepoNode>,
    #[serde(rename = "pageInfo")]
    page_info: PageInfo,
}

#[derive(Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct RepoNode {
    name: String,
    #[serde(rename = "createdAt")]
    created_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "primaryLanguage")]
    primary_language: Option<LanguageNode>,
    languages: Option<LanguageConnection>,
}

#[derive(Deserialize)]
struct LanguageNode {
    name: String,
}

#[derive(Deserialize)]
struct LanguageConnection {
    nodes: Vec<LanguageNode>,
}

async fn fetch_page(
    client: &GithubClient,
    org: &str,
    cursor: Option<String>,
) -> Result<RepoPage> {
    let vars = serde_json::json!({ "owner": org, "cursorID": cursor });
    let data: QueryData = client.graphql(REPOS_QUERY, vars).await?;
    let connection = data.organization.repositories;

    let repos = connection
        .nodes
        .into_iter()
        .map(|node| RepoDescriptor {
            name: node.name,
            created_at: node.created_at,
            primary_language: node.primary_language.map(|l| l.name),
            languages: node
                .languages
                .map(|c| c.nodes.into_iter().map(|l| l.name).collect())
                .unwrap_or_default(),
        })
        .collect();

    let next_cursor = if connection.page_info.has_next_page {
        connection.page_info.end_cursor
    } else {
        None
    };

    Ok(RepoPage { repos, next_cursor })
}
