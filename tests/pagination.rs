use std::collections::HashSet;

use chrono::Utc;
use pretty_assertions::assert_eq;

use freqreport::github::repos::{collect_pages, RepoPage};
use freqreport::model::RepoDescriptor;

fn descriptor(name: String) -> RepoDescriptor {
    RepoDescriptor {
        name,
        created_at: Utc::now(),
        primary_language: None,
        languages: vec![],
    }
}

fn page(start: usize, count: usize, next_cursor: Option<&str>) -> RepoPage {
    RepoPage {
        repos: (start..start + count)
            .map(|i| descriptor(format!("repo-{i:03}")))
            .collect(),
        next_cursor: next_cursor.map(str::to_string),
    }
}

#[tokio::test]
async fn three_pages_yield_every_repo_exactly_once() {
    let mut calls = 0usize;
    let repos = collect_pages(|cursor| {
        let page = match calls {
            0 => {
                assert_eq!(cursor, None);
                page(0, 100, Some("cursor-1"))
            }
            1 => {
                assert_eq!(cursor.as_deref(), Some("cursor-1"));
                page(100, 100, Some("cursor-2"))
            }
            2 => {
                assert_eq!(cursor.as_deref(), Some("cursor-2"));
                page(200, 50, None)
            }
            n => panic!("unexpected fourth page request ({n})"),
        };
        calls += 1;
        async move { Ok(page) }
    })
    .await
    .unwrap();

    assert_eq!(calls, 3);
    assert_eq!(repos.len(), 250);

    let unique: HashSet<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(unique.len(), 250);

    // Arrival order is preserved across pages.
    assert_eq!(repos[0].name, "repo-000");
    assert_eq!(repos[249].name, "repo-249");
}

#[tokio::test]
async fn single_empty_page_yields_no_repos() {
    let repos = collect_pages(|_| async { Ok(page(0, 0, None)) })
        .await
        .unwrap();
    assert!(repos.is_empty());
}

#[tokio::test]
async fn page_errors_abort_enumeration() {
    let result = collect_pages(|_| async {
        Err(freqreport::error::ReportError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        })
    })
    .await;
    assert!(result.is_err());
}
