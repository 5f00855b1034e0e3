use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::error::Result;
use crate::model::{SummaryRecord, WindowSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    /// Lines added in the window
    Additions,
    /// Lines deleted in the window
    Deletions,
    /// All time lines added
    AlltimeAdditions,
    /// All time lines deleted
    AlltimeDeletions,
    /// Repository name
    Name,
    /// Repository creation date
    Created,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Stable sort by the configured key. Numeric keys compare numerically;
/// records with equal keys keep their input order.
pub fn sort_records(records: &mut [SummaryRecord], key: SortKey, order: SortOrder) {
    let compare = |a: &SummaryRecord, b: &SummaryRecord| -> Ordering {
        match key {
            SortKey::Additions => a.window_additions.cmp(&b.window_additions),
            SortKey::Deletions => a.window_deletions.cmp(&b.window_deletions),
            SortKey::AlltimeAdditions => a.all_time_additions.cmp(&b.all_time_additions),
            SortKey::AlltimeDeletions => a.all_time_deletions.cmp(&b.all_time_deletions),
            SortKey::Name => a.repo_name.cmp(&b.repo_name),
            SortKey::Created => a.created_date.cmp(&b.created_date),
        }
    };

    match order {
        SortOrder::Asc => records.sort_by(compare),
        SortOrder::Desc => records.sort_by(|a, b| compare(b, a)),
    }
}

/// Render the records as RFC 4180 CSV with human-readable headers; the two
/// window-scoped headers interpolate the window label.
pub fn build_csv(records: &[SummaryRecord], spec: &WindowSpec) -> Result<Vec<u8>> {
    let label = spec.column_label();
    let mut writer = csv::Writer::from_writer(Vec::new());

    let added_header = format!("Lines added ({label})");
    let deleted_header = format!("Lines deleted ({label})");
    writer.write_record([
        "Repository",
        added_header.as_str(),
        deleted_header.as_str(),
        "All time lines added",
        "All time lines deleted",
        "Primary language",
        "All languages",
        "Repo creation date",
    ])?;

    for record in records {
        let window_additions = record.window_additions.to_string();
        let window_deletions = record.window_deletions.to_string();
        let all_time_additions = record.all_time_additions.to_string();
        let all_time_deletions = record.all_time_deletions.to_string();
        let all_languages = record.all_languages.join(", ");
        writer.write_record([
            record.repo_name.as_str(),
            window_additions.as_str(),
            window_deletions.as_str(),
            all_time_additions.as_str(),
            all_time_deletions.as_str(),
            record.primary_language.as_deref().unwrap_or(""),
            all_languages.as_str(),
            record.created_date.as_str(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::error::ReportError::Io(e.into_error()))
}

/// Path of the committed report:
/// `reports/{org}-{ISO8601 timestamp}-{windowOrRangeLabel}.csv`.
pub fn report_path(org: &str, now: DateTime<Utc>, spec: &WindowSpec) -> String {
    format!(
        "reports/{org}-{}Z-{}.csv",
        now.format("%Y-%m-%dT%H:%M:%S"),
        spec.file_label()
    )
}

pub fn commit_message(now: DateTime<Utc>) -> String {
    format!("{} Git audit-log report", now.format("%Y-%m-%d"))
}
