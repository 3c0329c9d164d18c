use crate::search::SearchNode;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A flat row of one of the CSV exports
pub(crate) trait Record: Serialize {
    /// Column names, in the order the fields are serialized
    const HEADER: &'static [&'static str];
}

/// A row of the authored-items export
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct IssueOrPrRecord {
    #[serde(rename = "ID")]
    pub(crate) id: u64,
    pub(crate) title: String,
    pub(crate) repository: String,
    pub(crate) owner: String,
    #[serde(rename = "URL")]
    pub(crate) url: String,
    #[serde(rename = "IsPR")]
    pub(crate) is_pr: bool,
    pub(crate) is_issue: bool,
    pub(crate) merged: bool,
    pub(crate) created_at: String,
}

impl Record for IssueOrPrRecord {
    const HEADER: &'static [&'static str] = &[
        "ID",
        "Title",
        "Repository",
        "Owner",
        "URL",
        "IsPR",
        "IsIssue",
        "Merged",
        "CreatedAt",
    ];
}

// `is_pr` and `is_issue` are independent substring tests, so a URL can set
// both or neither.
impl From<SearchNode> for IssueOrPrRecord {
    fn from(node: SearchNode) -> IssueOrPrRecord {
        IssueOrPrRecord {
            id: node.number,
            is_pr: node.url.contains("pull"),
            is_issue: node.url.contains("issue"),
            merged: node.merged,
            created_at: format_timestamp(node.created_at),
            repository: node.repository.name,
            owner: node.repository.owner.login,
            title: node.title,
            url: node.url,
        }
    }
}

/// A row of the reviewed-items export
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ReviewRecord {
    pub(crate) title: String,
    pub(crate) repository: String,
    pub(crate) owner: String,
    #[serde(rename = "URL")]
    pub(crate) url: String,
}

impl Record for ReviewRecord {
    const HEADER: &'static [&'static str] = &["Title", "Repository", "Owner", "URL"];
}

impl From<SearchNode> for ReviewRecord {
    fn from(node: SearchNode) -> ReviewRecord {
        ReviewRecord {
            title: node.title,
            repository: node.repository.name,
            owner: node.repository.owner.login,
            url: node.url,
        }
    }
}

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS` in UTC
pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}
