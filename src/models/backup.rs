use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: ItemState,
    pub user: Author,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    #[serde(default)]
    pub body: Option<String>,
    pub user: Author,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub state: ItemState,
    #[serde(default)]
    pub merged: bool,
    pub user: Author,
    pub created_at: DateTime<Utc>,
    pub base: BranchRef,
    pub head: BranchRef,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchRef {
    #[serde(rename = "ref")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub user: Author,
    pub state: String,
    #[serde(default)]
    pub body: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

/// An export step may produce either a bare array or a wrapper object,
/// depending on whether the source repository had any items. Both shapes
/// are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IssueExport {
    List(Vec<IssueRecord>),
    Nested { issues: Vec<IssueRecord> },
}

impl IssueExport {
    pub fn into_records(self) -> Vec<IssueRecord> {
        match self {
            IssueExport::List(records) => records,
            IssueExport::Nested { issues } => issues,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PullExport {
    List(Vec<PullRequestRecord>),
    Nested {
        pull_requests: Vec<PullRequestRecord>,
    },
}

impl PullExport {
    pub fn into_records(self) -> Vec<PullRequestRecord> {
        match self {
            PullExport::List(records) => records,
            PullExport::Nested { pull_requests } => pull_requests,
        }
    }
}

/// Everything the backup holds for one repository: issue and PR records in
/// chronological source-creation order, plus the checkout used for the
/// content push (absent when the export skipped it).
#[derive(Debug, Clone)]
pub struct RepoBackup {
    pub name: String,
    pub issues: Vec<IssueRecord>,
    pub pulls: Vec<PullRequestRecord>,
    pub checkout: Option<PathBuf>,
}

impl RepoBackup {
    /// Migration complexity: total number of items to replay.
    pub fn item_count(&self) -> usize {
        self.issues.len() + self.pulls.len()
    }
}
