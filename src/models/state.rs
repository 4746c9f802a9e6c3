use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root persisted object: the durable progress ledger for one migration
/// run, keyed by repository name. Serialized as pretty-printed JSON so an
/// operator can inspect it and force-skip or retry a repository by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationState {
    pub source_org: String,
    pub target_org: String,
    #[serde(default)]
    pub repositories: BTreeMap<String, RepoState>,
}

impl MigrationState {
    pub fn new(source_org: &str, target_org: &str) -> Self {
        Self {
            source_org: source_org.to_string(),
            target_org: target_org.to_string(),
            repositories: BTreeMap::new(),
        }
    }

    pub fn repo(&self, name: &str) -> Option<&RepoState> {
        self.repositories.get(name)
    }

    pub fn repo_mut(&mut self, name: &str) -> &mut RepoState {
        self.repositories
            .entry(name.to_string())
            .or_insert_with(|| RepoState::new(name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoStatus {
    Pending,
    RepoCreated,
    IssuesReplaying,
    IssuesDone,
    PrsDocumenting,
    Completed,
    Failed,
}

impl RepoStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RepoStatus::Completed | RepoStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoState {
    pub name: String,
    pub status: RepoStatus,
    #[serde(default)]
    pub issues: Vec<IssueState>,
    /// Number of pull requests documented so far; the resume index.
    #[serde(default)]
    pub prs_documented: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl RepoState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: RepoStatus::Pending,
            issues: Vec::new(),
            prs_documented: 0,
            failure: None,
        }
    }

    /// Forward-only status transition. Regressions and transitions out of a
    /// terminal status are ignored, which makes replays on resume no-ops.
    pub fn advance(&mut self, next: RepoStatus) -> bool {
        if self.status.is_terminal() || next <= self.status {
            return false;
        }
        self.status = next;
        true
    }

    /// `failed` is reachable from any non-terminal status.
    pub fn fail(&mut self, reason: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = RepoStatus::Failed;
        self.failure = Some(reason.to_string());
        true
    }

    pub fn issue(&self, source_number: u64) -> Option<&IssueState> {
        self.issues.iter().find(|i| i.source_number == source_number)
    }

    pub fn issue_mut(&mut self, source_number: u64) -> &mut IssueState {
        // Issues are appended in replay order, which is chronological
        // source-creation order; the list is never reordered.
        if let Some(idx) = self
            .issues
            .iter()
            .position(|i| i.source_number == source_number)
        {
            &mut self.issues[idx]
        } else {
            self.issues.push(IssueState::new(source_number));
            self.issues.last_mut().unwrap()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Pending,
    Created,
    Commented,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueState {
    pub source_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_number: Option<u64>,
    pub status: IssueStatus,
    #[serde(default)]
    pub comments_posted: usize,
}

impl IssueState {
    pub fn new(source_number: u64) -> Self {
        Self {
            source_number,
            target_number: None,
            status: IssueStatus::Pending,
            comments_posted: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_advances_forward_only() {
        let mut repo = RepoState::new("demo");
        assert!(repo.advance(RepoStatus::RepoCreated));
        assert!(repo.advance(RepoStatus::IssuesReplaying));
        assert!(!repo.advance(RepoStatus::RepoCreated));
        assert_eq!(repo.status, RepoStatus::IssuesReplaying);
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut repo = RepoState::new("demo");
        assert!(repo.fail("backup missing"));
        assert_eq!(repo.status, RepoStatus::Failed);
        assert!(!repo.advance(RepoStatus::Completed));
        assert!(!repo.fail("again"));
        assert_eq!(repo.failure.as_deref(), Some("backup missing"));
    }

    #[test]
    fn test_completed_cannot_fail() {
        let mut repo = RepoState::new("demo");
        repo.status = RepoStatus::Completed;
        assert!(!repo.fail("too late"));
        assert_eq!(repo.status, RepoStatus::Completed);
    }

    #[test]
    fn test_issue_mut_preserves_order() {
        let mut repo = RepoState::new("demo");
        repo.issue_mut(1).status = IssueStatus::Created;
        repo.issue_mut(2).status = IssueStatus::Created;
        repo.issue_mut(1).comments_posted = 1;
        let numbers: Vec<u64> = repo.issues.iter().map(|i| i.source_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }
}
