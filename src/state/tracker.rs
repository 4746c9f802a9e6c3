//! Durable progress ledger.
//!
//! Every successful external call is recorded with one `record` call,
//! which completes its write to disk before returning. The ledger, not
//! the remote side, is the single source of truth for what has already
//! happened; resume decisions are derived from it alone.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{
    IssueRecord, IssueState, IssueStatus, ItemState, MigrationState, RepoStatus,
};

/// One recordable outcome of an external call.
#[derive(Debug)]
pub enum MigrationEvent<'a> {
    RepoCreated { repo: &'a str },
    RepoAlreadyExisted { repo: &'a str },
    IssueCreated { repo: &'a str, source: u64, target: u64 },
    CommentPosted { repo: &'a str, source: u64 },
    IssueClosed { repo: &'a str, source: u64 },
    PrDocumented { repo: &'a str, number: u64 },
    RepoFailed { repo: &'a str, reason: String },
}

/// The exact continuation point for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePoint {
    pub status: RepoStatus,
    /// Index into the ordered issue list of the first unfinished issue.
    pub next_issue: usize,
    /// Index of the first unposted comment within that issue.
    pub next_comment: usize,
    /// Index of the first undocumented pull request.
    pub next_pr: usize,
}

#[derive(Debug)]
pub struct StateTracker {
    path: PathBuf,
    state: MigrationState,
}

impl StateTracker {
    /// Loads persisted state, or initializes a fresh ledger if the file
    /// does not exist yet. A file recorded for a different org pair means
    /// the operator pointed at the wrong ledger; refuse to touch it.
    pub fn load<P: AsRef<Path>>(path: P, source_org: &str, target_org: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let state = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::State(format!("cannot read {}: {}", path.display(), e)))?;
            let state: MigrationState = serde_json::from_str(&content)
                .map_err(|e| Error::State(format!("malformed {}: {}", path.display(), e)))?;

            if state.source_org != source_org || state.target_org != target_org {
                return Err(Error::State(format!(
                    "{} records a {} -> {} migration, not {} -> {}",
                    path.display(),
                    state.source_org,
                    state.target_org,
                    source_org,
                    target_org
                )));
            }
            tracing::info!(
                "Resuming from {} ({} repositories tracked)",
                path.display(),
                state.repositories.len()
            );
            state
        } else {
            tracing::info!("No state file at {}, starting fresh", path.display());
            MigrationState::new(source_org, target_org)
        };

        Ok(Self { path, state })
    }

    pub fn state(&self) -> &MigrationState {
        &self.state
    }

    pub fn repo_status(&self, name: &str) -> RepoStatus {
        self.state
            .repo(name)
            .map(|r| r.status)
            .unwrap_or(RepoStatus::Pending)
    }

    pub fn is_completed(&self, name: &str) -> bool {
        self.repo_status(name) == RepoStatus::Completed
    }

    pub fn is_failed(&self, name: &str) -> bool {
        self.repo_status(name) == RepoStatus::Failed
    }

    pub fn issue_target(&self, repo: &str, source: u64) -> Option<u64> {
        self.state.repo(repo)?.issue(source)?.target_number
    }

    pub fn prs_documented(&self, repo: &str) -> usize {
        self.state.repo(repo).map(|r| r.prs_documented).unwrap_or(0)
    }

    /// Applies one event and completes the durable write before
    /// returning. No batching: resume correctness depends on one write
    /// per recorded operation.
    pub fn record(&mut self, event: MigrationEvent<'_>) -> Result<()> {
        match event {
            MigrationEvent::RepoCreated { repo } | MigrationEvent::RepoAlreadyExisted { repo } => {
                self.state.repo_mut(repo).advance(RepoStatus::RepoCreated);
            }
            MigrationEvent::IssueCreated {
                repo,
                source,
                target,
            } => {
                let repo_state = self.state.repo_mut(repo);
                repo_state.advance(RepoStatus::IssuesReplaying);
                let issue = repo_state.issue_mut(source);
                issue.target_number = Some(target);
                if issue.status < IssueStatus::Created {
                    issue.status = IssueStatus::Created;
                }
            }
            MigrationEvent::CommentPosted { repo, source } => {
                let issue = self.state.repo_mut(repo).issue_mut(source);
                issue.comments_posted += 1;
                if issue.status < IssueStatus::Commented {
                    issue.status = IssueStatus::Commented;
                }
            }
            MigrationEvent::IssueClosed { repo, source } => {
                let issue = self.state.repo_mut(repo).issue_mut(source);
                if issue.status < IssueStatus::Closed {
                    issue.status = IssueStatus::Closed;
                }
            }
            MigrationEvent::PrDocumented { repo, number } => {
                let repo_state = self.state.repo_mut(repo);
                repo_state.advance(RepoStatus::PrsDocumenting);
                repo_state.prs_documented += 1;
                tracing::debug!("Documented PR #{} of {}", number, repo);
            }
            MigrationEvent::RepoFailed { repo, reason } => {
                self.state.repo_mut(repo).fail(&reason);
            }
        }
        self.save()
    }

    /// Durable forward-only phase transition (issues_replaying,
    /// issues_done, prs_documenting, completed). A no-op transition is
    /// not rewritten to disk.
    pub fn advance(&mut self, repo: &str, status: RepoStatus) -> Result<()> {
        if self.state.repo_mut(repo).advance(status) {
            self.save()?;
        }
        Ok(())
    }

    /// Computes the exact continuation point for one repository from the
    /// ledger and the backup's ordered issue list.
    pub fn resume_point(&self, repo: &str, issues: &[IssueRecord]) -> ResumePoint {
        let repo_state = self.state.repo(repo);
        let status = repo_state.map(|r| r.status).unwrap_or(RepoStatus::Pending);
        let next_pr = repo_state.map(|r| r.prs_documented).unwrap_or(0);

        for (idx, record) in issues.iter().enumerate() {
            let issue = repo_state.and_then(|r| r.issue(record.number));
            if !issue_finished(issue, record) {
                return ResumePoint {
                    status,
                    next_issue: idx,
                    next_comment: issue.map(|i| i.comments_posted).unwrap_or(0),
                    next_pr,
                };
            }
        }

        ResumePoint {
            status,
            next_issue: issues.len(),
            next_comment: 0,
            next_pr,
        }
    }

    /// Write-temp-then-rename so a crash mid-write never corrupts the
    /// previous ledger.
    fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.state)
            .map_err(|e| Error::State(format!("cannot serialize state: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| Error::State(format!("cannot write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            Error::State(format!("cannot replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

/// An issue's replay is finished once it is created, every source comment
/// has been posted, and it has been closed if the source was closed.
fn issue_finished(issue: Option<&IssueState>, record: &IssueRecord) -> bool {
    let Some(issue) = issue else {
        return false;
    };
    if issue.status < IssueStatus::Created {
        return false;
    }
    if issue.comments_posted < record.comments.len() {
        return false;
    }
    match record.state {
        ItemState::Closed => issue.status == IssueStatus::Closed,
        ItemState::Open => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, CommentRecord};
    use chrono::{TimeZone, Utc};

    fn issue_record(number: u64, state: ItemState, comment_count: usize) -> IssueRecord {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        IssueRecord {
            number,
            title: format!("Issue {}", number),
            body: Some("body".to_string()),
            state,
            user: Author {
                login: "alice".to_string(),
            },
            created_at: created,
            comments: (0..comment_count)
                .map(|i| CommentRecord {
                    body: Some(format!("comment {}", i)),
                    user: Author {
                        login: "bob".to_string(),
                    },
                    created_at: created,
                })
                .collect(),
        }
    }

    fn tracker(dir: &tempfile::TempDir) -> StateTracker {
        StateTracker::load(dir.path().join("state.json"), "src-org", "dst-org").unwrap()
    }

    #[test]
    fn test_fresh_load_initializes_empty_state() {
        let tmp = tempfile::tempdir().unwrap();
        let tracker = tracker(&tmp);
        assert!(tracker.state().repositories.is_empty());
        assert_eq!(tracker.repo_status("any"), RepoStatus::Pending);
    }

    #[test]
    fn test_record_survives_reload() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut t = tracker(&tmp);
            t.record(MigrationEvent::RepoCreated { repo: "alpha" }).unwrap();
            t.record(MigrationEvent::IssueCreated {
                repo: "alpha",
                source: 1,
                target: 11,
            })
            .unwrap();
            t.record(MigrationEvent::CommentPosted {
                repo: "alpha",
                source: 1,
            })
            .unwrap();
        }

        let t = tracker(&tmp);
        assert_eq!(t.repo_status("alpha"), RepoStatus::IssuesReplaying);
        assert_eq!(t.issue_target("alpha", 1), Some(11));
        let issue = t.state().repo("alpha").unwrap().issue(1).unwrap();
        assert_eq!(issue.comments_posted, 1);
        assert_eq!(issue.status, IssueStatus::Commented);
    }

    #[test]
    fn test_org_mismatch_refused() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut t = tracker(&tmp);
            t.record(MigrationEvent::RepoCreated { repo: "alpha" }).unwrap();
        }
        let err =
            StateTracker::load(tmp.path().join("state.json"), "other", "dst-org").unwrap_err();
        assert!(matches!(err, Error::State(_)));
    }

    #[test]
    fn test_resume_point_mid_comments() {
        let tmp = tempfile::tempdir().unwrap();
        let mut t = tracker(&tmp);
        let issues = vec![
            issue_record(1, ItemState::Open, 3),
            issue_record(2, ItemState::Closed, 0),
        ];

        t.record(MigrationEvent::IssueCreated {
            repo: "alpha",
            source: 1,
            target: 1,
        })
        .unwrap();
        t.record(MigrationEvent::CommentPosted {
            repo: "alpha",
            source: 1,
        })
        .unwrap();
        t.record(MigrationEvent::CommentPosted {
            repo: "alpha",
            source: 1,
        })
        .unwrap();

        // Two of three comments posted: resume at comment index 2 of issue 0.
        let rp = t.resume_point("alpha", &issues);
        assert_eq!(rp.next_issue, 0);
        assert_eq!(rp.next_comment, 2);
    }

    #[test]
    fn test_resume_point_close_still_owed() {
        let tmp = tempfile::tempdir().unwrap();
        let mut t = tracker(&tmp);
        let issues = vec![issue_record(1, ItemState::Closed, 0)];

        t.record(MigrationEvent::IssueCreated {
            repo: "alpha",
            source: 1,
            target: 5,
        })
        .unwrap();

        // Created but not yet closed: the issue is not finished.
        let rp = t.resume_point("alpha", &issues);
        assert_eq!(rp.next_issue, 0);

        t.record(MigrationEvent::IssueClosed {
            repo: "alpha",
            source: 1,
        })
        .unwrap();
        let rp = t.resume_point("alpha", &issues);
        assert_eq!(rp.next_issue, 1);
    }

    #[test]
    fn test_resume_point_all_done() {
        let tmp = tempfile::tempdir().unwrap();
        let mut t = tracker(&tmp);
        let issues = vec![issue_record(1, ItemState::Open, 1)];

        t.record(MigrationEvent::IssueCreated {
            repo: "alpha",
            source: 1,
            target: 1,
        })
        .unwrap();
        t.record(MigrationEvent::CommentPosted {
            repo: "alpha",
            source: 1,
        })
        .unwrap();

        let rp = t.resume_point("alpha", &issues);
        assert_eq!(rp.next_issue, 1);
        assert_eq!(rp.next_comment, 0);
    }

    #[test]
    fn test_failed_records_reason() {
        let tmp = tempfile::tempdir().unwrap();
        let mut t = tracker(&tmp);
        t.record(MigrationEvent::RepoFailed {
            repo: "alpha",
            reason: "backup data error".to_string(),
        })
        .unwrap();
        assert!(t.is_failed("alpha"));
        assert_eq!(
            t.state().repo("alpha").unwrap().failure.as_deref(),
            Some("backup data error")
        );
    }

    #[test]
    fn test_pr_progress_persists() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut t = tracker(&tmp);
            t.record(MigrationEvent::PrDocumented {
                repo: "alpha",
                number: 4,
            })
            .unwrap();
        }
        let t = tracker(&tmp);
        assert_eq!(t.prs_documented("alpha"), 1);
        assert_eq!(t.repo_status("alpha"), RepoStatus::PrsDocumenting);
    }
}
