//! Drives the per-repository state machine:
//!
//! `pending -> repo_created -> issues_replaying -> issues_done ->
//! prs_documenting -> completed`, with `failed` reachable from any
//! non-terminal status.
//!
//! Execution is single-threaded and strictly sequential: at most one
//! external call is in flight at any time, and the rate limiter's
//! blocking waits are the only suspension points. Before every external
//! call the limiter is consulted; after every call the outcome is
//! durably recorded before anything else proceeds.

use indicatif::{ProgressBar, ProgressStyle};

use crate::backup::BackupReader;
use crate::error::{Error, Result};
use crate::github::{GitHubApi, RateLimiter, ResourceClass};
use crate::migration::content::ContentPusher;
use crate::migration::format;
use crate::migration::planner::order_by_complexity;
use crate::models::{IssueRecord, IssueStatus, ItemState, RepoBackup, RepoStatus};
use crate::state::{MigrationEvent, StateTracker};

pub struct Migrator {
    api: Box<dyn GitHubApi>,
    tracker: StateTracker,
    limiter: RateLimiter,
    reader: BackupReader,
    pusher: Option<ContentPusher>,
    source_org: String,
    target_org: String,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn is_full_completion(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Migrator {
    pub fn new(
        api: impl GitHubApi + 'static,
        tracker: StateTracker,
        limiter: RateLimiter,
        reader: BackupReader,
        pusher: Option<ContentPusher>,
        source_org: &str,
        target_org: &str,
    ) -> Self {
        Self {
            api: Box::new(api),
            tracker,
            limiter,
            reader,
            pusher,
            source_org: source_org.to_string(),
            target_org: target_org.to_string(),
        }
    }

    /// Migrates every repository in the organization backup, cheapest
    /// first. Per-repository failures are recorded and the run continues;
    /// fatal errors abort the run immediately.
    pub async fn run(&mut self) -> Result<RunSummary> {
        tracing::info!(
            "Starting migration: {} -> {}",
            self.source_org,
            self.target_org
        );

        let names = self.reader.list_repos(&self.source_org)?;
        tracing::info!("Found {} repositories in backup", names.len());

        let mut summary = RunSummary::default();
        let mut repos = Vec::new();

        for name in names {
            if self.tracker.is_completed(&name) {
                tracing::info!("Skipping {} - already completed", name);
                summary.skipped += 1;
                continue;
            }
            if self.tracker.is_failed(&name) {
                tracing::warn!(
                    "Skipping {} - previously failed; edit the state file to retry",
                    name
                );
                summary.failed.push(name);
                continue;
            }
            match self.reader.load_repo(&self.source_org, &name) {
                Ok(backup) => repos.push(backup),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!("Cannot load backup for {}: {}", name, e);
                    self.tracker.record(MigrationEvent::RepoFailed {
                        repo: &name,
                        reason: e.to_string(),
                    })?;
                    summary.failed.push(name);
                }
            }
        }

        let repos = order_by_complexity(repos);

        let pb = ProgressBar::new(repos.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} repos {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );

        for backup in &repos {
            pb.set_message(backup.name.clone());
            match self.migrate_repository(backup).await {
                Ok(()) => {
                    summary.completed += 1;
                    tracing::info!("Repository {} migration completed", backup.name);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!("Failed to migrate repository {}: {}", backup.name, e);
                    self.tracker.record(MigrationEvent::RepoFailed {
                        repo: &backup.name,
                        reason: e.to_string(),
                    })?;
                    summary.failed.push(backup.name.clone());
                }
            }

            let (issues_min, issues_hour) = self.limiter.counts(ResourceClass::Issue);
            let (comments_min, comments_hour) = self.limiter.counts(ResourceClass::Comment);
            tracing::info!(
                "Rate usage: {} issue calls this minute ({} this hour), {} comment calls this minute ({} this hour)",
                issues_min,
                issues_hour,
                comments_min,
                comments_hour
            );
            pb.inc(1);
        }

        pb.finish_with_message("done");
        Ok(summary)
    }

    async fn migrate_repository(&mut self, backup: &RepoBackup) -> Result<()> {
        tracing::info!(
            "Migrating {} ({} issues, {} pull requests)",
            backup.name,
            backup.issues.len(),
            backup.pulls.len()
        );

        if self.tracker.repo_status(&backup.name) < RepoStatus::RepoCreated {
            self.ensure_repository(&backup.name).await?;
        }

        // Content is pushed once, before issue replay begins; a resumed
        // run that already started replaying does not push again.
        if self.tracker.repo_status(&backup.name) < RepoStatus::IssuesReplaying {
            self.push_content(backup).await;
        }

        self.replay_issues(backup).await?;
        self.document_pulls(backup).await?;
        self.tracker.advance(&backup.name, RepoStatus::Completed)?;
        Ok(())
    }

    /// `pending -> repo_created`: creation succeeds, or the repository
    /// already exists. The existence pre-check is made once here; the
    /// ledger answers all later questions.
    async fn ensure_repository(&mut self, name: &str) -> Result<()> {
        if self.api.repo_exists(&self.target_org, name).await? {
            tracing::info!(
                "Repository {}/{} already exists, continuing with replay",
                self.target_org,
                name
            );
            self.tracker
                .record(MigrationEvent::RepoAlreadyExisted { repo: name })?;
            return Ok(());
        }

        let description = format!("Migrated from {}/{}", self.source_org, name);
        match self
            .api
            .create_repository(&self.target_org, name, &description)
            .await
        {
            Ok(()) => {
                self.tracker
                    .record(MigrationEvent::RepoCreated { repo: name })?;
            }
            Err(Error::AlreadyExists(_)) => {
                self.tracker
                    .record(MigrationEvent::RepoAlreadyExisted { repo: name })?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Best effort: a failed push is logged and the repository's issue
    /// replay proceeds regardless.
    async fn push_content(&mut self, backup: &RepoBackup) {
        let Some(pusher) = &self.pusher else {
            return;
        };
        let Some(checkout) = &backup.checkout else {
            tracing::warn!("No checkout in backup for {}, skipping content push", backup.name);
            return;
        };
        if let Err(e) = pusher.push_mirror(checkout, &backup.name).await {
            tracing::warn!(
                "Content push for {} failed, continuing with issues: {}",
                backup.name,
                e
            );
        }
    }

    async fn replay_issues(&mut self, backup: &RepoBackup) -> Result<()> {
        if self.tracker.repo_status(&backup.name) >= RepoStatus::IssuesDone {
            return Ok(());
        }
        if backup.issues.is_empty() {
            // Nothing to replay: straight to issues_done without any
            // issue-creation call.
            return self.tracker.advance(&backup.name, RepoStatus::IssuesDone);
        }

        let resume = self.tracker.resume_point(&backup.name, &backup.issues);
        if resume.next_issue > 0 || resume.next_comment > 0 {
            tracing::info!(
                "Resuming {} at issue index {} (comment {})",
                backup.name,
                resume.next_issue,
                resume.next_comment
            );
        }

        if resume.next_issue < backup.issues.len() {
            self.tracker
                .advance(&backup.name, RepoStatus::IssuesReplaying)?;
            for record in &backup.issues[resume.next_issue..] {
                self.replay_issue(backup, record).await?;
            }
        }

        self.tracker.advance(&backup.name, RepoStatus::IssuesDone)
    }

    async fn replay_issue(&mut self, backup: &RepoBackup, record: &IssueRecord) -> Result<()> {
        let repo = backup.name.as_str();

        let target = match self.tracker.issue_target(repo, record.number) {
            Some(number) => number,
            None => {
                self.limiter.admit(ResourceClass::Issue).await;
                let body = format::issue_body(record, &self.source_org, repo);
                let number = self
                    .api
                    .create_issue(&self.target_org, repo, &record.title, &body)
                    .await?;
                self.tracker.record(MigrationEvent::IssueCreated {
                    repo,
                    source: record.number,
                    target: number,
                })?;
                tracing::info!("Created issue #{} (source #{})", number, record.number);
                number
            }
        };

        let posted = self
            .tracker
            .state()
            .repo(repo)
            .and_then(|r| r.issue(record.number))
            .map(|i| i.comments_posted)
            .unwrap_or(0);

        // Comments replay oldest first; a resumed run retries exactly the
        // first unposted comment.
        for comment in record.comments.iter().skip(posted) {
            self.limiter.admit(ResourceClass::Comment).await;
            let body = format::comment_body(comment, &self.source_org, repo);
            self.api
                .create_comment(&self.target_org, repo, target, &body)
                .await?;
            self.tracker.record(MigrationEvent::CommentPosted {
                repo,
                source: record.number,
            })?;
        }

        let closed = self
            .tracker
            .state()
            .repo(repo)
            .and_then(|r| r.issue(record.number))
            .map(|i| i.status == IssueStatus::Closed)
            .unwrap_or(false);

        if record.state == ItemState::Closed && !closed {
            self.limiter.admit(ResourceClass::Issue).await;
            self.api.close_issue(&self.target_org, repo, target).await?;
            self.tracker.record(MigrationEvent::IssueClosed {
                repo,
                source: record.number,
            })?;
            tracing::info!("Closed issue #{} (source #{})", target, record.number);
        }

        Ok(())
    }

    /// `issues_done -> prs_documenting -> completed`: each pull request
    /// becomes a synthetic `[PR]`-titled issue that is closed immediately.
    async fn document_pulls(&mut self, backup: &RepoBackup) -> Result<()> {
        if self.tracker.repo_status(&backup.name) >= RepoStatus::Completed {
            return Ok(());
        }
        let next = self.tracker.prs_documented(&backup.name);
        if next >= backup.pulls.len() {
            return Ok(());
        }

        for pr in &backup.pulls[next..] {
            self.limiter.admit(ResourceClass::Issue).await;
            let title = format::pr_title(pr);
            let body = format::pr_body(pr, &self.source_org, &backup.name);
            let number = self
                .api
                .create_issue(&self.target_org, &backup.name, &title, &body)
                .await?;

            self.limiter.admit(ResourceClass::Issue).await;
            self.api
                .close_issue(&self.target_org, &backup.name, number)
                .await?;

            self.tracker.record(MigrationEvent::PrDocumented {
                repo: &backup.name,
                number: pr.number,
            })?;
            tracing::info!(
                "Documented PR #{} of {} as issue #{}",
                pr.number,
                backup.name,
                number
            );
        }
        Ok(())
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }
}
