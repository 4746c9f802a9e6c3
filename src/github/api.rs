use async_trait::async_trait;

use crate::error::Result;

/// The boundary to the remote service. The orchestrator only ever talks
/// to this trait, which keeps the migration logic testable against an
/// in-process fake.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Existence pre-check used once per repository before creation.
    async fn repo_exists(&self, org: &str, name: &str) -> Result<bool>;

    async fn create_repository(&self, org: &str, name: &str, description: &str) -> Result<()>;

    /// Creates an issue and returns its number in the target repository.
    async fn create_issue(&self, org: &str, repo: &str, title: &str, body: &str) -> Result<u64>;

    async fn close_issue(&self, org: &str, repo: &str, number: u64) -> Result<()>;

    async fn create_comment(&self, org: &str, repo: &str, number: u64, body: &str) -> Result<()>;
}
