pub mod backup;
pub mod config;
pub mod error;
pub mod github;
pub mod migration;
pub mod models;
pub mod state;

pub use backup::BackupReader;
pub use config::{Config, RateLimits};
pub use error::{Error, Result};
pub use github::{GitHubApi, GitHubClient, RateLimiter};
pub use migration::{ContentPusher, Migrator, RunSummary};
pub use state::StateTracker;
