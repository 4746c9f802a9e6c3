use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub state_file: PathBuf,
    pub backup_dir: PathBuf,
    pub limits: RateLimits,
    pub push_content: bool,
}

impl Config {
    /// Environment-backed defaults; a token passed on the command line
    /// takes precedence over `GITHUB_TOKEN`.
    pub fn from_env(token_override: Option<String>) -> Result<Self> {
        let github_token = match token_override {
            Some(token) => token,
            None => env::var("GITHUB_TOKEN").map_err(|_| {
                Error::Config(
                    "no GitHub token: pass --token or set GITHUB_TOKEN".to_string(),
                )
            })?,
        };

        let state_file = env::var("STATE_FILE")
            .unwrap_or_else(|_| "migration_state.json".to_string())
            .into();

        let backup_dir = env::var("BACKUP_DIR")
            .unwrap_or_else(|_| "backup".to_string())
            .into();

        Ok(Self {
            github_token,
            state_file,
            backup_dir,
            limits: RateLimits::from_env(),
            push_content: true,
        })
    }
}

/// Client-side ceilings for the two rate-limited call classes. The hard
/// per-minute and per-hour caps sit below GitHub's own content-creation
/// limits; the limiter additionally keeps a soft margin under these.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub issues_per_minute: u32,
    pub issues_per_hour: u32,
    pub comments_per_minute: u32,
    pub comments_per_hour: u32,
    /// Unconditional spacing between consecutive calls to avoid bursts.
    pub call_spacing: Duration,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            issues_per_minute: 20,
            issues_per_hour: 150,
            comments_per_minute: 20,
            comments_per_hour: 150,
            call_spacing: Duration::from_secs(3),
        }
    }
}

impl RateLimits {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let issues_per_hour = env::var("ISSUES_PER_HOUR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.issues_per_hour);

        let comments_per_hour = env::var("COMMENTS_PER_HOUR")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.comments_per_hour);

        Self {
            issues_per_hour,
            comments_per_hour,
            ..defaults
        }
    }
}
