//! Pushes a backup checkout's full history to the target repository.
//!
//! The backup holds a mirror clone per repository; `git push --mirror`
//! transfers every branch and tag in one call. Content failures never
//! fail the repository's migration: issues and comments can still be
//! replayed, and the push can be redone by hand.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use crate::error::{Error, Result};

const PUSH_TIMEOUT: Duration = Duration::from_secs(600);

pub struct ContentPusher {
    token: String,
    target_org: String,
}

impl ContentPusher {
    pub fn new(token: &str, target_org: &str) -> Self {
        Self {
            token: token.to_string(),
            target_org: target_org.to_string(),
        }
    }

    pub async fn push_mirror(&self, checkout: &Path, repo: &str) -> Result<()> {
        // The token rides in the remote URL; never log the URL itself.
        let target_url = format!(
            "https://{}@github.com/{}/{}.git",
            self.token, self.target_org, repo
        );

        tracing::info!(
            "Pushing repository content for {} to {}/{}",
            repo,
            self.target_org,
            repo
        );

        let output = timeout(
            PUSH_TIMEOUT,
            Command::new("git")
                .arg("-C")
                .arg(checkout)
                .arg("push")
                .arg("--mirror")
                .arg(&target_url)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output(),
        )
        .await
        .map_err(|_| Error::Git(format!("push of {} timed out", repo)))?
        .map_err(|e| Error::Git(format!("failed to run git for {}: {}", repo, e)))?;

        if !output.status.success() {
            // git echoes the remote URL on failure; scrub the credential.
            let stderr =
                String::from_utf8_lossy(&output.stderr).replace(&self.token, "***");
            return Err(Error::Git(format!(
                "push of {} failed: {}",
                repo,
                stderr.trim()
            )));
        }

        tracing::info!("Repository content pushed for {}", repo);
        Ok(())
    }
}
