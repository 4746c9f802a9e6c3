//! Reads a previously exported organization backup.
//!
//! Layout: `<root>/<org>/<repo>/` per repository, containing `issues.json`,
//! `pulls.json`, and optionally `repo/` with a mirror checkout of the
//! source repository. The JSON files hold either a bare array of nodes or
//! a wrapper object (`{"issues": [...]}` / `{"pull_requests": [...]}`);
//! both shapes are valid exports.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{IssueExport, IssueRecord, PullExport, PullRequestRecord, RepoBackup};

pub struct BackupReader {
    root: PathBuf,
}

impl BackupReader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Lists repository names in the organization backup, sorted by name
    /// for deterministic processing order. A missing organization
    /// directory is an environment error: nothing can proceed without it.
    pub fn list_repos(&self, org: &str) -> Result<Vec<String>> {
        let org_dir = self.root.join(org);
        if !org_dir.is_dir() {
            return Err(Error::Config(format!(
                "backup directory for organization {} not found at {}",
                org,
                org_dir.display()
            )));
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&org_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Loads one repository's exported records. Any missing or malformed
    /// file fails only this repository.
    pub fn load_repo(&self, org: &str, name: &str) -> Result<RepoBackup> {
        let repo_dir = self.root.join(org).join(name);

        let mut issues = self.read_issues(&repo_dir.join("issues.json"), name)?;
        // Source issue numbers are assigned in creation order, so number
        // order is chronological order.
        issues.sort_by_key(|i| i.number);

        let mut pulls = self.read_pulls(&repo_dir.join("pulls.json"), name)?;
        pulls.sort_by_key(|p| p.number);

        let checkout_dir = repo_dir.join("repo");
        let checkout = checkout_dir.is_dir().then_some(checkout_dir);

        Ok(RepoBackup {
            name: name.to_string(),
            issues,
            pulls,
            checkout,
        })
    }

    fn read_issues(&self, path: &Path, repo: &str) -> Result<Vec<IssueRecord>> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::BackupData(format!("{}: cannot read {}: {}", repo, path.display(), e))
        })?;
        let export: IssueExport = serde_json::from_str(&content).map_err(|e| {
            Error::BackupData(format!("{}: malformed {}: {}", repo, path.display(), e))
        })?;
        Ok(export.into_records())
    }

    fn read_pulls(&self, path: &Path, repo: &str) -> Result<Vec<PullRequestRecord>> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::BackupData(format!("{}: cannot read {}: {}", repo, path.display(), e))
        })?;
        let export: PullExport = serde_json::from_str(&content).map_err(|e| {
            Error::BackupData(format!("{}: malformed {}: {}", repo, path.display(), e))
        })?;
        Ok(export.into_records())
    }
}
