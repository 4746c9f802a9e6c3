//! Body formatting for replayed issues, comments, and PR documentation
//! issues. Authorship cannot be reassigned through the API, so every
//! replayed body carries an attribution footer naming the original
//! author, timestamp, and source repository.

use crate::models::{CommentRecord, IssueRecord, ItemState, PullRequestRecord};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub fn issue_body(issue: &IssueRecord, source_org: &str, repo: &str) -> String {
    let body = issue
        .body
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or("*No description provided*");

    format!(
        "{}\n\n---\n*Originally created by @{} on {}*\n*Migrated from {}/{}*",
        body,
        issue.user.login,
        issue.created_at.format(DATE_FORMAT),
        source_org,
        repo
    )
}

pub fn comment_body(comment: &CommentRecord, source_org: &str, repo: &str) -> String {
    let body = comment
        .body
        .as_deref()
        .filter(|b| !b.is_empty())
        .unwrap_or("*No comment text*");

    format!(
        "{}\n\n---\n*Originally posted by @{} on {}*\n*Migrated from {}/{}*",
        body,
        comment.user.login,
        comment.created_at.format(DATE_FORMAT),
        source_org,
        repo
    )
}

pub fn pr_title(pr: &PullRequestRecord) -> String {
    format!("[PR] {}", pr.title)
}

/// Documentation body for a pull request that cannot be recreated as a
/// native pull request: the API offers no way to open a historical PR
/// with the original commits and diffs.
pub fn pr_body(pr: &PullRequestRecord, source_org: &str, repo: &str) -> String {
    let state = if pr.merged {
        "merged"
    } else {
        match pr.state {
            ItemState::Open => "open",
            ItemState::Closed => "closed",
        }
    };

    let mut body = format!(
        "This issue documents pull request #{} from {}/{}. The original \
         commits are not reachable through the API, so the pull request \
         cannot be recreated natively; this record preserves its metadata.\n\n\
         **State:** {}\n\
         **Branches:** `{}` -> `{}`\n\
         **Author:** @{}\n\
         **Opened:** {}\n",
        pr.number,
        source_org,
        repo,
        state,
        pr.head.name,
        pr.base.name,
        pr.user.login,
        pr.created_at.format(DATE_FORMAT),
    );

    if let Some(original) = pr.body.as_deref().filter(|b| !b.is_empty()) {
        body.push_str("\n---\n\n");
        body.push_str(original);
        body.push('\n');
    }

    if !pr.reviews.is_empty() {
        body.push_str("\n## Reviews\n");
        for review in &pr.reviews {
            body.push_str(&format!(
                "- @{} {} on {}",
                review.user.login,
                review.state.to_lowercase(),
                review.submitted_at.format(DATE_FORMAT)
            ));
            if let Some(text) = review.body.as_deref().filter(|b| !b.is_empty()) {
                body.push_str(&format!(": {}", text));
            }
            body.push('\n');
        }
    }

    body
}
