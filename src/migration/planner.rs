use crate::models::RepoBackup;

/// Orders repositories by total item count ascending, cheapest first.
/// A bad token or wrong org then surfaces on a small repository before
/// any expensive one is attempted, and a run cut short still finishes
/// as many repositories as possible. The sort is stable, so ties keep
/// the reader's name order.
pub fn order_by_complexity(mut repos: Vec<RepoBackup>) -> Vec<RepoBackup> {
    repos.sort_by_key(|r| r.item_count());
    repos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, IssueRecord, ItemState};
    use chrono::{TimeZone, Utc};

    fn repo_with_issues(name: &str, count: usize) -> RepoBackup {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        RepoBackup {
            name: name.to_string(),
            issues: (1..=count as u64)
                .map(|n| IssueRecord {
                    number: n,
                    title: format!("Issue {}", n),
                    body: None,
                    state: ItemState::Open,
                    user: Author {
                        login: "alice".to_string(),
                    },
                    created_at: created,
                    comments: Vec::new(),
                })
                .collect(),
            pulls: Vec::new(),
            checkout: None,
        }
    }

    #[test]
    fn test_cheapest_first() {
        let repos = vec![
            repo_with_issues("a", 2),
            repo_with_issues("b", 5),
            repo_with_issues("c", 0),
        ];
        let ordered = order_by_complexity(repos);
        let names: Vec<&str> = ordered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_ties_keep_incoming_order() {
        let repos = vec![
            repo_with_issues("zeta", 1),
            repo_with_issues("alpha", 1),
        ];
        let ordered = order_by_complexity(repos);
        let names: Vec<&str> = ordered.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
