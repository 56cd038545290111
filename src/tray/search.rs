//! Search over the cached snapshot.
//!
//! Case-insensitive substring match on the issue key or summary. No network
//! call is made; results reflect the last completed poll.

use crate::data::{Issue, Snapshot};
use std::collections::HashSet;

/// Matching issues in menu order, each key once.
///
/// A blank term matches nothing.
pub fn search_issues(snapshot: &Snapshot, term: &str) -> Vec<Issue> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    snapshot
        .issues()
        .filter(|issue| matches(issue, &needle))
        .filter(|issue| seen.insert(issue.key.clone()))
        .cloned()
        .collect()
}

fn matches(issue: &Issue, needle: &str) -> bool {
    issue.key.to_lowercase().contains(needle) || issue.summary.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GroupSnapshot, StatusCategory};

    fn snapshot(issues: Vec<(&str, &str)>) -> Snapshot {
        Snapshot {
            groups: vec![GroupSnapshot {
                name: "Mine".to_string(),
                issues: issues
                    .into_iter()
                    .map(|(key, summary)| Issue {
                        key: key.to_string(),
                        summary: summary.to_string(),
                        status: "Open".to_string(),
                        status_category: StatusCategory::ToDo,
                        priority: None,
                        url: String::new(),
                    })
                    .collect(),
                error: None,
            }],
            taken_at: None,
        }
    }

    #[test]
    fn test_matches_key_and_summary_case_insensitively() {
        let snap = snapshot(vec![("PROJ-1", "Fix bug")]);

        assert_eq!(search_issues(&snap, "bug").len(), 1);
        assert_eq!(search_issues(&snap, "BUG").len(), 1);
        assert_eq!(search_issues(&snap, "PROJ-1").len(), 1);
        assert_eq!(search_issues(&snap, "proj-1").len(), 1);
        assert!(search_issues(&snap, "xyz").is_empty());
    }

    #[test]
    fn test_blank_term_matches_nothing() {
        let snap = snapshot(vec![("PROJ-1", "Fix bug")]);
        assert!(search_issues(&snap, "").is_empty());
        assert!(search_issues(&snap, "   ").is_empty());
    }

    #[test]
    fn test_duplicate_keys_reported_once() {
        let mut snap = snapshot(vec![("PROJ-1", "Fix bug")]);
        let copy = snap.groups[0].clone();
        snap.groups.push(GroupSnapshot {
            name: "Other".to_string(),
            ..copy
        });

        assert_eq!(search_issues(&snap, "fix").len(), 1);
    }
}
