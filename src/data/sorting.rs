//! Ordering of issues inside a group.
//!
//! All sorts are stable: issues that compare equal keep the order the tracker
//! returned them in (usually the JQL `ORDER BY`).

use super::Issue;
use crate::config::SortKey;

pub fn sort_issues(issues: &mut [Issue], sort_key: SortKey) {
    match sort_key {
        SortKey::Priority => issues.sort_by_key(|i| i.severity().sort_order()),
        SortKey::Status => issues.sort_by_key(|i| i.status_category.sort_order()),
        SortKey::Key => issues.sort_by(|a, b| a.key.cmp(&b.key)),
    }
}

/// Sort, then keep at most `max_results` issues.
pub fn sort_and_truncate(mut issues: Vec<Issue>, sort_key: SortKey, max_results: u32) -> Vec<Issue> {
    sort_issues(&mut issues, sort_key);
    issues.truncate(max_results as usize);
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::StatusCategory;

    fn make_issue(key: &str, category: StatusCategory, priority: Option<&str>) -> Issue {
        Issue {
            key: key.to_string(),
            summary: format!("Test issue {}", key),
            status: format!("{:?}", category),
            status_category: category,
            priority: priority.map(str::to_string),
            url: format!("https://jira.example.com/browse/{}", key),
        }
    }

    #[test]
    fn test_sort_by_priority() {
        let mut issues = vec![
            make_issue("T-1", StatusCategory::ToDo, Some("Low")),
            make_issue("T-2", StatusCategory::ToDo, Some("Blocker")),
            make_issue("T-3", StatusCategory::ToDo, None),
            make_issue("T-4", StatusCategory::ToDo, Some("Medium")),
        ];
        sort_issues(&mut issues, SortKey::Priority);

        let keys: Vec<_> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["T-2", "T-4", "T-1", "T-3"]);
    }

    #[test]
    fn test_sort_by_status() {
        let mut issues = vec![
            make_issue("T-1", StatusCategory::Done, None),
            make_issue("T-2", StatusCategory::InProgress, None),
            make_issue("T-3", StatusCategory::ToDo, None),
        ];
        sort_issues(&mut issues, SortKey::Status);

        // In progress comes before to do comes before done
        assert_eq!(issues[0].key, "T-2");
        assert_eq!(issues[1].key, "T-3");
        assert_eq!(issues[2].key, "T-1");
    }

    #[test]
    fn test_sort_by_key_is_lexicographic() {
        let mut issues = vec![
            make_issue("PROJ-2", StatusCategory::ToDo, None),
            make_issue("PROJ-10", StatusCategory::ToDo, None),
            make_issue("ABC-7", StatusCategory::ToDo, None),
        ];
        sort_issues(&mut issues, SortKey::Key);

        let keys: Vec<_> = issues.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["ABC-7", "PROJ-10", "PROJ-2"]);
    }

    #[test]
    fn test_ties_keep_tracker_order() {
        let mut issues = vec![
            make_issue("T-9", StatusCategory::ToDo, Some("High")),
            make_issue("T-1", StatusCategory::ToDo, Some("Critical")),
        ];
        sort_issues(&mut issues, SortKey::Priority);
        assert_eq!(issues[0].key, "T-9");
    }

    #[test]
    fn test_truncate_after_sort() {
        let issues = vec![
            make_issue("T-1", StatusCategory::ToDo, Some("Low")),
            make_issue("T-2", StatusCategory::ToDo, Some("Low")),
            make_issue("T-3", StatusCategory::ToDo, Some("Highest")),
            make_issue("T-4", StatusCategory::ToDo, Some("Low")),
            make_issue("T-5", StatusCategory::ToDo, Some("High")),
        ];
        let kept = sort_and_truncate(issues, SortKey::Priority, 2);

        let keys: Vec<_> = kept.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["T-3", "T-5"]);
    }
}
