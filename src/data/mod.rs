pub mod snapshot;
pub mod sorting;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub use snapshot::{build_snapshot, newly_seen, GroupFetch};

/// A tracker issue as shown in the menu.
///
/// Identity is the key; change detection compares the whole value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String, // e.g., "PROJ-123"
    pub summary: String,
    pub status: String,
    pub status_category: StatusCategory,
    /// Priority name exactly as the tracker reports it
    pub priority: Option<String>,
    pub url: String,
}

impl Issue {
    pub fn severity(&self) -> Severity {
        self.priority
            .as_deref()
            .map(Severity::from_priority_name)
            .unwrap_or_default()
    }
}

/// Priority names folded into a fixed severity ranking.
///
/// Trackers ship many priority schemes (Blocker..Trivial, Highest..Lowest,
/// P1..P4, MoSCoW); each name maps to exactly one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Trivial,
    #[default]
    Undefined,
}

impl Severity {
    pub fn from_priority_name(name: &str) -> Self {
        match name.trim() {
            "Immediate" | "Blocker" | "Highest" | "1=Must Have" | "P1" => Self::Blocker,
            "Critical" | "High" | "2=Should Have" | "P2" => Self::Critical,
            "Major" | "Medium" | "3=Could Have" | "P3" => Self::Major,
            "Minor" | "Low" => Self::Minor,
            "Trivial" | "Lowest" | "Very Low" | "4 = Won't Have" | "4 = Won\u{2019}t Have"
            | "P4" => Self::Trivial,
            _ => Self::Undefined,
        }
    }

    /// Sort order (lower = more severe)
    pub fn sort_order(&self) -> u8 {
        *self as u8
    }

    pub fn badge(&self) -> &'static str {
        match self {
            Self::Blocker => "🔴",
            Self::Critical => "🟠",
            Self::Major => "🟡",
            Self::Minor => "🟢",
            Self::Trivial => "🔵",
            Self::Undefined => "⚪",
        }
    }

    /// Tray icon colour when this is the most severe issue on screen
    pub fn color(&self) -> Option<&'static str> {
        match self {
            Self::Blocker => Some("#cc0000"),
            Self::Critical => Some("#ff0000"),
            Self::Major => Some("#ff9900"),
            Self::Minor => Some("#33cc00"),
            Self::Trivial => Some("#003300"),
            Self::Undefined => None,
        }
    }
}

/// Tracker status category (`statusCategory.key` in the REST payload)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StatusCategory {
    ToDo,
    InProgress,
    Done,
    #[default]
    Unknown,
}

impl StatusCategory {
    pub fn from_key(key: &str) -> Self {
        match key {
            "new" => Self::ToDo,
            "indeterminate" => Self::InProgress,
            "done" => Self::Done,
            _ => Self::Unknown,
        }
    }

    pub fn sort_order(&self) -> u8 {
        match self {
            Self::InProgress => 0,
            Self::ToDo => 1,
            Self::Unknown => 2,
            Self::Done => 3,
        }
    }
}

/// A status change offered by the tracker for one issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    /// Target status name, when the tracker reports it
    pub to_status: Option<String>,
}

/// Result of one completed poll cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub groups: Vec<GroupSnapshot>,
    pub taken_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSnapshot {
    pub name: String,
    pub issues: Vec<Issue>,
    /// Set when the last fetch for this group failed; `issues` then holds the
    /// entries retained from the previous snapshot.
    pub error: Option<String>,
}

impl Snapshot {
    pub fn group(&self, name: &str) -> Option<&GroupSnapshot> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.groups.iter().flat_map(|g| g.issues.iter())
    }

    /// Number of distinct issues (an issue can appear in several groups)
    pub fn total(&self) -> usize {
        self.keys().len()
    }

    pub fn keys(&self) -> HashSet<String> {
        self.issues().map(|i| i.key.clone()).collect()
    }

    pub fn find(&self, key: &str) -> Option<&Issue> {
        self.issues().find(|i| i.key == key)
    }

    pub fn highest_severity(&self) -> Option<Severity> {
        self.issues().map(Issue::severity).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_table() {
        assert_eq!(Severity::from_priority_name("Highest"), Severity::Blocker);
        assert_eq!(Severity::from_priority_name("P2"), Severity::Critical);
        assert_eq!(Severity::from_priority_name("Medium"), Severity::Major);
        assert_eq!(Severity::from_priority_name("Low"), Severity::Minor);
        assert_eq!(Severity::from_priority_name("4 = Won\u{2019}t Have"), Severity::Trivial);
        assert_eq!(Severity::from_priority_name("Standard"), Severity::Undefined);
        assert_eq!(Severity::from_priority_name("Whatever"), Severity::Undefined);
        assert!(Severity::Blocker.sort_order() < Severity::Undefined.sort_order());
    }

    #[test]
    fn test_status_category_from_key() {
        assert_eq!(StatusCategory::from_key("new"), StatusCategory::ToDo);
        assert_eq!(StatusCategory::from_key("indeterminate"), StatusCategory::InProgress);
        assert_eq!(StatusCategory::from_key("done"), StatusCategory::Done);
        assert_eq!(StatusCategory::from_key("undefined"), StatusCategory::Unknown);
    }

    #[test]
    fn test_snapshot_counts_distinct_keys() {
        let issue = |key: &str, priority: &str| Issue {
            key: key.to_string(),
            summary: String::new(),
            status: "Open".to_string(),
            status_category: StatusCategory::ToDo,
            priority: Some(priority.to_string()),
            url: String::new(),
        };
        let snapshot = Snapshot {
            groups: vec![
                GroupSnapshot {
                    name: "A".to_string(),
                    issues: vec![issue("P-1", "Low"), issue("P-2", "High")],
                    error: None,
                },
                GroupSnapshot {
                    name: "B".to_string(),
                    issues: vec![issue("P-1", "Low")],
                    error: None,
                },
            ],
            taken_at: None,
        };

        assert_eq!(snapshot.total(), 2);
        assert_eq!(snapshot.highest_severity(), Some(Severity::Critical));
        assert!(snapshot.find("P-2").is_some());
        assert!(snapshot.group("C").is_none());
    }
}
