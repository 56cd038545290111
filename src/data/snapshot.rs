//! Turning one round of group fetches into the next snapshot.

use super::sorting::sort_and_truncate;
use super::{GroupSnapshot, Issue, Snapshot};
use crate::config::Group;
use crate::error::{PollError, TrackerError};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Outcome of fetching one group
#[derive(Debug, Clone)]
pub struct GroupFetch {
    pub group: Group,
    pub result: Result<Vec<Issue>, TrackerError>,
}

/// Build the snapshot that replaces `previous`.
///
/// Groups come out in fetch (configuration) order. A failed group keeps the
/// issues it had in `previous` and records the error; the poll as a whole only
/// fails when every group failed.
pub fn build_snapshot(
    previous: &Snapshot,
    fetches: Vec<GroupFetch>,
    taken_at: DateTime<Utc>,
) -> Result<Snapshot, PollError> {
    if !fetches.is_empty() && fetches.iter().all(|f| f.result.is_err()) {
        let failures = fetches
            .into_iter()
            .filter_map(|f| f.result.err().map(|e| (f.group.name, e)))
            .collect();
        return Err(PollError::AllGroupsFailed { failures });
    }

    let groups = fetches
        .into_iter()
        .map(|fetch| match fetch.result {
            Ok(issues) => GroupSnapshot {
                issues: sort_and_truncate(issues, fetch.group.sort_by, fetch.group.max_results),
                name: fetch.group.name,
                error: None,
            },
            Err(e) => {
                tracing::warn!("Failed to refresh group '{}': {}", fetch.group.name, e);
                let retained = previous
                    .group(&fetch.group.name)
                    .map(|g| g.issues.clone())
                    .unwrap_or_default();
                GroupSnapshot {
                    name: fetch.group.name,
                    issues: retained,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    Ok(Snapshot {
        groups,
        taken_at: Some(taken_at),
    })
}

/// Issues of `snapshot` whose key is not in `seen`, once each, in menu order.
pub fn newly_seen<'a>(snapshot: &'a Snapshot, seen: &HashSet<String>) -> Vec<&'a Issue> {
    let mut emitted = HashSet::new();
    snapshot
        .issues()
        .filter(|i| !seen.contains(&i.key) && emitted.insert(i.key.clone()))
        .collect()
}
