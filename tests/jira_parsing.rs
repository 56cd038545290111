//! Tests for parsing Jira REST v2 responses into issues and transitions.

use jira_tray::data::{Severity, StatusCategory};
use jira_tray::error::TrackerError;
use jira_tray::integrations::jira::{parse_search_response, parse_transitions_response};
use pretty_assertions::assert_eq;
use serde_json::json;

const BASE: &str = "https://jira.example.com";

fn search_body() -> String {
    json!({
        "startAt": 0,
        "maxResults": 20,
        "total": 3,
        "issues": [
            {
                "id": "10001",
                "key": "PROJ-1",
                "fields": {
                    "summary": "Login page crashes",
                    "status": {
                        "name": "In Progress",
                        "statusCategory": { "key": "indeterminate", "name": "In Progress" }
                    },
                    "priority": { "name": "Highest", "id": "1" }
                }
            },
            {
                "id": "10002",
                "key": " PROJ-2 ",
                "fields": {
                    "summary": "Write docs",
                    "status": { "name": "Backlog", "statusCategory": { "key": "new" } },
                    "priority": null
                }
            },
            {
                "id": "10003",
                "key": "PROJ-3",
                "fields": {}
            }
        ]
    })
    .to_string()
}

#[test]
fn test_search_response_maps_fields() {
    let issues = parse_search_response(BASE, &search_body()).unwrap();

    assert_eq!(issues.len(), 3);

    let first = &issues[0];
    assert_eq!(first.key, "PROJ-1");
    assert_eq!(first.summary, "Login page crashes");
    assert_eq!(first.status, "In Progress");
    assert_eq!(first.status_category, StatusCategory::InProgress);
    assert_eq!(first.severity(), Severity::Blocker);
    assert_eq!(first.url, "https://jira.example.com/browse/PROJ-1");
}

#[test]
fn test_search_response_trims_keys_and_tolerates_missing_fields() {
    let issues = parse_search_response(BASE, &search_body()).unwrap();

    assert_eq!(issues[1].key, "PROJ-2");
    assert_eq!(issues[1].url, "https://jira.example.com/browse/PROJ-2");
    assert_eq!(issues[1].priority, None);
    assert_eq!(issues[1].severity(), Severity::Undefined);
    assert_eq!(issues[1].status_category, StatusCategory::ToDo);

    assert_eq!(issues[2].summary, "");
    assert_eq!(issues[2].status_category, StatusCategory::Unknown);
}

#[test]
fn test_empty_search_response() {
    assert!(parse_search_response(BASE, r#"{"issues":[]}"#).unwrap().is_empty());
    assert!(parse_search_response(BASE, "{}").unwrap().is_empty());
}

#[test]
fn test_garbage_search_response_is_unexpected() {
    let err = parse_search_response(BASE, "<html>Service Unavailable</html>").unwrap_err();
    assert!(matches!(err, TrackerError::Unexpected { status: 200, .. }));
}

#[test]
fn test_transitions_response() {
    let body = json!({
        "expand": "transitions",
        "transitions": [
            { "id": "11", "name": "Start Progress", "to": { "name": "In Progress", "id": "3" } },
            { "id": "31", "name": "Done", "to": { "name": "Done" } },
            { "id": "41", "name": "Reopen" }
        ]
    })
    .to_string();

    let transitions = parse_transitions_response(&body).unwrap();

    assert_eq!(transitions.len(), 3);
    assert_eq!(transitions[0].id, "11");
    assert_eq!(transitions[0].to_status.as_deref(), Some("In Progress"));
    assert_eq!(transitions[2].to_status, None);
}
