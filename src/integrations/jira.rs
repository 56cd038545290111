//! Jira REST API v2 client.

use crate::data::{Issue, StatusCategory, Transition};
use crate::error::TrackerError;
use crate::integrations::{Connection, Tracker, HTTP_CLIENT};
use serde::Deserialize;

const SEARCH_FIELDS: &str = "summary,status,priority";

// Type-safe API response structures for the Jira REST API
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<IssueNode>,
}

#[derive(Debug, Deserialize)]
struct IssueNode {
    key: String,
    fields: FieldsNode,
}

#[derive(Debug, Deserialize)]
struct FieldsNode {
    summary: Option<String>,
    status: Option<StatusNode>,
    priority: Option<NamedNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusNode {
    name: String,
    status_category: Option<CategoryNode>,
}

#[derive(Debug, Deserialize)]
struct CategoryNode {
    key: String,
}

#[derive(Debug, Deserialize)]
struct NamedNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<TransitionNode>,
}

#[derive(Debug, Deserialize)]
struct TransitionNode {
    id: String,
    name: String,
    to: Option<NamedNode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: std::collections::BTreeMap<String, String>,
}

/// The REST call a response belongs to; status codes mean different things per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Search,
    ListTransitions,
    ApplyTransition,
}

/// Stateless client; all connections share [`HTTP_CLIENT`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JiraClient;

impl Tracker for JiraClient {
    async fn fetch_issues(
        &self,
        conn: &Connection,
        jql: &str,
        max_results: u32,
    ) -> Result<Vec<Issue>, TrackerError> {
        let url = format!("{}/rest/api/2/search", conn.base_url);
        let max_results = max_results.to_string();

        let request = HTTP_CLIENT.get(&url).query(&[
            ("jql", jql),
            ("maxResults", max_results.as_str()),
            ("fields", SEARCH_FIELDS),
        ]);

        let body = send(conn, request, Call::Search).await?;
        parse_search_response(&conn.base_url, &body)
    }

    async fn list_transitions(
        &self,
        conn: &Connection,
        issue_key: &str,
    ) -> Result<Vec<Transition>, TrackerError> {
        let request = HTTP_CLIENT.get(transitions_url(conn, issue_key));
        let body = send(conn, request, Call::ListTransitions)
            .await
            .map_err(|e| not_found_as_key(e, issue_key))?;
        parse_transitions_response(&body)
    }

    async fn apply_transition(
        &self,
        conn: &Connection,
        issue_key: &str,
        transition_id: &str,
    ) -> Result<(), TrackerError> {
        let request = HTTP_CLIENT
            .post(transitions_url(conn, issue_key))
            .json(&serde_json::json!({ "transition": { "id": transition_id } }));
        send(conn, request, Call::ApplyTransition)
            .await
            .map_err(|e| not_found_as_key(e, issue_key))?;
        tracing::info!("Applied transition {} to {}", transition_id, issue_key);
        Ok(())
    }
}

fn transitions_url(conn: &Connection, issue_key: &str) -> String {
    format!(
        "{}/rest/api/2/issue/{}/transitions",
        conn.base_url,
        urlencoding::encode(issue_key)
    )
}

fn not_found_as_key(e: TrackerError, issue_key: &str) -> TrackerError {
    match e {
        TrackerError::NotFound(_) => TrackerError::NotFound(issue_key.to_string()),
        other => other,
    }
}

/// Send an authorized request and return the body of a successful response.
async fn send(
    conn: &Connection,
    request: reqwest::RequestBuilder,
    call: Call,
) -> Result<String, TrackerError> {
    let response = conn
        .authorize(request)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| TrackerError::Network(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .map_err(|e| TrackerError::Network(e.to_string()))?;

    if (200..300).contains(&status) {
        Ok(body)
    } else {
        tracing::debug!("Jira {:?} failed with HTTP {}: {}", call, status, body);
        Err(error_for_status(call, status, &body))
    }
}

/// Map a non-success HTTP status to the error taxonomy.
pub fn error_for_status(call: Call, status: u16, body: &str) -> TrackerError {
    let message = error_message(body).unwrap_or_else(|| format!("HTTP {}", status));

    match (status, call) {
        (401 | 403, _) => TrackerError::Auth(message),
        (400, Call::Search) => TrackerError::Query(message),
        (400 | 409, Call::ApplyTransition) => TrackerError::Conflict(message),
        (404, Call::ListTransitions | Call::ApplyTransition) => TrackerError::NotFound(message),
        (429 | 500..=599, _) => TrackerError::Network(message),
        _ => TrackerError::Unexpected { status, message },
    }
}

/// Pull the human readable part out of a Jira error body
fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let mut messages = parsed.error_messages;
    messages.extend(parsed.errors.into_iter().map(|(field, msg)| format!("{}: {}", field, msg)));
    if messages.is_empty() {
        None
    } else {
        Some(messages.join("; "))
    }
}

/// Parse a `/search` response body into issues.
pub fn parse_search_response(base_url: &str, body: &str) -> Result<Vec<Issue>, TrackerError> {
    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| TrackerError::Unexpected {
        status: 200,
        message: format!("Invalid search response: {}", e),
    })?;

    Ok(parsed
        .issues
        .into_iter()
        .map(|node| parse_issue_node(base_url, node))
        .collect())
}

fn parse_issue_node(base_url: &str, node: IssueNode) -> Issue {
    let key = node.key.trim().to_string();
    let (status, status_category) = match node.fields.status {
        Some(s) => {
            let category = s
                .status_category
                .map(|c| StatusCategory::from_key(&c.key))
                .unwrap_or_default();
            (s.name, category)
        }
        None => (String::new(), StatusCategory::Unknown),
    };

    Issue {
        url: format!("{}/browse/{}", base_url, key),
        summary: node.fields.summary.unwrap_or_default(),
        status,
        status_category,
        priority: node.fields.priority.map(|p| p.name),
        key,
    }
}

/// Parse a `/issue/{key}/transitions` response body.
pub fn parse_transitions_response(body: &str) -> Result<Vec<Transition>, TrackerError> {
    let parsed: TransitionsResponse =
        serde_json::from_str(body).map_err(|e| TrackerError::Unexpected {
            status: 200,
            message: format!("Invalid transitions response: {}", e),
        })?;

    Ok(parsed
        .transitions
        .into_iter()
        .map(|t| Transition {
            id: t.id,
            name: t.name,
            to_status: t.to.map(|s| s.name),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status_per_call() {
        let body = r#"{"errorMessages":["Field 'foo' does not exist"],"errors":{}}"#;

        assert_eq!(
            error_for_status(Call::Search, 400, body),
            TrackerError::Query("Field 'foo' does not exist".to_string())
        );
        assert!(matches!(
            error_for_status(Call::ApplyTransition, 400, body),
            TrackerError::Conflict(_)
        ));
        assert!(matches!(
            error_for_status(Call::ApplyTransition, 409, ""),
            TrackerError::Conflict(_)
        ));
        assert!(matches!(error_for_status(Call::Search, 401, ""), TrackerError::Auth(_)));
        assert!(matches!(
            error_for_status(Call::ListTransitions, 404, ""),
            TrackerError::NotFound(_)
        ));
        assert!(matches!(error_for_status(Call::Search, 503, ""), TrackerError::Network(_)));
        assert_eq!(
            error_for_status(Call::Search, 418, "teapot"),
            TrackerError::Unexpected {
                status: 418,
                message: "HTTP 418".to_string()
            }
        );
    }

    #[test]
    fn test_error_message_includes_field_errors() {
        let body = r#"{"errorMessages":[],"errors":{"resolution":"Resolution is required."}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("resolution: Resolution is required.")
        );
    }

    #[test]
    fn test_transitions_url_encodes_key() {
        let conn = Connection {
            base_url: "https://jira.example.com".to_string(),
            auth: crate::integrations::Auth::Bearer {
                token: "t".to_string(),
            },
        };
        assert_eq!(
            transitions_url(&conn, "PROJ 1"),
            "https://jira.example.com/rest/api/2/issue/PROJ%201/transitions"
        );
    }
}
