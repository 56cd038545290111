pub mod jira;
pub mod pinned;

use crate::config::{env, AuthMode, Config, Group};
use crate::data::{GroupFetch, Issue, Transition};
use crate::error::TrackerError;
use once_cell::sync::Lazy;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Shared HTTP client for all API requests to enable connection pooling
pub static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(5)
        .user_agent(concat!("jira-tray/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Where and how to reach the tracker, resolved fresh for every poll so a
/// config reload or a rotated token takes effect without a restart.
#[derive(Clone)]
pub struct Connection {
    pub base_url: String,
    pub auth: Auth,
}

#[derive(Clone)]
pub enum Auth {
    Basic { email: String, token: String },
    Bearer { token: String },
}

impl Connection {
    pub fn from_config(config: &Config) -> Result<Self, TrackerError> {
        let token = env::resolve_token(config)?;
        let auth = match config.auth_mode {
            AuthMode::Basic => Auth::Basic {
                email: config.email.clone().unwrap_or_default(),
                token,
            },
            AuthMode::Bearer | AuthMode::Pat => Auth::Bearer { token },
        };
        Ok(Self {
            base_url: config.jira_url.clone(),
            auth,
        })
    }

    pub fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Auth::Basic { email, token } => request.basic_auth(email, Some(token)),
            Auth::Bearer { token } => request.bearer_auth(token),
        }
    }
}

// Never print tokens
impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = match &self.auth {
            Auth::Basic { email, .. } => format!("basic({})", email),
            Auth::Bearer { .. } => "bearer".to_string(),
        };
        f.debug_struct("Connection")
            .field("base_url", &self.base_url)
            .field("auth", &auth)
            .finish()
    }
}

/// Calls the poll engine and the action dispatcher need from an issue tracker.
///
/// Implementations hold no per-call state; every call can be retried on its own.
pub trait Tracker: Send + Sync {
    fn fetch_issues(
        &self,
        conn: &Connection,
        jql: &str,
        max_results: u32,
    ) -> impl Future<Output = Result<Vec<Issue>, TrackerError>> + Send;

    fn list_transitions(
        &self,
        conn: &Connection,
        issue_key: &str,
    ) -> impl Future<Output = Result<Vec<Transition>, TrackerError>> + Send;

    fn apply_transition(
        &self,
        conn: &Connection,
        issue_key: &str,
        transition_id: &str,
    ) -> impl Future<Output = Result<(), TrackerError>> + Send;
}

/// Fetch every group concurrently. Results keep the order of `groups`.
pub async fn fetch_groups<T: Tracker>(
    tracker: &T,
    conn: &Connection,
    groups: Vec<Group>,
) -> Vec<GroupFetch> {
    let fetches = groups.into_iter().map(|group| async move {
        tracing::debug!("Fetching group '{}'", group.name);
        let result = tracker
            .fetch_issues(conn, &group.jql, group.max_results)
            .await;
        GroupFetch { group, result }
    });

    futures::future::join_all(fetches).await
}
