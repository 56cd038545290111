//! Test utilities and fixtures for jira-tray tests
#![allow(dead_code)]

use jira_tray::config::{Config, ConfigStore};
use jira_tray::data::{Issue, StatusCategory, Transition};
use jira_tray::error::TrackerError;
use jira_tray::integrations::pinned::PinnedSet;
use jira_tray::integrations::{Connection, Tracker};
use jira_tray::tray::menu::MenuView;
use jira_tray::tray::{App, Presenter};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Env var holding the token in test configs; every test sets the same value
pub const TOKEN_ENV: &str = "JIRA_TRAY_TEST_TOKEN";

pub type TestApp = App<FakeTracker, RecordingPresenter>;

pub fn issue(key: &str, summary: &str, priority: Option<&str>) -> Issue {
    Issue {
        key: key.to_string(),
        summary: summary.to_string(),
        status: "Open".to_string(),
        status_category: StatusCategory::ToDo,
        priority: priority.map(str::to_string),
        url: format!("https://jira.example.com/browse/{}", key),
    }
}

pub fn issues(keys: &[&str]) -> Vec<Issue> {
    keys.iter().map(|k| issue(k, &format!("Issue {}", k), None)).collect()
}

pub fn transition(id: &str, name: &str, to: &str) -> Transition {
    Transition {
        id: id.to_string(),
        name: name.to_string(),
        to_status: Some(to.to_string()),
    }
}

/// Config YAML with the test token env and the given extra lines/groups
pub fn config_yaml(extra: &str) -> String {
    format!(
        "jira_url: \"https://jira.example.com\"\ntoken_env: \"{}\"\nwatch_config: false\n{}",
        TOKEN_ENV, extra
    )
}

pub const ONE_GROUP: &str = "groups:\n  - name: \"Mine\"\n    jql: \"assignee = currentUser()\"\n    sort_by: \"key\"\n";

pub const TWO_GROUPS: &str = "groups:\n  - name: \"Mine\"\n    jql: \"assignee = currentUser()\"\n    sort_by: \"key\"\n  - name: \"Team\"\n    jql: \"project = TEAM\"\n    sort_by: \"key\"\n";

pub fn config(extra: &str) -> Config {
    Config::from_yaml(&config_yaml(extra), Path::new("config.yaml")).unwrap()
}

pub fn set_token() {
    std::env::set_var(TOKEN_ENV, "test-token");
}

pub fn test_app(config: Config, tracker: FakeTracker) -> TestApp {
    set_token();
    let store = ConfigStore::from_config("config.yaml", config);
    App::new(store, tracker, RecordingPresenter::default(), PinnedSet::in_memory())
}

// ─────────────────────────────────────────────────────────────────────────────
// Fake tracker
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct TrackerState {
    results: HashMap<String, Result<Vec<Issue>, TrackerError>>,
    transitions: HashMap<String, Vec<Transition>>,
    apply_error: Option<TrackerError>,
    applied: Vec<(String, String)>,
    fetches: usize,
}

/// In-memory tracker; clones share state so a test can change answers after
/// handing a clone to the app.
#[derive(Clone, Default)]
pub struct FakeTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_issues(&self, jql: &str, issues: Vec<Issue>) {
        self.state.lock().unwrap().results.insert(jql.to_string(), Ok(issues));
    }

    pub fn set_error(&self, jql: &str, error: TrackerError) {
        self.state.lock().unwrap().results.insert(jql.to_string(), Err(error));
    }

    pub fn set_transitions(&self, key: &str, transitions: Vec<Transition>) {
        self.state
            .lock()
            .unwrap()
            .transitions
            .insert(key.to_string(), transitions);
    }

    pub fn fail_transitions_with(&self, error: TrackerError) {
        self.state.lock().unwrap().apply_error = Some(error);
    }

    pub fn applied(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().applied.clone()
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }
}

impl Tracker for FakeTracker {
    async fn fetch_issues(
        &self,
        _conn: &Connection,
        jql: &str,
        _max_results: u32,
    ) -> Result<Vec<Issue>, TrackerError> {
        let mut state = self.state.lock().unwrap();
        state.fetches += 1;
        state.results.get(jql).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn list_transitions(
        &self,
        _conn: &Connection,
        issue_key: &str,
    ) -> Result<Vec<Transition>, TrackerError> {
        self.state
            .lock()
            .unwrap()
            .transitions
            .get(issue_key)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(issue_key.to_string()))
    }

    async fn apply_transition(
        &self,
        _conn: &Connection,
        issue_key: &str,
        transition_id: &str,
    ) -> Result<(), TrackerError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.apply_error.clone() {
            return Err(e);
        }
        state
            .applied
            .push((issue_key.to_string(), transition_id.to_string()));
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording presenter
// ─────────────────────────────────────────────────────────────────────────────

/// Records everything the core asks of the platform; prompts answer from
/// queues (an empty queue means "cancelled").
#[derive(Default)]
pub struct RecordingPresenter {
    pub renders: Vec<MenuView>,
    pub notifications: Vec<(String, String)>,
    pub clipboard: Vec<String>,
    pub opened: Vec<String>,
    pub prompts: Vec<(String, Vec<String>)>,
    pub choices: VecDeque<usize>,
    pub texts: VecDeque<String>,
}

impl RecordingPresenter {
    pub fn last_menu(&self) -> &MenuView {
        self.renders.last().expect("menu was never rendered")
    }

    pub fn notification_bodies(&self) -> Vec<&str> {
        self.notifications.iter().map(|(_, body)| body.as_str()).collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render_menu(&mut self, view: &MenuView) {
        self.renders.push(view.clone());
    }

    fn prompt_choice(&mut self, title: &str, options: &[String]) -> Option<usize> {
        self.prompts.push((title.to_string(), options.to_vec()));
        self.choices.pop_front()
    }

    fn prompt_text(&mut self, label: &str) -> Option<String> {
        self.prompts.push((label.to_string(), Vec::new()));
        self.texts.pop_front()
    }

    fn notify(&mut self, title: &str, body: &str) {
        self.notifications.push((title.to_string(), body.to_string()));
    }

    fn copy_to_clipboard(&mut self, text: &str) -> anyhow::Result<()> {
        self.clipboard.push(text.to_string());
        Ok(())
    }

    fn open_url(&mut self, url: &str) -> anyhow::Result<()> {
        self.opened.push(url.to_string());
        Ok(())
    }
}
