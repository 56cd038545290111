use super::menu::{build_menu, issue_label, transition_label, MenuState, MenuView};
use super::presenter::Presenter;
use super::search::search_issues;
use super::Message;
use crate::config::{Config, ConfigStore, TransitionMode};
use crate::data::{build_snapshot, newly_seen, GroupFetch, Issue, Snapshot, Transition};
use crate::error::{ActionError, PollError, TrackerError};
use crate::integrations::pinned::{Pinned, PinnedSet};
use crate::integrations::{fetch_groups, Connection, Tracker};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

const APP_TITLE: &str = "Jira Tray";
/// Consecutive failed polls before the user is told about it
const FAILURE_NOTIFY_STREAK: u32 = 3;
/// Backoff stops growing at interval × 2^3
const MAX_BACKOFF_EXPONENT: u32 = 3;
const FAR_FUTURE: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// A poll about to run, detached from the app so it can run on a worker
pub struct PollJob {
    pub seq: u64,
    pub generation: u64,
    config: Arc<Config>,
}

/// Result of a background poll
#[derive(Debug)]
pub struct PollOutcome {
    pub seq: u64,
    pub generation: u64,
    pub result: Result<Vec<GroupFetch>, TrackerError>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    /// Snapshot replaced; keys that appeared since the previous poll
    Applied { new_issues: Vec<String> },
    /// Superseded by a newer poll or a config reload; ignored
    Stale,
}

impl PollJob {
    pub async fn run<T: Tracker>(self, tracker: &T) -> PollOutcome {
        let groups: Vec<_> = self.config.active_groups().cloned().collect();
        let result = match Connection::from_config(&self.config) {
            Ok(conn) => Ok(fetch_groups(tracker, &conn, groups).await),
            Err(e) => Err(e),
        };
        PollOutcome {
            seq: self.seq,
            generation: self.generation,
            result,
            finished_at: Utc::now(),
        }
    }
}

/// Single owner of all mutable state: active config, snapshot, seen keys and
/// pins. Every mutation goes through `update()` or `apply_poll()`, both called
/// from one event loop, so a poll result and a user action never interleave.
pub struct App<T, P> {
    store: ConfigStore,
    tracker: T,
    presenter: P,
    pins: PinnedSet,

    snapshot: Arc<Snapshot>,
    /// None until the first successful poll establishes a baseline
    seen: Option<HashSet<String>>,

    // Poll bookkeeping
    poll_seq: u64,
    applied_seq: u64,
    failure_streak: u32,
    last_error: Option<String>,
    next_poll_at: Instant,

    /// Issue whose transitions are listed inline (flat mode)
    expanded: Option<(String, Vec<Transition>)>,

    poll_tx: mpsc::UnboundedSender<PollOutcome>,
    poll_rx: mpsc::UnboundedReceiver<PollOutcome>,
}

impl<T, P> App<T, P>
where
    T: Tracker + Clone + 'static,
    P: Presenter,
{
    pub fn new(store: ConfigStore, tracker: T, presenter: P, pins: PinnedSet) -> Self {
        let (poll_tx, poll_rx) = mpsc::unbounded_channel();
        Self {
            store,
            tracker,
            presenter,
            pins,
            snapshot: Arc::new(Snapshot::default()),
            seen: None,
            poll_seq: 0,
            applied_seq: 0,
            failure_streak: 0,
            last_error: None,
            next_poll_at: Instant::now(),
            expanded: None,
            poll_tx,
            poll_rx,
        }
    }

    pub async fn update(&mut self, msg: Message) -> anyhow::Result<bool> {
        let result = match msg {
            // ─────────────────────────────────────────────────────────────────
            // App lifecycle
            // ─────────────────────────────────────────────────────────────────
            Message::Quit => return Ok(true),
            Message::Refresh => {
                self.start_background_poll();
                Ok(())
            }
            Message::ReloadConfig => self.reload(),

            // ─────────────────────────────────────────────────────────────────
            // Browser
            // ─────────────────────────────────────────────────────────────────
            Message::Open { key } => self.open_issue(&key),
            Message::OpenBoard => self.open_board(),

            // ─────────────────────────────────────────────────────────────────
            // Search, transitions, pins, clipboard
            // ─────────────────────────────────────────────────────────────────
            Message::Search { term } => self.search_and_open(term),
            Message::ShowTransitions { key } => self.show_transitions(&key).await,
            Message::Transition { key, transition_id } => {
                self.transition(&key, transition_id).await
            }
            Message::Pin { key } => self.pin(&key).map(|_| ()),
            Message::Unpin { key } => self.unpin(&key).map(|_| ()),
            Message::CopyLink { key } => self.copy_link(&key),
            Message::CopyTitle { key } => self.copy_title(&key),

            Message::None => Ok(()),
        };

        // User-initiated failures are always surfaced
        if let Err(e) = result {
            tracing::warn!("Action failed: {}", e);
            self.presenter.notify(APP_TITLE, &e.to_string());
        }
        Ok(false)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn config(&self) -> Arc<Config> {
        self.store.current()
    }

    pub fn config_path(&self) -> &std::path::Path {
        self.store.path()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn seen_keys(&self) -> Option<&HashSet<String>> {
        self.seen.as_ref()
    }

    pub fn pinned(&self) -> &[String] {
        self.pins.keys()
    }

    pub fn failure_streak(&self) -> u32 {
        self.failure_streak
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn expanded(&self) -> Option<(&str, &[Transition])> {
        self.expanded
            .as_ref()
            .map(|(key, transitions)| (key.as_str(), transitions.as_slice()))
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Establish the seen-keys baseline explicitly (the next poll then
    /// notifies about everything not in `keys`)
    pub fn seed_seen_keys(&mut self, keys: impl IntoIterator<Item = String>) {
        self.seen = Some(keys.into_iter().collect());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    pub fn menu_view(&self) -> MenuView {
        let config = self.store.current();
        let state = MenuState {
            pinned: self.pins.keys(),
            expanded: self.expanded(),
            status: self.last_error.as_deref(),
        };
        build_menu(&config, &self.snapshot, &state)
    }

    pub fn render(&mut self) {
        let view = self.menu_view();
        self.presenter.render_menu(&view);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Polling
    // ─────────────────────────────────────────────────────────────────────────

    /// Reserve a sequence number for a new poll against the active config
    pub fn begin_poll(&mut self) -> PollJob {
        self.poll_seq += 1;
        self.schedule_next_poll();
        PollJob {
            seq: self.poll_seq,
            generation: self.store.generation(),
            config: self.store.current(),
        }
    }

    /// Poll and apply the result before returning
    pub async fn refresh(&mut self) -> Result<PollStatus, PollError> {
        let job = self.begin_poll();
        let outcome = job.run(&self.tracker).await;
        self.apply_poll(outcome)
    }

    /// Poll on a worker task; the result arrives through `next_poll_result()`
    pub fn start_background_poll(&mut self) {
        let job = self.begin_poll();
        let tracker = self.tracker.clone();
        let tx = self.poll_tx.clone();
        tracing::debug!("Starting poll #{}", job.seq);

        tokio::spawn(async move {
            let outcome = job.run(&tracker).await;
            let _ = tx.send(outcome);
        });
    }

    pub async fn next_poll_result(&mut self) -> Option<PollOutcome> {
        self.poll_rx.recv().await
    }

    /// Fold a poll result into the state.
    ///
    /// New issues are computed against the seen-keys set of the previous
    /// cycle before the snapshot and the set are replaced.
    pub fn apply_poll(&mut self, outcome: PollOutcome) -> Result<PollStatus, PollError> {
        if outcome.seq <= self.applied_seq || outcome.generation != self.store.generation() {
            tracing::debug!(
                "Discarding stale poll #{} (generation {})",
                outcome.seq,
                outcome.generation
            );
            return Ok(PollStatus::Stale);
        }
        self.applied_seq = outcome.seq;

        let built = match outcome.result {
            Ok(fetches) => build_snapshot(&self.snapshot, fetches, outcome.finished_at),
            Err(e) => Err(PollError::Credentials(e)),
        };

        match built {
            Ok(snapshot) => {
                let new_issues: Vec<Issue> = match &self.seen {
                    Some(seen) => newly_seen(&snapshot, seen).into_iter().cloned().collect(),
                    None => Vec::new(),
                };

                if self.store.current().notifications {
                    for issue in &new_issues {
                        self.presenter
                            .notify("New Jira issue", &format!("{}: {}", issue.key, issue.summary));
                    }
                }

                self.seen = Some(snapshot.keys());
                self.snapshot = Arc::new(snapshot);
                self.failure_streak = 0;
                self.last_error = None;
                self.schedule_next_poll();
                tracing::info!(
                    "Poll #{}: {} issues, {} new",
                    outcome.seq,
                    self.snapshot.total(),
                    new_issues.len()
                );
                self.render();

                Ok(PollStatus::Applied {
                    new_issues: new_issues.into_iter().map(|i| i.key).collect(),
                })
            }
            Err(e) => {
                self.on_poll_failed(&e);
                Err(e)
            }
        }
    }

    fn on_poll_failed(&mut self, error: &PollError) {
        self.failure_streak += 1;
        self.last_error = Some(error.to_string());
        self.schedule_next_poll();

        match error {
            PollError::AllGroupsFailed { failures } => {
                for (group, e) in failures {
                    tracing::warn!("Group '{}' failed: {}", group, e);
                }
            }
            PollError::Credentials(e) => tracing::warn!("Poll failed: {}", e),
        }

        let is_auth = match error {
            PollError::Credentials(e) => e.is_auth(),
            PollError::AllGroupsFailed { failures } => failures.iter().any(|(_, e)| e.is_auth()),
        };
        if (is_auth && self.failure_streak == 1) || self.failure_streak == FAILURE_NOTIFY_STREAK {
            self.presenter.notify(APP_TITLE, &error.to_string());
        }
        self.render();
    }

    /// Delay before the next scheduled poll, backing off while polls fail
    pub fn next_poll_delay(&self) -> Duration {
        let interval = Duration::from_secs(self.store.current().poll_interval);
        let exponent = self.failure_streak.min(MAX_BACKOFF_EXPONENT);
        interval.saturating_mul(2u32.pow(exponent))
    }

    fn schedule_next_poll(&mut self) {
        let now = Instant::now();
        // Clamp to a year out when the delay does not fit in an Instant
        self.next_poll_at = now
            .checked_add(self.next_poll_delay())
            .unwrap_or_else(|| now + FAR_FUTURE);
    }

    pub fn next_poll_at(&self) -> Instant {
        self.next_poll_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Config
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-read the config file. On failure the active config stays in place.
    pub fn reload(&mut self) -> Result<(), ActionError> {
        let previous = self.store.current();
        let config = self.store.reload()?;

        // A different set of queries would flag every issue of a new group as new
        if config.groups != previous.groups {
            self.seen = None;
        }
        self.expanded = None;
        self.failure_streak = 0;
        self.last_error = None;
        self.render();
        self.start_background_poll();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn open_issue(&mut self, key: &str) -> Result<(), ActionError> {
        let url = match self.snapshot.find(key) {
            Some(issue) => issue.url.clone(),
            None => self.store.current().issue_url(key),
        };
        self.presenter.open_url(&url).map_err(ActionError::Presenter)
    }

    pub fn open_board(&mut self) -> Result<(), ActionError> {
        let config = self.store.current();
        let url = config.board_url.as_deref().ok_or(ActionError::NoBoard)?;
        self.presenter.open_url(url).map_err(ActionError::Presenter)
    }

    /// Search the cached snapshot
    pub fn search(&self, term: &str) -> Vec<Issue> {
        search_issues(&self.snapshot, term)
    }

    /// Ask for a term when none is given, offer the matches, open the chosen one
    pub fn search_and_open(&mut self, term: Option<String>) -> Result<(), ActionError> {
        let Some(term) = term.or_else(|| self.presenter.prompt_text("Search issues")) else {
            return Ok(());
        };

        let results = self.search(&term);
        if results.is_empty() {
            self.presenter
                .notify("Search", &format!("No issues match '{}'", term.trim()));
            return Ok(());
        }

        let labels: Vec<String> = results.iter().map(issue_label).collect();
        let title = format!("{} result(s) for '{}'", results.len(), term.trim());
        if let Some(issue) = self
            .presenter
            .prompt_choice(&title, &labels)
            .and_then(|i| results.get(i))
        {
            self.presenter
                .open_url(&issue.url)
                .map_err(ActionError::Presenter)?;
        }
        Ok(())
    }

    pub async fn show_transitions(&mut self, key: &str) -> Result<(), ActionError> {
        self.transition(key, None).await
    }

    /// Apply a transition. Without an id the available transitions are
    /// listed first: as a choice dialog in popup mode, inline in flat mode.
    pub async fn transition(
        &mut self,
        key: &str,
        transition_id: Option<String>,
    ) -> Result<(), ActionError> {
        let config = self.store.current();
        if config.transition_mode == TransitionMode::None {
            return Err(ActionError::TransitionsDisabled);
        }
        let conn = Connection::from_config(&config)?;

        let (id, name) = match transition_id {
            Some(id) => {
                let name = self.known_transition_name(key, &id).unwrap_or_else(|| id.clone());
                (id, name)
            }
            None => {
                let transitions = self.tracker.list_transitions(&conn, key).await?;
                if transitions.is_empty() {
                    self.presenter
                        .notify(APP_TITLE, &format!("No transitions available for {}", key));
                    return Ok(());
                }

                if config.transition_mode == TransitionMode::Flat {
                    self.expanded = Some((key.to_string(), transitions));
                    self.render();
                    return Ok(());
                }

                let labels: Vec<String> = transitions.iter().map(transition_label).collect();
                let Some(chosen) = self
                    .presenter
                    .prompt_choice(&format!("Transition {}", key), &labels)
                    .and_then(|i| transitions.get(i))
                else {
                    return Ok(());
                };
                (chosen.id.clone(), chosen.name.clone())
            }
        };

        self.tracker.apply_transition(&conn, key, &id).await?;

        if self.expanded.as_ref().is_some_and(|(k, _)| k == key) {
            self.expanded = None;
        }
        self.presenter
            .notify("Transition applied", &format!("{} → {}", key, name));
        self.start_background_poll();
        Ok(())
    }

    fn known_transition_name(&self, key: &str, id: &str) -> Option<String> {
        let (expanded_key, transitions) = self.expanded.as_ref()?;
        if expanded_key != key {
            return None;
        }
        transitions
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.clone())
    }

    pub fn pin(&mut self, key: &str) -> Result<Pinned, ActionError> {
        let policy = self.store.current().pin_policy;
        let outcome = self.pins.pin(key, policy)?;
        if let Pinned::Evicted(old) = &outcome {
            tracing::info!("Unpinned {} to make room for {}", old, key);
        }
        self.render();
        Ok(outcome)
    }

    pub fn unpin(&mut self, key: &str) -> Result<bool, ActionError> {
        let removed = self.pins.unpin(key)?;
        if removed {
            self.render();
        }
        Ok(removed)
    }

    pub fn copy_link(&mut self, key: &str) -> Result<(), ActionError> {
        let url = self.store.current().issue_url(key);
        self.presenter
            .copy_to_clipboard(&url)
            .map_err(ActionError::Presenter)
    }

    pub fn copy_title(&mut self, key: &str) -> Result<(), ActionError> {
        let title = match self.snapshot.find(key) {
            Some(issue) => format!("{} {}", issue.key, issue.summary),
            None => key.to_string(),
        };
        self.presenter
            .copy_to_clipboard(&title)
            .map_err(ActionError::Presenter)
    }
}
