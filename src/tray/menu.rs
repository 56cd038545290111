//! Menu view model.
//!
//! `build_menu` turns the current state into a plain value the presentation
//! adapter renders as a tray menu. It never touches the network.

use super::Message;
use crate::config::{Config, TransitionMode};
use crate::data::{Issue, Snapshot, Transition};
use std::path::PathBuf;

const SUMMARY_WIDTH: usize = 50;
const DEFAULT_ICON_COLOR: &str = "blue";

#[derive(Debug, Clone, PartialEq)]
pub struct MenuView {
    pub tooltip: String,
    pub icon_color: &'static str,
    pub icon_path: Option<PathBuf>,
    /// Last poll problem, shown above the groups
    pub status: Option<String>,
    /// Pinned ("current") tickets, shown first
    pub pinned: Vec<MenuIssue>,
    pub sections: Vec<MenuSection>,
    pub actions: Vec<MenuAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuSection {
    pub title: String,
    pub items: Vec<MenuIssue>,
    /// Placeholder line when there is nothing to list
    pub empty_label: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuIssue {
    pub key: String,
    pub label: String,
    pub url: String,
    pub pinned: bool,
    pub can_transition: bool,
    /// Inline transitions (flat mode, after they were listed)
    pub transitions: Vec<MenuTransition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuTransition {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Search,
    OpenBoard,
    ReloadConfig,
    Refresh,
    Quit,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Search => "Search…",
            Self::OpenBoard => "Open board",
            Self::ReloadConfig => "Reload config",
            Self::Refresh => "Refresh",
            Self::Quit => "Quit",
        }
    }

    pub fn message(&self) -> Message {
        match self {
            Self::Search => Message::Search { term: None },
            Self::OpenBoard => Message::OpenBoard,
            Self::ReloadConfig => Message::ReloadConfig,
            Self::Refresh => Message::Refresh,
            Self::Quit => Message::Quit,
        }
    }
}

/// Inputs of the view that are not part of the snapshot
pub struct MenuState<'a> {
    pub pinned: &'a [String],
    /// Issue whose transitions are listed inline
    pub expanded: Option<(&'a str, &'a [Transition])>,
    pub status: Option<&'a str>,
}

pub fn build_menu(config: &Config, snapshot: &Snapshot, state: &MenuState<'_>) -> MenuView {
    let can_transition = config.transition_mode != TransitionMode::None;
    let make_item = |issue: &Issue| MenuIssue {
        key: issue.key.clone(),
        label: issue_label(issue),
        url: issue.url.clone(),
        pinned: state.pinned.contains(&issue.key),
        can_transition,
        transitions: match state.expanded {
            Some((key, transitions)) if key == issue.key && config.transition_mode == TransitionMode::Flat => {
                transitions
                    .iter()
                    .map(|t| MenuTransition {
                        id: t.id.clone(),
                        label: transition_label(t),
                    })
                    .collect()
            }
            _ => Vec::new(),
        },
    };

    let pinned = state
        .pinned
        .iter()
        .map(|key| match snapshot.find(key) {
            Some(issue) => make_item(issue),
            // Pinned but outside every group: still reachable by key
            None => MenuIssue {
                key: key.clone(),
                label: format!("📌 {}", key),
                url: config.issue_url(key),
                pinned: true,
                can_transition,
                transitions: Vec::new(),
            },
        })
        .collect();

    let sections = snapshot
        .groups
        .iter()
        .map(|group| MenuSection {
            title: format!("── {} ({}) ──", group.name, group.issues.len()),
            items: group.issues.iter().map(&make_item).collect(),
            empty_label: if group.issues.is_empty() && group.error.is_none() {
                Some("(empty)".to_string())
            } else {
                None
            },
            error: group.error.as_ref().map(|e| format!("⚠ {}", e)),
        })
        .collect();

    let mut actions = vec![MenuAction::Search];
    if config.board_url.is_some() {
        actions.push(MenuAction::OpenBoard);
    }
    actions.extend([MenuAction::ReloadConfig, MenuAction::Refresh, MenuAction::Quit]);

    MenuView {
        tooltip: tooltip(snapshot),
        icon_color: snapshot
            .highest_severity()
            .and_then(|s| s.color())
            .unwrap_or(DEFAULT_ICON_COLOR),
        icon_path: config.icon_path(),
        status: state.status.map(str::to_string),
        pinned,
        sections,
        actions,
    }
}

/// `🔴 PROJ-1 — Fix the login page [In Progress]`
pub fn issue_label(issue: &Issue) -> String {
    format!(
        "{} {} — {} [{}]",
        issue.severity().badge(),
        issue.key,
        truncate(&issue.summary, SUMMARY_WIDTH),
        issue.status
    )
}

pub fn transition_label(transition: &Transition) -> String {
    match &transition.to_status {
        Some(to) if *to != transition.name => format!("{} → {}", transition.name, to),
        _ => transition.name.clone(),
    }
}

fn tooltip(snapshot: &Snapshot) -> String {
    match snapshot.taken_at {
        Some(at) => format!(
            "Jira Issues: {} (updated {})",
            snapshot.total(),
            at.with_timezone(&chrono::Local).format("%H:%M")
        ),
        None => "Jira Issues: loading…".to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
