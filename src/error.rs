//! Error taxonomy shared by the config layer, the tracker client, the poll
//! engine and the action dispatcher.

use std::path::PathBuf;
use thiserror::Error;

/// Invalid or unreadable configuration.
///
/// Fatal at startup, non-fatal on reload (the previous configuration stays active).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found at {path}. Run `jira-tray --init` to create one.")]
    NotFound { path: PathBuf },

    #[error("Failed to read config from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config from {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single call against the issue tracker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("API token not found: set ${var} or add it to the configured env_file")]
    MissingCredential { var: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Query rejected: {0}")]
    Query(String),

    #[error("Issue not found: {0}")]
    NotFound(String),

    #[error("Transition rejected: {0}")]
    Conflict(String),

    #[error("Unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },
}

impl TrackerError {
    /// Errors the user has to act on (as opposed to transient ones).
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::MissingCredential { .. })
    }
}

/// A poll cycle that produced no usable snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollError {
    #[error("Cannot reach the tracker: {0}")]
    Credentials(TrackerError),

    #[error("All {} groups failed to refresh", failures.len())]
    AllGroupsFailed { failures: Vec<(String, TrackerError)> },
}

/// Rejected pin/unpin request.
#[derive(Error, Debug)]
pub enum PinError {
    #[error("At most {limit} tickets can be pinned; unpin one first")]
    Limit { limit: usize },

    #[error("{key} is already pinned")]
    AlreadyPinned { key: String },

    #[error("Failed to save pinned tickets: {0}")]
    Persist(String),
}

/// A user-triggered action that could not be carried out.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Pin(#[from] PinError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Transitions are disabled (transition_mode: none)")]
    TransitionsDisabled,

    #[error("No board_url configured")]
    NoBoard,

    #[error(transparent)]
    Presenter(anyhow::Error),
}
