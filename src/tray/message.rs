//! Message enum for Elm Architecture (TEA) pattern.
//!
//! Every user action coming from the presentation adapter (menu click, dialog,
//! console command) is a message processed by `App::update()`. Background poll
//! results and config change events arrive on their own channels.

/// All possible user actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // ─────────────────────────────────────────────────────────────────────────
    // App lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Quit the application
    Quit,
    /// Start a poll now
    Refresh,
    /// Re-read the config file, then poll
    ReloadConfig,

    // ─────────────────────────────────────────────────────────────────────────
    // Browser
    // ─────────────────────────────────────────────────────────────────────────
    /// Open an issue in the browser
    Open { key: String },
    /// Open the configured board
    OpenBoard,

    // ─────────────────────────────────────────────────────────────────────────
    // Search
    // ─────────────────────────────────────────────────────────────────────────
    /// Search cached issues; asks for a term when none is given
    Search { term: Option<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // Transitions
    // ─────────────────────────────────────────────────────────────────────────
    /// List transitions (inline in flat mode, as a choice dialog in popup mode)
    ShowTransitions { key: String },
    /// Apply a transition; asks for one when no id is given
    Transition {
        key: String,
        transition_id: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Pinned tickets
    // ─────────────────────────────────────────────────────────────────────────
    Pin { key: String },
    Unpin { key: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Clipboard
    // ─────────────────────────────────────────────────────────────────────────
    CopyLink { key: String },
    CopyTitle { key: String },

    /// No operation (unrecognised input)
    None,
}
