//! jira-tray - System tray poller for Jira-compatible issue trackers
//!
//! This library crate exposes internal modules for integration testing.

pub mod config;
pub mod data;
pub mod error;
pub mod integrations;
pub mod tray;
