//! Config file watcher.
//!
//! Watches the directory holding the config file (editors often replace the
//! file instead of writing it in place) and reports changes to that one file.

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::UnboundedReceiver<()>,
}

impl ConfigWatcher {
    pub fn new(config_path: &Path) -> Result<Self> {
        let dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name: OsString = config_path
            .file_name()
            .context("Config path has no file name")?
            .to_os_string();

        let (tx, rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &file_name) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::debug!("Config watcher error: {}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
        tracing::debug!("Watching {} for config changes", config_path.display());

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Wait for the next change. Bursts of events (write + rename + chmod from
    /// one save) collapse into a single notification.
    pub async fn changed(&mut self) -> Option<()> {
        self.receiver.recv().await?;
        while self.receiver.try_recv().is_ok() {}
        Some(())
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_)
    ) && event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}
