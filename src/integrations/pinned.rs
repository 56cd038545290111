//! Pinned ("current") tickets.
//!
//! At most [`MAX_PINNED`] issue keys, kept in pin order and persisted as JSON
//! so they survive restarts. The file is rewritten under an exclusive lock
//! after every change and is not meant to be edited by hand.

use crate::config::PinPolicy;
use crate::error::PinError;
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const MAX_PINNED: usize = 2;

/// On-disk format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PinnedFile {
    /// Schema version for forward compatibility
    version: u32,
    keys: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PinnedSet {
    keys: Vec<String>,
    /// None = not persisted
    path: Option<PathBuf>,
}

/// What a successful pin did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pinned {
    Added,
    /// Added after dropping the oldest pin
    Evicted(String),
}

impl PinnedSet {
    /// Load from `path`. A missing or unreadable file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let keys = match read_keys(&path) {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!("Ignoring pinned tickets file: {:#}", e);
                Vec::new()
            }
        };
        Self {
            keys,
            path: Some(path),
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    pub fn is_full(&self) -> bool {
        self.keys.len() >= MAX_PINNED
    }

    /// Pin `key`. Nothing changes when this returns an error.
    pub fn pin(&mut self, key: &str, policy: PinPolicy) -> Result<Pinned, PinError> {
        if self.contains(key) {
            return Err(PinError::AlreadyPinned {
                key: key.to_string(),
            });
        }

        let mut keys = self.keys.clone();
        let mut outcome = Pinned::Added;
        if keys.len() >= MAX_PINNED {
            match policy {
                PinPolicy::Reject => return Err(PinError::Limit { limit: MAX_PINNED }),
                PinPolicy::EvictOldest => outcome = Pinned::Evicted(keys.remove(0)),
            }
        }
        keys.push(key.to_string());

        self.commit(keys)?;
        Ok(outcome)
    }

    /// Unpin `key`. Unpinning a key that isn't pinned is a no-op.
    pub fn unpin(&mut self, key: &str) -> Result<bool, PinError> {
        if !self.contains(key) {
            return Ok(false);
        }
        let keys = self.keys.iter().filter(|k| *k != key).cloned().collect();
        self.commit(keys)?;
        Ok(true)
    }

    fn commit(&mut self, keys: Vec<String>) -> Result<(), PinError> {
        if let Some(path) = &self.path {
            write_keys(path, &keys).map_err(|e| PinError::Persist(format!("{:#}", e)))?;
        }
        self.keys = keys;
        Ok(())
    }
}

fn read_keys(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    file.lock_shared()?; // Shared lock for reading

    let mut content = String::new();
    let mut reader = std::io::BufReader::new(&file);
    reader.read_to_string(&mut content)?;

    file.unlock()?;

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let parsed: PinnedFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut keys = Vec::new();
    for key in parsed.keys {
        if keys.len() < MAX_PINNED && !keys.contains(&key) {
            keys.push(key);
        }
    }
    Ok(keys)
}

fn write_keys(path: &Path, keys: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(&PinnedFile {
        version: 1,
        keys: keys.to_vec(),
    })?;

    // Truncate only once the lock is held so readers never see an empty file
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    file.lock_exclusive()?;
    file.set_len(0)?;

    let mut writer = std::io::BufWriter::new(&file);
    writer.write_all(content.as_bytes())?;
    writer.flush()?;
    drop(writer);

    file.unlock()?;
    Ok(())
}
