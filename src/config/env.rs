//! API token resolution.
//!
//! The token is read from the environment variable named by `token_env`. When
//! the variable is not set, the optional bash-style `env_file` is consulted.
//! The file is parsed into a map; the process environment is never modified.

use super::Config;
use crate::error::TrackerError;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

static ENV_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:export\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$")
        .expect("Failed to compile env line pattern")
});

/// Parse `KEY=value` lines. Supports `export` prefixes, `#` comments and quoted values.
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some(caps) = ENV_LINE.captures(line) else {
            continue;
        };

        let value = unquote(caps[2].trim());
        if value.is_empty() {
            continue;
        }

        // First definition wins, like a shell `setdefault`
        vars.entry(caps[1].to_string())
            .or_insert_with(|| value.to_string());
    }

    vars
}

fn unquote(value: &str) -> &str {
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
}

pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read env file {}", path.display()))?;
    Ok(parse_env_file(&content))
}

/// Resolve the API token for `config`.
pub fn resolve_token(config: &Config) -> std::result::Result<String, TrackerError> {
    if let Ok(token) = std::env::var(&config.token_env) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(path) = config.env_file_path() {
        match load_env_file(&path) {
            Ok(vars) => {
                if let Some(token) = vars.get(&config.token_env) {
                    return Ok(token.clone());
                }
            }
            Err(e) => tracing::debug!("{:#}", e),
        }
    }

    Err(TrackerError::MissingCredential {
        var: config.token_env.clone(),
    })
}
