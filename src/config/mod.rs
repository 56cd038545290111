pub mod env;

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub jira_url: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    #[serde(default = "default_true")]
    pub notifications: bool,
    #[serde(default)]
    pub transition_mode: TransitionMode,
    #[serde(default)]
    pub board_url: Option<String>,
    #[serde(default)]
    pub icon: Option<PathBuf>,
    #[serde(default)]
    pub env_file: Option<PathBuf>,
    #[serde(default)]
    pub auth_mode: AuthMode,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default)]
    pub pin_policy: PinPolicy,
    /// Reload automatically when the config file changes on disk
    #[serde(default = "default_true")]
    pub watch_config: bool,
    #[serde(default)]
    pub groups: Vec<Group>,
}

/// A saved query rendered as one menu section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub jql: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    #[serde(default)]
    pub sort_by: SortKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Email + API token (Jira Cloud)
    Basic,
    #[default]
    Bearer,
    /// Personal access token (Jira Server / Data Center)
    Pat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
    None,
    /// Transitions listed inline under the issue
    Flat,
    /// Transitions offered through a choice dialog
    #[default]
    Popup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Priority,
    Status,
    Key,
}

/// What happens when a ticket is pinned while the pinned set is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinPolicy {
    #[default]
    Reject,
    EvictOldest,
}

/// Upper bound for `poll_interval`, in seconds
pub const MAX_POLL_INTERVAL: u64 = 86_400;

fn default_poll_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_max_results() -> u32 {
    20
}

fn default_token_env() -> String {
    "JIRA_API_TOKEN".to_string()
}

impl Config {
    /// Parse and validate YAML content. `path` is only used for error messages.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.jira_url = config.jira_url.trim().trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match reqwest::Url::parse(&self.jira_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::invalid(
                    "jira_url",
                    format!("'{}' is not an http(s) URL", self.jira_url),
                ))
            }
        }

        if self.auth_mode == AuthMode::Basic
            && self.email.as_deref().map_or(true, |e| e.trim().is_empty())
        {
            return Err(ConfigError::invalid("email", "required when auth_mode is basic"));
        }

        if self.token_env.trim().is_empty() {
            return Err(ConfigError::invalid("token_env", "must name an environment variable"));
        }

        if self.poll_interval == 0 {
            return Err(ConfigError::invalid("poll_interval", "must be at least 1 second"));
        }
        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(ConfigError::invalid(
                "poll_interval",
                format!("must be at most {} seconds (one day)", MAX_POLL_INTERVAL),
            ));
        }

        let mut names = HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.name.trim().is_empty() {
                return Err(ConfigError::invalid(format!("groups[{}].name", i), "must not be empty"));
            }
            if !names.insert(group.name.as_str()) {
                return Err(ConfigError::invalid(
                    format!("groups[{}].name", i),
                    format!("duplicate group name '{}'", group.name),
                ));
            }
            if group.jql.trim().is_empty() {
                return Err(ConfigError::invalid(format!("groups[{}].jql", i), "must not be empty"));
            }
            if group.max_results == 0 {
                return Err(ConfigError::invalid(
                    format!("groups[{}].max_results", i),
                    "must be positive",
                ));
            }
        }

        Ok(())
    }

    pub fn active_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| g.active)
    }

    /// Browser URL of an issue
    pub fn issue_url(&self, key: &str) -> String {
        format!("{}/browse/{}", self.jira_url, key)
    }

    pub fn icon_path(&self) -> Option<PathBuf> {
        self.icon.as_deref().map(expand_tilde)
    }

    pub fn env_file_path(&self) -> Option<PathBuf> {
        self.env_file.as_deref().map(expand_tilde)
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("sysTrayJira"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.yaml"))
}

/// Location of the persisted pinned tickets
pub fn pinned_state_path() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "jira-tray")
        .context("Could not determine data directory")?
        .data_dir()
        .to_path_buf();
    Ok(dir.join("pinned.json"))
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Config::from_yaml(&content, path)
}

/// Owner of the active configuration.
///
/// A reload builds a complete new `Config`; the active one is only replaced when
/// the new one validates, so a bad edit never leaves a half-applied config behind.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    active: Arc<Config>,
    generation: u64,
}

impl ConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = load(&path)?;
        Ok(Self {
            path,
            active: Arc::new(config),
            generation: 0,
        })
    }

    /// Wrap an already loaded configuration (tests, embedding)
    pub fn from_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            active: Arc::new(config),
            generation: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Arc<Config> {
        Arc::clone(&self.active)
    }

    /// Bumped on every successful reload
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reload(&mut self) -> Result<Arc<Config>, ConfigError> {
        let config = load(&self.path)?;
        self.active = Arc::new(config);
        self.generation += 1;
        tracing::info!("Reloaded config from {}", self.path.display());
        Ok(self.current())
    }
}

const DEFAULT_CONFIG: &str = r#"jira_url: "https://your-jira-instance.com"
email: "your-email@example.com"
poll_interval: 300
auto_refresh: true
notifications: true

# Transition menu: "none", "flat" (inline entries) or "popup" (choice dialog)
transition_mode: "popup"

# Board opened from the menu (optional)
# board_url: "https://your-jira-instance.com/jira/software/projects/PROJ/boards/1"

# Custom icon (optional, path to PNG/ICO file)
# icon: "~/.config/sysTrayJira/jira.png"

# Env file (bash-style with 'export' supported)
# env_file: "~/.env"

# Auth mode: "basic" (email + token), "bearer" (token only), "pat" (Personal Access Token)
auth_mode: "bearer"
# Env var name containing the token
token_env: "JIRA_API_TOKEN"

# Third pin: "reject" or "evict_oldest"
pin_policy: "reject"

groups:
  - name: "My Open Issues"
    jql: "assignee = currentUser() AND resolution = Unresolved ORDER BY priority DESC"
    active: true
    max_results: 20
    sort_by: "priority"
"#;

/// Write the default config if none exists. Returns false when a config is already there.
pub fn init(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(true)
}
