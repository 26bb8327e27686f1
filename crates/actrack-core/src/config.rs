use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl StorageConfig {
    /// Directory holding one JSON file per project.
    #[must_use]
    pub fn resolved_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir().map_or_else(
            || PathBuf::from("project_data"),
            |dir| dir.join("actrack").join("projects"),
        )
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_timeout_ms)
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_max_tokens() -> u32 {
    2048
}

const fn default_timeout_secs() -> u64 {
    120
}

const fn default_lock_timeout_ms() -> u64 {
    5000
}

/// Default user config location: `<config_dir>/actrack/config.toml`.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("actrack").join("config.toml"))
}

/// Load config from `explicit` (must exist) or the user config path (optional).
pub fn load_config(explicit: Option<&Path>) -> Result<TrackerConfig> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    match user_config_path() {
        Some(path) if path.exists() => read_config(&path),
        _ => Ok(TrackerConfig::default()),
    }
}

fn read_config(path: &Path) -> Result<TrackerConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<TrackerConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Environment overrides, applied by the binary before handing config to the core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl EnvOverrides {
    /// Read `LLM_MODEL`, `LLM_BASE_URL` and `ACTION_ITEM_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        let read = |key: &str| env::var(key).ok().filter(|value| !value.trim().is_empty());
        Self {
            model: read("LLM_MODEL"),
            base_url: read("LLM_BASE_URL"),
            data_dir: read("ACTION_ITEM_DIR").map(PathBuf::from),
        }
    }
}

pub fn apply_env_overrides(config: &mut TrackerConfig, overrides: EnvOverrides) {
    if let Some(model) = overrides.model {
        config.oracle.model = model;
    }
    if let Some(base_url) = overrides.base_url {
        config.oracle.base_url = base_url;
    }
    if let Some(dir) = overrides.data_dir {
        config.storage.data_dir = Some(dir);
    }
}
