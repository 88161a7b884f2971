// src/config/file.rs
// File-based configuration from ~/.ai-translator/config.toml

use crate::background::{DEFAULT_MIN_UPDATE_INTERVAL, DEFAULT_POLL_INTERVAL, WorkerConfig};
use crate::error::{Result, TranslatorError};
use crate::fast::DEFAULT_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Top-level config structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslatorConfig {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub worker: WorkerSection,
}

/// Console surface section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Last selected target language code
    pub language: Option<String>,
}

/// Language model section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub prompts_dir: Option<PathBuf>,
}

/// Worker timing section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    pub poll_interval_secs: f64,
    pub min_update_interval_secs: f64,
    pub fast_cache_capacity: usize,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs_f64(),
            min_update_interval_secs: DEFAULT_MIN_UPDATE_INTERVAL.as_secs_f64(),
            fast_cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl WorkerSection {
    /// Worker settings; non-positive or non-finite intervals fall back to defaults
    pub fn to_worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            poll_interval: secs_or(self.poll_interval_secs, DEFAULT_POLL_INTERVAL),
            min_update_interval: secs_or(self.min_update_interval_secs, DEFAULT_MIN_UPDATE_INTERVAL),
            cache_capacity: self.fast_cache_capacity,
        }
    }
}

fn secs_or(secs: f64, default: Duration) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        warn!(value = secs, default_secs = default.as_secs_f64(), "Invalid interval in config, using default");
        default
    }
}

impl TranslatorConfig {
    /// Load config from ~/.ai-translator/config.toml
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    debug!(path = %path.display(), "Loaded config from file");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    Self::default()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
        }
    }

    /// Write to ~/.ai-translator/config.toml
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| TranslatorError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ai-translator")
            .join("config.toml")
    }
}
