// src/config/env.rs
// Environment-based configuration - every env var the translator reads

use std::fmt::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Env file loaded before the environment is read, overriding it
pub const ENV_LOCAL_FILE: &str = ".env.local";

/// API keys loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// OpenAI-compatible API key (OPENAI_API_KEY)
    pub openai: Option<String>,
}

impl ApiKeys {
    /// Load API keys from environment variables
    ///
    /// Set `TRANSLATOR_DISABLE_LLM=1` to suppress the key (fast pass only)
    pub fn from_env() -> Self {
        if parse_bool_env("TRANSLATOR_DISABLE_LLM").unwrap_or(false) {
            info!("TRANSLATOR_DISABLE_LLM is set, language model disabled");
            return Self::default();
        }

        let keys = Self {
            openai: Self::read_key("OPENAI_API_KEY"),
        };
        keys.log_status();
        keys
    }

    /// Read a single API key from environment, filtering empty values
    fn read_key(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|k| !k.trim().is_empty())
    }

    fn log_status(&self) {
        if self.openai.is_some() {
            debug!("OpenAI API key loaded");
        } else {
            warn!("No OPENAI_API_KEY configured - only fast translations will be available");
        }
    }

    pub fn has_llm_provider(&self) -> bool {
        self.openai.is_some()
    }

    pub fn summary(&self) -> String {
        if self.openai.is_some() {
            "OpenAI".to_string()
        } else {
            "None".to_string()
        }
    }
}

/// Configuration validation result
#[derive(Debug, Default)]
pub struct ConfigValidation {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    /// Format as a human-readable report
    pub fn report(&self) -> String {
        if self.errors.is_empty() && self.warnings.is_empty() {
            return "Configuration OK".to_string();
        }

        let mut out = String::new();
        for (heading, items) in [("Errors:", &self.errors), ("Warnings:", &self.warnings)] {
            if items.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(heading);
            for item in items {
                let _ = write!(out, "\n  - {}", item);
            }
        }
        out
    }
}

/// Environment configuration - all env vars in one place
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub api_keys: ApiKeys,
    /// Chat model override (TRANSLATOR_MODEL)
    pub model: Option<String>,
    /// API root override (TRANSLATOR_API_BASE)
    pub api_base: Option<String>,
    /// Prompt override directory (TRANSLATOR_PROMPTS_DIR)
    pub prompts_dir: Option<PathBuf>,
}

impl EnvConfig {
    /// Load `.env.local` (if present) and then the environment. Call once at startup.
    pub fn load() -> Self {
        load_env_file(Path::new(ENV_LOCAL_FILE));
        Self::from_env()
    }

    /// Read the environment as it is now
    pub fn from_env() -> Self {
        info!("Loading environment configuration");

        Self {
            api_keys: ApiKeys::from_env(),
            model: read_var("TRANSLATOR_MODEL"),
            api_base: read_var("TRANSLATOR_API_BASE"),
            prompts_dir: read_var("TRANSLATOR_PROMPTS_DIR").map(PathBuf::from),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigValidation {
        let mut validation = ConfigValidation::new();

        if !self.api_keys.has_llm_provider() {
            validation.add_warning(
                "No language model API key configured. Set OPENAI_API_KEY or use :key in the console.",
            );
        }

        if let Some(ref base) = self.api_base
            && !(base.starts_with("http://") || base.starts_with("https://"))
        {
            validation.add_error(format!(
                "TRANSLATOR_API_BASE '{}' must start with http:// or https://",
                base
            ));
        }

        if let Some(ref dir) = self.prompts_dir
            && !dir.is_dir()
        {
            validation.add_warning(format!(
                "TRANSLATOR_PROMPTS_DIR '{}' is not a directory, built-in prompts will be used",
                dir.display()
            ));
        }

        validation
    }
}

/// Load variables from an env file, overriding the current environment
pub fn load_env_file(path: &Path) {
    if !path.is_file() {
        return;
    }
    match dotenvy::from_path_override(path) {
        Ok(()) => debug!(path = %path.display(), "Loaded env file"),
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to load env file"),
    }
}

fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_bool_env(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?.to_lowercase();
    match value.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_keys_summary() {
        let keys = ApiKeys::default();
        assert!(!keys.has_llm_provider());
        assert_eq!(keys.summary(), "None");

        let keys = ApiKeys {
            openai: Some("sk-test".to_string()),
        };
        assert!(keys.has_llm_provider());
        assert_eq!(keys.summary(), "OpenAI");
    }

    #[test]
    fn test_validation_no_keys_is_warning() {
        let validation = EnvConfig::default().validate();
        assert!(validation.is_valid());
        assert_eq!(validation.warnings.len(), 1);
    }

    #[test]
    fn test_validation_bad_api_base() {
        let config = EnvConfig {
            api_keys: ApiKeys {
                openai: Some("sk-test".into()),
            },
            api_base: Some("api.openai.com".into()),
            ..Default::default()
        };
        let validation = config.validate();
        assert!(!validation.is_valid());
        assert!(validation.report().contains("Errors:"));
    }

    #[test]
    fn test_validation_missing_prompts_dir() {
        let config = EnvConfig {
            api_keys: ApiKeys {
                openai: Some("sk-test".into()),
            },
            prompts_dir: Some(PathBuf::from("/nonexistent/prompts")),
            ..Default::default()
        };
        let validation = config.validate();
        assert!(validation.is_valid());
        assert!(validation.report().contains("not a directory"));
    }

    #[test]
    fn test_report_ok() {
        assert_eq!(ConfigValidation::new().report(), "Configuration OK");
    }

    #[test]
    fn test_load_env_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.local");
        std::fs::write(&path, "AI_TRANSLATOR_TEST_OVERRIDE=from-file\n").unwrap();

        // SAFETY: test-only variable, not read by any other test
        unsafe { std::env::set_var("AI_TRANSLATOR_TEST_OVERRIDE", "from-env") };
        load_env_file(&path);
        assert_eq!(std::env::var("AI_TRANSLATOR_TEST_OVERRIDE").unwrap(), "from-file");
    }
}
