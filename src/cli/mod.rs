// src/cli/mod.rs
// CLI definition and settings resolution

use crate::background::WorkerConfig;
use crate::config::{DEFAULT_LANGUAGE_CODE, EnvConfig, LanguageCatalog, TranslatorConfig};
use crate::llm::{DEFAULT_API_BASE, DEFAULT_MODEL};
use crate::types::Language;
use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;

pub mod console;

pub use console::{ConsoleSink, run_console};

#[derive(Parser)]
#[command(name = "ai-translator")]
#[command(about = "Progressive translation: fast machine pass, refined by a language model")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Target language code or name (e.g. "de" or "German")
    #[arg(short, long, global = true)]
    pub language: Option<String>,

    /// Chat model for the improved translation
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Directory with translate_shallow.txt / translate_deep.txt overrides
    #[arg(long, global = true)]
    pub prompts_dir: Option<PathBuf>,

    /// JSON file with the language catalog ({"code": "Name"})
    #[arg(long, global = true)]
    pub languages_file: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Interactive console (default)
    Run,
    /// List available target languages
    Languages,
    /// Validate and print the effective configuration
    Config,
}

/// Effective settings after merging CLI, environment and config file
#[derive(Debug, Clone)]
pub struct Settings {
    pub language: Language,
    pub model: String,
    pub api_base: String,
    pub prompts_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub worker: WorkerConfig,
}

impl Settings {
    /// Precedence: CLI flag, environment, config file, built-in default
    pub fn resolve(
        cli: &Cli,
        env: &EnvConfig,
        file: &TranslatorConfig,
        catalog: &LanguageCatalog,
    ) -> Result<Self> {
        let language = match cli.language.as_deref() {
            Some(requested) => catalog
                .resolve(requested)
                .ok_or_else(|| anyhow!("Unknown language '{}'. Run `ai-translator languages` for the list.", requested))?,
            None => Self::saved_language(file, catalog)?,
        };

        let model = cli
            .model
            .clone()
            .or_else(|| env.model.clone())
            .or_else(|| file.llm.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base = env
            .api_base
            .clone()
            .or_else(|| file.llm.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let prompts_dir = cli
            .prompts_dir
            .clone()
            .or_else(|| env.prompts_dir.clone())
            .or_else(|| file.llm.prompts_dir.clone());

        Ok(Self {
            language,
            model,
            api_base,
            prompts_dir,
            api_key: env.api_keys.openai.clone(),
            worker: file.worker.to_worker_config(),
        })
    }

    fn saved_language(file: &TranslatorConfig, catalog: &LanguageCatalog) -> Result<Language> {
        if let Some(code) = file.ui.language.as_deref() {
            match catalog.by_code(code) {
                Some(language) => return Ok(language),
                None => warn!(code, "Saved language is not in the catalog, using default"),
            }
        }

        catalog
            .by_code(DEFAULT_LANGUAGE_CODE)
            .or_else(|| catalog.iter().next())
            .ok_or_else(|| anyhow!("Language catalog is empty"))
    }

    /// Human-readable summary for `ai-translator config`
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Language:      {} ({})", self.language.display_name, self.language.code),
            format!("Model:         {}", self.model),
            format!("API base:      {}", self.api_base),
            format!(
                "Prompts dir:   {}",
                self.prompts_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(built-in)".to_string())
            ),
            format!("API key:       {}", if self.api_key.is_some() { "set" } else { "not set" }),
        ];
        lines.push(format!(
            "Worker:        poll {:.1}s, min update {:.1}s, cache {}",
            self.worker.poll_interval.as_secs_f64(),
            self.worker.min_update_interval.as_secs_f64(),
            self.worker.cache_capacity
        ));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKeys;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["ai-translator"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    fn catalog() -> LanguageCatalog {
        LanguageCatalog::builtin().unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&cli(&[]), &EnvConfig::default(), &TranslatorConfig::default(), &catalog()).unwrap();
        assert_eq!(settings.language.code, DEFAULT_LANGUAGE_CODE);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.api_base, DEFAULT_API_BASE);
        assert!(settings.prompts_dir.is_none());
        assert!(settings.api_key.is_none());
    }

    #[test]
    fn test_cli_beats_env_beats_file() {
        let env = EnvConfig {
            api_keys: ApiKeys {
                openai: Some("sk-env".into()),
            },
            model: Some("env-model".into()),
            api_base: Some("http://env".into()),
            prompts_dir: Some(PathBuf::from("/env/prompts")),
        };
        let mut file = TranslatorConfig::default();
        file.ui.language = Some("fr".into());
        file.llm.model = Some("file-model".into());
        file.llm.api_base = Some("http://file".into());

        let settings = Settings::resolve(&cli(&["--model", "cli-model"]), &env, &file, &catalog()).unwrap();
        assert_eq!(settings.model, "cli-model");
        assert_eq!(settings.api_base, "http://env");
        assert_eq!(settings.prompts_dir, Some(PathBuf::from("/env/prompts")));
        assert_eq!(settings.language.code, "fr");
        assert_eq!(settings.api_key.as_deref(), Some("sk-env"));

        let settings = Settings::resolve(&cli(&["-l", "German"]), &EnvConfig::default(), &file, &catalog()).unwrap();
        assert_eq!(settings.language.code, "de");
        assert_eq!(settings.model, "file-model");
        assert_eq!(settings.api_base, "http://file");
    }

    #[test]
    fn test_unknown_cli_language_is_error() {
        let result = Settings::resolve(&cli(&["--language", "xx"]), &EnvConfig::default(), &TranslatorConfig::default(), &catalog());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_saved_language_falls_back() {
        let mut file = TranslatorConfig::default();
        file.ui.language = Some("xx".into());
        let settings = Settings::resolve(&cli(&[]), &EnvConfig::default(), &file, &catalog()).unwrap();
        assert_eq!(settings.language.code, DEFAULT_LANGUAGE_CODE);
    }

    #[test]
    fn test_subcommands_parse() {
        assert_eq!(cli(&[]).command, None);
        assert_eq!(cli(&["languages"]).command, Some(Commands::Languages));
        assert_eq!(cli(&["config", "--verbose"]).command, Some(Commands::Config));
        assert!(cli(&["run", "--verbose"]).verbose);
    }
}
