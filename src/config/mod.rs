// src/config/mod.rs
// Configuration: environment, config file and the language catalog

pub mod env;
pub mod file;
pub mod languages;

pub use env::{ApiKeys, ConfigValidation, EnvConfig};
pub use file::{LlmConfig, TranslatorConfig, UiConfig, WorkerSection};
pub use languages::{DEFAULT_LANGUAGE_CODE, LanguageCatalog};
