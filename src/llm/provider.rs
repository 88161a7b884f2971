// src/llm/provider.rs
// Language-model abstractions consumed by the reconciliation core

use super::prompt::PromptVariables;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Language model that evaluates a named template against variables
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Render `template` with `variables`, run it, and return the raw reply text
    async fn run(&self, template: &str, variables: &PromptVariables) -> Result<String>;

    /// Model identifier, for logs
    fn model_name(&self) -> String;
}

/// Builds a language model session from a credential
#[async_trait]
pub trait ModelConnector: Send + Sync {
    /// Establish a session for `api_key`. Fails if the key is rejected.
    async fn connect(&self, api_key: &str) -> Result<Arc<dyn LanguageModel>>;
}
