// src/llm/mod.rs
// Language-model clients, prompt templates and shared HTTP plumbing

mod chat;
mod http_client;
pub mod logging;
mod openai_compat;
mod prompt;
mod provider;
mod types;

pub use chat::{ChatModel, ChatModelConnector, DEFAULT_API_BASE, DEFAULT_MODEL};
pub use http_client::ProviderHttpClient;
pub use prompt::{DEEP_TEMPLATE, PromptLibrary, PromptVariables, SHALLOW_TEMPLATE};
pub use provider::{LanguageModel, ModelConnector};
pub use types::{ChatResult, Message, Usage};
