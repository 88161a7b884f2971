// src/llm/chat.rs
// OpenAI-compatible chat model behind the LanguageModel trait

use crate::llm::http_client::ProviderHttpClient;
use crate::llm::openai_compat::{ChatRequest, ModelList, parse_chat_response};
use crate::llm::prompt::{PromptLibrary, PromptVariables};
use crate::llm::provider::{LanguageModel, ModelConnector};
use crate::llm::Message;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Span, debug, info, instrument};
use uuid::Uuid;

/// Default API root
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const PROVIDER_NAME: &str = "OpenAI";
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Chat completion client bound to one API key
pub struct ChatModel {
    api_key: String,
    api_base: String,
    model: String,
    prompts: Arc<PromptLibrary>,
    http: Arc<ProviderHttpClient>,
}

impl ChatModel {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        prompts: Arc<PromptLibrary>,
        http: Arc<ProviderHttpClient>,
    ) -> Self {
        Self {
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
            prompts,
            http,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    /// Run one chat completion with a single user message
    #[instrument(skip(self, template, prompt), fields(request_id, model = %self.model, template = %template))]
    async fn complete(&self, template: &str, prompt: String) -> Result<String> {
        let request_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();
        Span::current().record("request_id", request_id.as_str());

        let request = ChatRequest::new(&self.model, vec![Message::user(prompt)])
            .with_max_tokens(MAX_OUTPUT_TOKENS)
            .with_temperature(0.0);
        let body = serde_json::to_string(&request)?;
        debug!(request_id = %request_id, body_len = body.len(), "Sending chat request");

        let response_body = self
            .http
            .post_json(&request_id, &self.completions_url(), &self.api_key, body)
            .await?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let result = parse_chat_response(&response_body, &request_id, duration_ms)?;

        if let Some(ref usage) = result.usage {
            crate::llm::logging::log_usage(&request_id, PROVIDER_NAME, usage);
        }

        let content = result
            .content
            .ok_or_else(|| anyhow!("{} returned an empty reply", PROVIDER_NAME))?;

        crate::llm::logging::log_completion(&request_id, PROVIDER_NAME, template, duration_ms, content.len());
        crate::llm::logging::log_raw_reply(&request_id, template, &content);

        Ok(content)
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    async fn run(&self, template: &str, variables: &PromptVariables) -> Result<String> {
        let prompt = self.prompts.render(template, variables)?;
        self.complete(template, prompt).await
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}

/// Creates `ChatModel` sessions, checking each key against `GET /models`
pub struct ChatModelConnector {
    api_base: String,
    model: String,
    prompts: Arc<PromptLibrary>,
    http: Arc<ProviderHttpClient>,
}

impl ChatModelConnector {
    pub fn new(api_base: impl Into<String>, model: impl Into<String>, prompts: PromptLibrary) -> Self {
        let http = ProviderHttpClient::new(Duration::from_secs(120), Duration::from_secs(15));
        Self {
            api_base: api_base.into(),
            model: model.into(),
            prompts: Arc::new(prompts),
            http: Arc::new(http),
        }
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl ModelConnector for ChatModelConnector {
    async fn connect(&self, api_key: &str) -> Result<Arc<dyn LanguageModel>> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(anyhow!("API key is empty"));
        }

        let request_id = Uuid::new_v4().to_string();
        let body = self
            .http
            .get(&request_id, &self.models_url(), Some(api_key))
            .await
            .context("API key was rejected")?;
        let models: ModelList =
            serde_json::from_str(&body).context("Unexpected reply from the models endpoint")?;

        if !models.data.iter().any(|m| m.id == self.model) {
            // Some compatible servers list a subset only; the chat call will tell
            debug!(model = %self.model, listed = models.data.len(), "Configured model not listed");
        }
        info!(model = %self.model, "Language model session established");

        Ok(Arc::new(ChatModel::new(
            api_key.to_string(),
            self.api_base.clone(),
            self.model.clone(),
            self.prompts.clone(),
            self.http.clone(),
        )))
    }
}
