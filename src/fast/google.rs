// src/fast/google.rs
// Google Translate client (public `translate_a/single` endpoint)

use super::FastTranslator;
use crate::llm::ProviderHttpClient;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use uuid::Uuid;

const GOOGLE_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Fast, keyless machine translation
pub struct GoogleTranslateClient {
    base_url: String,
    http: ProviderHttpClient,
}

impl GoogleTranslateClient {
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_TRANSLATE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: ProviderHttpClient::new(Duration::from_secs(30), Duration::from_secs(10)),
        }
    }

    fn request_url(&self, text: &str, dest_language_code: &str) -> String {
        format!(
            "{}?client=gtx&sl=auto&tl={}&dt=t&q={}",
            self.base_url,
            urlencoding::encode(dest_language_code),
            urlencoding::encode(text)
        )
    }
}

impl Default for GoogleTranslateClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FastTranslator for GoogleTranslateClient {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn translate(&self, text: &str, dest_language_code: &str) -> Result<String> {
        if text.is_empty() {
            return Ok(String::new());
        }

        let request_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();
        let body = self
            .http
            .get(&request_id, &self.request_url(text, dest_language_code), None)
            .await
            .context("Google Translate request failed")?;

        let translated = parse_translate_response(&body)?;
        debug!(
            request_id = %request_id,
            duration_ms = start_time.elapsed().as_millis() as u64,
            result_len = translated.len(),
            "Fast translation complete"
        );
        Ok(translated)
    }

    fn name(&self) -> &'static str {
        "google"
    }
}

/// Join the translated segments of a `translate_a/single` reply.
///
/// Shape: `[[["<translated>", "<source>", ...], ...], null, "<detected>", ...]`
fn parse_translate_response(body: &str) -> Result<String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| anyhow!("Failed to parse translate response: {}", e))?;

    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("Translate response has no segments"))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}
