// src/llm/http_client.rs
// Shared HTTP client for the translation and chat providers

use anyhow::{Result, anyhow};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::warn;

/// Default maximum retry attempts for transient failures
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default base backoff duration between retries (doubles each attempt)
const DEFAULT_BASE_BACKOFF_MS: u64 = 500;

/// Outcome of one attempt that did not produce a body
enum AttemptFailure {
    /// Worth sending again after a pause
    Transient(String),
    Fatal(anyhow::Error),
}

/// HTTP client with retry on rate limits, server errors and connect failures.
///
/// Retry policy belongs to the providers; the reconciliation core never
/// retries and never times out a provider call on its own.
pub struct ProviderHttpClient {
    client: Client,
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl ProviderHttpClient {
    pub fn new(request_timeout: Duration, connect_timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: Duration::from_millis(DEFAULT_BASE_BACKOFF_MS),
        }
    }

    /// Override the retry budget (0 disables retries)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// POST a JSON body with Bearer auth, returning the response body
    pub async fn post_json(
        &self,
        request_id: &str,
        url: &str,
        api_key: &str,
        body: String,
    ) -> Result<String> {
        self.send_with_retry(request_id, || {
            self.client
                .post(url)
                .bearer_auth(api_key)
                .header("Content-Type", "application/json")
                .body(body.clone())
        })
        .await
    }

    /// GET with optional Bearer auth, returning the response body
    pub async fn get(&self, request_id: &str, url: &str, api_key: Option<&str>) -> Result<String> {
        self.send_with_retry(request_id, || {
            let builder = self.client.get(url);
            match api_key {
                Some(key) => builder.bearer_auth(key),
                None => builder,
            }
        })
        .await
    }

    /// Pause before retry number `retry` (0-based), doubling each time
    fn backoff_for(&self, retry: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(retry))
    }

    /// `build` runs on every attempt so each one gets a fresh builder
    async fn send_with_retry<F>(&self, request_id: &str, build: F) -> Result<String>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut retry = 0;
        loop {
            let reason = match attempt(build()).await {
                Ok(body) => return Ok(body),
                Err(AttemptFailure::Fatal(e)) => return Err(e),
                Err(AttemptFailure::Transient(reason)) if retry >= self.max_attempts => {
                    return Err(anyhow!("Request failed after {} retries: {}", retry, reason));
                }
                Err(AttemptFailure::Transient(reason)) => reason,
            };

            let pause = self.backoff_for(retry);
            warn!(
                request_id = %request_id,
                retry = retry + 1,
                reason = %reason,
                "Transient provider failure, retrying in {:?}",
                pause
            );
            tokio::time::sleep(pause).await;
            retry += 1;
        }
    }
}

async fn attempt(request: reqwest::RequestBuilder) -> std::result::Result<String, AttemptFailure> {
    let response = match request.send().await {
        Ok(response) => response,
        // Only connect/timeout failures are known to be safe to resend
        Err(e) if e.is_connect() || e.is_timeout() => {
            return Err(AttemptFailure::Transient(e.to_string()));
        }
        Err(e) => return Err(AttemptFailure::Fatal(anyhow!("Request failed: {}", e))),
    };

    let status = response.status();
    if status.is_success() {
        return response
            .text()
            .await
            .map_err(|e| AttemptFailure::Fatal(e.into()));
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(AttemptFailure::Transient(format!("{}: {}", status, body)))
    } else {
        Err(AttemptFailure::Fatal(anyhow!("API error {}: {}", status, body)))
    }
}
