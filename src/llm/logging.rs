// src/llm/logging.rs
// Shared logging helpers for provider calls

use super::types::Usage;
use tracing::{debug, info};

/// Log usage statistics for a chat call
pub fn log_usage(request_id: &str, provider: &str, usage: &Usage) {
    info!(
        request_id = %request_id,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        "{} usage stats", provider
    );
}

/// Log completion summary for a chat call
pub fn log_completion(request_id: &str, provider: &str, template: &str, duration_ms: u64, content_len: usize) {
    info!(
        request_id = %request_id,
        template = %template,
        duration_ms = duration_ms,
        content_len = content_len,
        "{} chat complete", provider
    );
}

/// Log the raw reply text (debug level)
pub fn log_raw_reply(request_id: &str, template: &str, content: &str) {
    debug!(request_id = %request_id, template = %template, reply = %content, "Raw model reply");
}
