// src/fast/mod.rs
// Fast machine-translation pass: provider trait, Google client, result cache

mod cache;
mod google;

pub use cache::{DEFAULT_CACHE_CAPACITY, FastTranslationCache};
pub use google::GoogleTranslateClient;

use anyhow::Result;
use async_trait::async_trait;

/// Fast machine translation (text + target language code -> text)
#[async_trait]
pub trait FastTranslator: Send + Sync {
    async fn translate(&self, text: &str, dest_language_code: &str) -> Result<String>;

    /// Provider name, for logs
    fn name(&self) -> &'static str;
}
