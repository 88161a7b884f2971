// src/background/localization.rs
// Wholesale rebuild of the UI string catalog for a new language

use crate::error::{Result, TranslatorError};
use crate::fast::FastTranslator;
use crate::types::LocalizationCatalog;
use tracing::{debug, info};

/// Translate every key in one batch call.
///
/// Keys are joined with newlines and the reply is split back line by line
/// (trimmed, blank lines dropped). The line count must match the key count.
pub async fn rebuild_catalog(
    provider: &dyn FastTranslator,
    keys: &[String],
    language_code: &str,
) -> Result<LocalizationCatalog> {
    if keys.is_empty() {
        return Ok(LocalizationCatalog::new());
    }

    let batch = keys.join("\n");
    let translated = provider
        .translate(&batch, language_code)
        .await
        .map_err(TranslatorError::provider)?;

    let lines: Vec<&str> = translated
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() != keys.len() {
        debug!(reply = %translated, "Localization batch reply");
        return Err(TranslatorError::LocalizationCountMismatch {
            expected: keys.len(),
            actual: lines.len(),
        });
    }

    info!(
        language = language_code,
        provider = provider.name(),
        strings = keys.len(),
        "Localization catalog rebuilt"
    );

    Ok(keys
        .iter()
        .cloned()
        .zip(lines.into_iter().map(str::to_string))
        .collect())
}
