// src/sink.rs
// Interface between the background worker and whatever renders its output

use crate::error::TranslatorError;
use crate::types::{LocalizationCatalog, TranslationResult, UserInput};

/// Rendering surface driven by the worker.
///
/// Every method is called from the worker task and must return quickly.
/// Within one cycle the order is `start_translate`, `fast_translated`, any
/// number of `full_translated`, then `end_translate` exactly once.
pub trait Sink: Send + Sync {
    /// Current input snapshot
    fn user_input(&self) -> UserInput;

    fn start_translate(&self, force: bool);

    fn fast_translated(&self, text: &str);

    fn full_translated(&self, result: &TranslationResult);

    /// Replace the whole UI string catalog
    fn update_localization(&self, catalog: &LocalizationCatalog);

    /// Canonical UI strings to translate on language change, in display order
    fn localization_strings(&self) -> Vec<String>;

    fn error(&self, err: &TranslatorError);

    fn end_translate(&self);
}
