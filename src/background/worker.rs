// src/background/worker.rs
// The reconciliation loop: wakeup, refinement, language change, debounce

use super::{WorkerConfig, WorkerShared, localization};
use crate::fast::{FastTranslationCache, FastTranslator};
use crate::sink::Sink;
use crate::types::{Language, LocalizationCatalog, UserInput};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What one loop iteration did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Iteration {
    Refined,
    LanguageChanged,
    Unchanged,
    RateLimited,
    Reconciled,
}

/// Background worker state. Owned by the worker task alone.
pub struct ReconciliationLoop {
    pub(super) sink: Arc<dyn Sink>,
    pub(super) fast: Arc<dyn FastTranslator>,
    pub(super) shared: Arc<WorkerShared>,
    pub(super) cache: FastTranslationCache,
    catalog: LocalizationCatalog,
    last_text: Option<String>,
    last_language: Option<String>,
    last_update: Option<Instant>,
    config: WorkerConfig,
    shutdown: watch::Receiver<bool>,
}

impl ReconciliationLoop {
    pub(super) fn new(
        sink: Arc<dyn Sink>,
        fast: Arc<dyn FastTranslator>,
        shared: Arc<WorkerShared>,
        config: WorkerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sink,
            fast,
            shared,
            cache: FastTranslationCache::new(config.cache_capacity),
            catalog: LocalizationCatalog::new(),
            last_text: None,
            last_language: None,
            last_update: None,
            config,
            shutdown,
        }
    }

    /// Run until shutdown is requested or every handle is dropped
    pub async fn run(mut self) {
        info!(
            poll_secs = self.config.poll_interval.as_secs_f64(),
            min_update_secs = self.config.min_update_interval.as_secs_f64(),
            "Translation worker started"
        );

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            let forced = tokio::select! {
                forced = self.shared.signal.wait_timeout(self.config.poll_interval) => forced,
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            if *self.shutdown.borrow() {
                break;
            }

            let iteration = self.iterate(forced).await;
            debug!(forced, iteration = ?iteration, "Worker iteration complete");
        }

        let (hits, misses) = self.cache.stats();
        info!(cache_hits = hits, cache_misses = misses, "Translation worker shutting down");
    }

    pub(super) async fn iterate(&mut self, forced: bool) -> Iteration {
        if let Some(previous) = self.shared.take_refinement() {
            self.run_refinement(previous).await;
            return Iteration::Refined;
        }

        let input = self.sink.user_input();

        if self.last_language.as_deref() != Some(input.language.code.as_str()) {
            self.change_language(&input).await;
            return Iteration::LanguageChanged;
        }

        if !forced {
            if self.last_text.as_deref() == Some(input.text.as_str()) {
                return Iteration::Unchanged;
            }
            if let Some(last) = self.last_update
                && last.elapsed() < self.config.min_update_interval
            {
                return Iteration::RateLimited;
            }
        }

        self.last_text = Some(input.text.clone());
        self.last_language = Some(input.language.code.clone());
        self.last_update = Some(Instant::now());

        self.run_cycle(input, forced).await;
        Iteration::Reconciled
    }

    async fn change_language(&mut self, input: &UserInput) {
        info!(
            from = self.last_language.as_deref().unwrap_or("none"),
            to = %input.language.code,
            "Target language changed"
        );

        self.rebuild_localization(&input.language).await;
        self.last_language = Some(input.language.code.clone());
        self.last_text = None;

        // Retranslate the current text in the new language on the next wakeup
        if !input.text.trim().is_empty() {
            self.shared.signal.raise();
        }
    }

    async fn rebuild_localization(&mut self, language: &Language) {
        let keys = self.sink.localization_strings();
        match localization::rebuild_catalog(self.fast.as_ref(), &keys, &language.code).await {
            Ok(catalog) => {
                self.catalog = catalog;
                self.sink.update_localization(&self.catalog);
            }
            Err(e) => {
                warn!(language = %language.code, error = %e, "Localization rebuild failed, keeping previous catalog");
                self.sink.error(&e);
            }
        }
    }
}
