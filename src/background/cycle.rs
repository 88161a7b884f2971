// src/background/cycle.rs
// One reconciliation cycle, and the refinement variant

use super::worker::ReconciliationLoop;
use crate::error::{Result, TranslatorError};
use crate::sink::Sink;
use crate::translate::EscalationProtocol;
use crate::types::{Language, TranslationResult, UserInput};
use futures::StreamExt;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How a cycle ended, for logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CycleOutcome {
    FastOnly,
    Complete,
    Abandoned,
    Failed,
}

/// Calls `end_translate` when dropped, so every exit path ends the cycle
struct EndTranslateGuard {
    sink: Arc<dyn Sink>,
}

impl EndTranslateGuard {
    fn start(sink: Arc<dyn Sink>, force: bool) -> Self {
        sink.start_translate(force);
        Self { sink }
    }
}

impl Drop for EndTranslateGuard {
    fn drop(&mut self) {
        self.sink.end_translate();
    }
}

impl ReconciliationLoop {
    /// Fast pass, then the escalation sequence when forced
    pub(super) async fn run_cycle(&mut self, input: UserInput, force: bool) {
        let start = Instant::now();
        let _end = EndTranslateGuard::start(self.sink.clone(), force);

        let text = input.text.trim().to_string();
        let outcome = match self.translate(&text, &input.language, force).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(language = %input.language.code, error = %e, "Translation cycle failed");
                self.sink.error(&e);
                CycleOutcome::Failed
            }
        };

        info!(
            language = %input.language.code,
            force,
            outcome = ?outcome,
            duration_ms = start.elapsed().as_millis() as u64,
            "Translation cycle finished"
        );
    }

    async fn translate(&mut self, text: &str, language: &Language, force: bool) -> Result<CycleOutcome> {
        let fast = self
            .cache
            .translate(self.fast.as_ref(), text, &language.code)
            .await
            .map_err(TranslatorError::provider)?;
        self.sink.fast_translated(&fast);

        if !force {
            return Ok(CycleOutcome::FastOnly);
        }

        let protocol = EscalationProtocol::new(self.shared.connected_model().await?);
        let results = protocol.run(text.to_string(), fast, language.clone());
        futures::pin_mut!(results);

        while let Some(result) = results.next().await {
            let result = result?;
            debug!(pending = result.pending, len = result.translation.len(), "Full translation ready");
            self.sink.full_translated(&result);

            if result.pending && self.shared.signal.is_raised() {
                info!("New request arrived, abandoning deep pass");
                return Ok(CycleOutcome::Abandoned);
            }
        }

        Ok(CycleOutcome::Complete)
    }

    /// Deep pass only, against an earlier result
    pub(super) async fn run_refinement(&mut self, previous: TranslationResult) {
        let _end = EndTranslateGuard::start(self.sink.clone(), true);

        match self.refine(&previous).await {
            Ok(result) => self.sink.full_translated(&result),
            Err(e) => {
                warn!(language = %previous.request.language.code, error = %e, "Refinement failed");
                self.sink.error(&e);
            }
        }
    }

    async fn refine(&self, previous: &TranslationResult) -> Result<TranslationResult> {
        let model = self.shared.connected_model().await?;
        EscalationProtocol::new(model).refine(previous).await
    }
}
