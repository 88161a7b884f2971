// src/background/mod.rs
// Background reconciliation worker and its control handle
//
// One task owns the fast cache, the localization catalog and the staleness
// baseline. Other tasks reach it only through `WorkerHandle`.

mod cycle;
mod localization;
mod signal;
mod worker;

use crate::error::{Result, TranslatorError};
use crate::fast::{DEFAULT_CACHE_CAPACITY, FastTranslator};
use crate::llm::{LanguageModel, ModelConnector};
use crate::sink::Sink;
use crate::types::TranslationResult;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use localization::rebuild_catalog;
pub use signal::ForceSignal;
use worker::ReconciliationLoop;

/// Default wakeup interval when nothing forces a cycle
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default minimum spacing between unforced cycles
pub const DEFAULT_MIN_UPDATE_INTERVAL: Duration = Duration::from_secs(3);

/// Timing and sizing for the worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub poll_interval: Duration,
    pub min_update_interval: Duration,
    pub cache_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            min_update_interval: DEFAULT_MIN_UPDATE_INTERVAL,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// State written by handles and read by the worker
pub(crate) struct WorkerShared {
    pub(crate) signal: ForceSignal,
    model: RwLock<Option<Arc<dyn LanguageModel>>>,
    refinement: Mutex<Option<TranslationResult>>,
}

impl WorkerShared {
    fn new() -> Self {
        Self {
            signal: ForceSignal::new(),
            model: RwLock::new(None),
            refinement: Mutex::new(None),
        }
    }

    /// Snapshot of the bound model. In-flight calls keep the model they started with.
    pub(crate) async fn connected_model(&self) -> Result<Arc<dyn LanguageModel>> {
        self.model.read().await.clone().ok_or(TranslatorError::NotConnected)
    }

    pub(crate) fn take_refinement(&self) -> Option<TranslationResult> {
        self.refinement.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn set_refinement(&self, previous: TranslationResult) {
        *self.refinement.lock().unwrap_or_else(PoisonError::into_inner) = Some(previous);
    }
}

/// Control surface for a running worker
#[derive(Clone)]
pub struct WorkerHandle {
    shared: Arc<WorkerShared>,
    connector: Arc<dyn ModelConnector>,
    sink: Arc<dyn Sink>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl WorkerHandle {
    /// Request a forced cycle at the next wakeup
    pub fn force_translate(&self) {
        self.shared.signal.raise();
    }

    /// Schedule a deep-pass-only cycle for `previous`, replacing any
    /// refinement not yet picked up
    pub fn refine(&self, previous: TranslationResult) {
        self.shared.set_refinement(previous);
        self.shared.signal.raise();
    }

    /// Swap the language-model credential.
    ///
    /// On failure the worker is left without a model, so forced cycles fail
    /// with `NotConnected` until a later rebind succeeds. The failure is also
    /// reported through the sink.
    pub async fn rebind_credentials(&self, api_key: &str) -> Result<()> {
        match self.connector.connect(api_key).await {
            Ok(model) => {
                let name = model.model_name();
                *self.shared.model.write().await = Some(model);
                info!(model = %name, "Language model credentials bound");
                Ok(())
            }
            Err(e) => {
                *self.shared.model.write().await = None;
                let err = TranslatorError::provider(e);
                warn!(error = %err, "Failed to bind language model credentials");
                self.sink.error(&err);
                Err(err)
            }
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.shared.model.read().await.is_some()
    }

    /// Stop the worker at its next wakeup
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// Start the worker task.
///
/// The worker begins with no language model; call
/// [`WorkerHandle::rebind_credentials`] to connect one. The first iteration
/// runs immediately and picks up the initial language.
pub fn spawn(
    sink: Arc<dyn Sink>,
    fast: Arc<dyn FastTranslator>,
    connector: Arc<dyn ModelConnector>,
    config: WorkerConfig,
) -> (WorkerHandle, JoinHandle<()>) {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shared = Arc::new(WorkerShared::new());

    let worker = ReconciliationLoop::new(sink.clone(), fast, shared.clone(), config, shutdown_rx);
    shared.signal.raise();
    let join = tokio::spawn(async move {
        worker.run().await;
    });

    let handle = WorkerHandle {
        shared,
        connector,
        sink,
        shutdown: Arc::new(shutdown_tx),
    };
    (handle, join)
}
