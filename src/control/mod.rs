//! Control plane: start/stop/status over a bound queue store.
//!
//! [`Controller`] is the explicit context object shared by the HTTP surface
//! and the processor loop — one bound store, one running flag, one handle to
//! the background execution unit. No ambient globals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::config::{ProcessorConfig, STOP_JOIN_TIMEOUT};
use crate::error::{ProcessorError, Result};
use crate::handlers::HandlerRegistry;
use crate::queue::JobStatus;
use crate::store::{cell, columns, QueueStore, FIRST_DATA_ROW};
use crate::worker::ProcessorLoop;

/// Uniform answer of the mutating control operations. Refusals are answers,
/// not errors: double starts and stops report `success: false`.
#[derive(Debug, Clone, Serialize)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
}

impl ControlResponse {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn refused(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Jobs tallied per status, keyed by the wire form.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusCounts {
    #[serde(rename = "PENDING")]
    pub pending: u64,
    #[serde(rename = "CLAIMED")]
    pub claimed: u64,
    #[serde(rename = "RUNNING")]
    pub running: u64,
    #[serde(rename = "COMPLETED")]
    pub completed: u64,
    #[serde(rename = "FAILED")]
    pub failed: u64,
}

impl StatusCounts {
    fn bump(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Claimed => self.claimed += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
        }
    }
}

/// Read-only snapshot answered by `status()`. Counts come from a full row
/// scan, so the cost is linear in queue size; nothing is cached.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub processor_running: bool,
    pub store: String,
    pub job_stats: StatusCounts,
}

struct Binding {
    store: Arc<dyn QueueStore>,
    registry: Arc<HandlerRegistry>,
}

struct ControllerState {
    binding: Option<Binding>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

pub struct Controller {
    state: Mutex<ControllerState>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// A controller with no store bound. `start()` and `status()` refuse
    /// until [`bind`](Self::bind) is called.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ControllerState {
                binding: None,
                running: Arc::new(AtomicBool::new(false)),
                worker: None,
            }),
        }
    }

    /// Bind the queue store and handler registry the processor will use.
    pub fn bind(&self, store: Arc<dyn QueueStore>, registry: HandlerRegistry) {
        let mut state = self.lock();
        tracing::info!(store = %store.identity(), "store bound");
        state.binding = Some(Binding {
            store,
            registry: Arc::new(registry),
        });
    }

    /// Launch the processor loop on a background blocking task.
    ///
    /// Returns immediately. Refuses when no store is bound or a loop is
    /// already running — a second loop is never spawned.
    pub fn start(&self, config: ProcessorConfig) -> ControlResponse {
        let mut state = self.lock();

        let Some(binding) = state.binding.as_ref() else {
            return ControlResponse::refused("processor is not configured: no store bound");
        };
        if state.running.load(Ordering::SeqCst) {
            return ControlResponse::refused("processor is already running");
        }

        state.running.store(true, Ordering::SeqCst);
        let processor = ProcessorLoop::new(
            binding.store.clone(),
            binding.registry.clone(),
            state.running.clone(),
            config.clone(),
        );
        state.worker = Some(tokio::task::spawn_blocking(move || processor.run()));

        ControlResponse::ok(format!(
            "processor started (interval {}s)",
            config.interval_secs
        ))
    }

    /// Signal the loop to stop and wait up to ten seconds for it to exit.
    ///
    /// Cancellation is cooperative: the flag flip is observed within one
    /// sleep interval. The loop is never force-killed; if the join times
    /// out a warning is logged and the task is left to finish on its own.
    pub async fn stop(&self) -> ControlResponse {
        let worker = {
            let mut state = self.lock();
            if !state.running.load(Ordering::SeqCst) {
                return ControlResponse::refused("processor is not running");
            }
            state.running.store(false, Ordering::SeqCst);
            state.worker.take()
        };

        if let Some(handle) = worker {
            match tokio::time::timeout(STOP_JOIN_TIMEOUT, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "processor task panicked"),
                Err(_) => {
                    tracing::warn!(timeout = ?STOP_JOIN_TIMEOUT, "processor did not stop in time")
                }
            }
        }

        ControlResponse::ok("processor stopped")
    }

    pub fn is_running(&self) -> bool {
        self.lock().running.load(Ordering::SeqCst)
    }

    /// Identity of the bound store, if any.
    pub fn store_identity(&self) -> Option<String> {
        self.lock()
            .binding
            .as_ref()
            .map(|b| b.store.identity())
    }

    /// Snapshot of the running flag and per-status job counts.
    pub fn status(&self) -> Result<StatusReport> {
        let (running, store) = {
            let state = self.lock();
            let binding = state.binding.as_ref().ok_or(ProcessorError::NotConfigured)?;
            (
                state.running.load(Ordering::SeqCst),
                binding.store.clone(),
            )
        };

        let rows = store.list_rows().map_err(ProcessorError::Store)?;
        let mut counts = StatusCounts::default();
        for row in rows.iter().skip(FIRST_DATA_ROW - 1) {
            if let Some(status) = cell(row, columns::STATUS).and_then(|s| s.parse().ok()) {
                counts.bump(status);
            }
        }

        Ok(StatusReport {
            processor_running: running,
            store: store.identity(),
            job_stats: counts,
        })
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
