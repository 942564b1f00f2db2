use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{ProcessorConfig, IDLE_STOP_THRESHOLD};
use crate::error::Result;
use crate::handlers::HandlerRegistry;
use crate::queue::claim_next_job;
use crate::store::QueueStore;
use crate::worker::JobExecutor;

/// The polling cycle: claim → execute → sleep.
///
/// Runs until one of its stop conditions fires or the shared running flag is
/// flipped off. The flag is checked once per iteration, so cancellation is
/// cooperative and bounded by one sleep interval. Any error escaping an
/// iteration terminates the loop (fail-stop); the flag is cleared on every
/// exit path, which is how the control plane observes that the loop is gone.
pub struct ProcessorLoop {
    store: Arc<dyn QueueStore>,
    registry: Arc<HandlerRegistry>,
    running: Arc<AtomicBool>,
    config: ProcessorConfig,
}

impl ProcessorLoop {
    pub fn new(
        store: Arc<dyn QueueStore>,
        registry: Arc<HandlerRegistry>,
        running: Arc<AtomicBool>,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            store,
            registry,
            running,
            config,
        }
    }

    /// Run to completion, blocking the current thread.
    pub fn run(self) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            max_iterations = ?self.config.max_iterations,
            auto_stop_minutes = ?self.config.auto_stop_minutes,
            "processor started"
        );

        if let Err(e) = self.poll_cycle() {
            tracing::error!(error = %e, "processor terminated on error");
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("processor stopped");
    }

    /// Stop conditions, evaluated in priority order each iteration:
    /// iteration limit, elapsed auto-stop time, then (after a claim miss)
    /// ten consecutive idle iterations while auto-stop is configured.
    fn poll_cycle(&self) -> Result<()> {
        let executor = JobExecutor::new(self.store.clone(), self.registry.clone());
        let interval = self.config.interval();
        let started = Instant::now();
        let mut iteration: u64 = 0;
        let mut idle_count: u32 = 0;

        while self.running.load(Ordering::SeqCst) {
            iteration += 1;

            if let Some(max) = self.config.max_iterations {
                if iteration > max {
                    tracing::info!(max_iterations = max, "iteration limit reached");
                    break;
                }
            }

            if let Some(deadline) = self.config.auto_stop_after() {
                if started.elapsed() >= deadline {
                    tracing::info!(
                        auto_stop_minutes = ?self.config.auto_stop_minutes,
                        "auto-stop time elapsed"
                    );
                    break;
                }
            }

            match claim_next_job(self.store.as_ref()) {
                Some(job) => {
                    let status = executor.process(&job)?;
                    tracing::debug!(job_id = %job.id, status = %status, iteration, "job finished");
                    idle_count = 0;
                }
                None => {
                    idle_count += 1;
                    tracing::debug!(iteration, idle_count, "no pending jobs");
                    if self.config.auto_stop_minutes.is_some() && idle_count >= IDLE_STOP_THRESHOLD
                    {
                        tracing::info!(idle_count, "auto-stop: queue idle");
                        break;
                    }
                }
            }

            std::thread::sleep(interval);
        }

        Ok(())
    }
}
