use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;

use crate::error::{ProcessorError, Result};
use crate::handlers::HandlerRegistry;
use crate::queue::{JobRecord, JobStatus};
use crate::store::{columns, QueueStore};

/// Result and error-message cells are capped at this many characters.
const CELL_TEXT_LIMIT: usize = 500;

/// Executes claimed jobs and records their outcome on the queue row.
///
/// Owns the `CLAIMED → RUNNING → {COMPLETED | FAILED}` transitions. Handlers
/// themselves never manage status. Status-cell writes are best-effort in the
/// sense that a write failure is logged and propagated — never silently
/// swallowed — and the job is not retried within the call.
pub struct JobExecutor {
    store: Arc<dyn QueueStore>,
    registry: Arc<HandlerRegistry>,
}

impl JobExecutor {
    pub fn new(store: Arc<dyn QueueStore>, registry: Arc<HandlerRegistry>) -> Self {
        Self { store, registry }
    }

    /// Process one claimed job to a terminal state.
    ///
    /// Returns the terminal status reached, or an error if a status write
    /// against the store failed (in which case the row may be left in
    /// `RUNNING`; the loop treats that as fatal).
    pub fn process(&self, job: &JobRecord) -> Result<JobStatus> {
        tracing::info!(job_id = %job.id, job_name = %job.name, "processing job");
        self.write_status(job.row, JobStatus::Running)?;

        match self.registry.dispatch(&job.name, &job.payload) {
            Ok(result) => {
                self.finalize_success(job.row, &result)?;
                tracing::info!(job_id = %job.id, status = %JobStatus::Completed, "job completed");
                Ok(JobStatus::Completed)
            }
            Err(err) => {
                tracing::warn!(job_id = %job.id, code = err.code(), error = %err, "job failed");
                self.finalize_failure(job.row, err.code(), &err.to_string())?;
                Ok(JobStatus::Failed)
            }
        }
    }

    fn write_status(&self, row: usize, status: JobStatus) -> Result<()> {
        self.store
            .update_cell(row, columns::STATUS, status.as_str())
            .map_err(|e| {
                tracing::error!(row, status = %status, error = %e, "status write failed");
                ProcessorError::Store(e)
            })
    }

    fn finalize_success(&self, row: usize, result: &Value) -> Result<()> {
        self.write_status(row, JobStatus::Completed)?;
        self.write_completed_timestamp(row)?;
        let text = truncate_result(&result.to_string());
        self.store.update_cell(row, columns::RESULT, &text)?;
        Ok(())
    }

    fn finalize_failure(&self, row: usize, code: &str, message: &str) -> Result<()> {
        self.write_status(row, JobStatus::Failed)?;
        self.write_completed_timestamp(row)?;
        self.store.update_cell(row, columns::ERROR_CODE, code)?;
        self.store
            .update_cell(row, columns::ERROR_MESSAGE, &truncate_chars(message, CELL_TEXT_LIMIT))?;
        Ok(())
    }

    fn write_completed_timestamp(&self, row: usize) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.store
            .update_cell(row, columns::TIMESTAMP_COMPLETED, &now)?;
        Ok(())
    }
}

/// Serialized results longer than the cell limit keep 497 characters plus an
/// ellipsis marker.
fn truncate_result(text: &str) -> String {
    if text.chars().count() > CELL_TEXT_LIMIT {
        let mut out: String = text.chars().take(CELL_TEXT_LIMIT - 3).collect();
        out.push_str("...");
        out
    } else {
        text.to_string()
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_result_is_untouched() {
        assert_eq!(truncate_result("abc"), "abc");
        let exact: String = "x".repeat(500);
        assert_eq!(truncate_result(&exact), exact);
    }

    #[test]
    fn long_result_gets_ellipsis() {
        let long: String = "x".repeat(600);
        let out = truncate_result(&long);
        assert_eq!(out.chars().count(), 500);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn error_message_is_hard_capped() {
        let long: String = "e".repeat(700);
        let out = truncate_chars(&long, 500);
        assert_eq!(out.chars().count(), 500);
        assert!(!out.ends_with("..."));
    }
}
