//! Job queue data model and claim protocol.
//!
//! A job is one row of the queue table. Rows are created externally in
//! `PENDING` state; from then on they are mutated exclusively by the worker
//! that claims them, and never deleted.
//!
//! # Components
//!
//! - [`JobRecord`] / [`JobStatus`]: the entity and its state machine
//! - [`claim_next_job`]: transitions the first `PENDING` row to `CLAIMED`
//! - [`enqueue`]: appends a `PENDING` row in the fixed column order

pub mod claim;
pub mod job;

pub use claim::claim_next_job;
pub use job::{JobRecord, JobStatus};

use chrono::Utc;
use serde_json::Value;

use crate::store::{columns, QueueStore, StoreError};

/// Append a new `PENDING` job row.
///
/// This is the enqueuing side of the protocol; the processor itself never
/// creates rows. Exposed for demos, tests and embedding applications.
pub fn enqueue(
    store: &dyn QueueStore,
    job_id: &str,
    job_name: &str,
    payload: &Value,
    user_email: &str,
) -> Result<(), StoreError> {
    let mut row = vec![String::new(); columns::HEADERS.len()];
    row[columns::JOB_ID - 1] = job_id.to_string();
    row[columns::JOB_NAME - 1] = job_name.to_string();
    row[columns::STATUS - 1] = JobStatus::Pending.to_string();
    row[columns::PAYLOAD - 1] = payload.to_string();
    row[columns::TIMESTAMP_ENQUEUED - 1] = Utc::now().to_rfc3339();
    row[columns::USER_EMAIL - 1] = user_email.to_string();
    store.append_row(&row)?;
    tracing::debug!(job_id, job_name, "job enqueued");
    Ok(())
}
