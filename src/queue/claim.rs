use chrono::Utc;
use serde_json::{Map, Value};

use crate::queue::job::{JobRecord, JobStatus};
use crate::store::{cell, columns, QueueStore, StoreError, FIRST_DATA_ROW};

/// Claim the first `PENDING` row of the queue, if any.
///
/// Scans in store order from row 2 and takes the first match; selection is
/// first-found, not priority-ordered. The claim is an optimistic single-row
/// write, not a lock: the status cell is set to `CLAIMED` and then the
/// claimed-timestamp cell is written, as two independent cell updates. Two
/// workers scanning concurrently can both observe the same `PENDING` row
/// before either write lands; the design assumes a single active worker per
/// store and leaves that race unresolved.
///
/// A failed listing is logged and treated identically to "no work available".
/// A failed cell write while claiming a row is logged and the scan moves on
/// to the next row. At most one row is claimed per invocation.
pub fn claim_next_job(store: &dyn QueueStore) -> Option<JobRecord> {
    let rows = match store.list_rows() {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list queue rows");
            return None;
        }
    };

    for (index, row) in rows.iter().enumerate().skip(FIRST_DATA_ROW - 1) {
        let row_number = index + 1;
        if cell(row, columns::STATUS) != Some(JobStatus::Pending.as_str()) {
            continue;
        }

        match write_claim(store, row_number) {
            Ok(claimed_at) => {
                let job = JobRecord {
                    row: row_number,
                    id: cell(row, columns::JOB_ID).unwrap_or_default().to_string(),
                    name: cell(row, columns::JOB_NAME).unwrap_or_default().to_string(),
                    status: JobStatus::Claimed,
                    payload: parse_payload(cell(row, columns::PAYLOAD)),
                    enqueued_at: cell(row, columns::TIMESTAMP_ENQUEUED)
                        .unwrap_or_default()
                        .to_string(),
                    user_email: cell(row, columns::USER_EMAIL)
                        .unwrap_or_default()
                        .to_string(),
                    claimed_at,
                };
                tracing::info!(job_id = %job.id, job_name = %job.name, row = row_number, "job claimed");
                return Some(job);
            }
            Err(e) => {
                tracing::warn!(row = row_number, error = %e, "failed to claim row");
                continue;
            }
        }
    }

    None
}

/// The two-step claim write: status first, then the claimed timestamp.
///
/// Deliberately not a transaction — a scanner can observe the row between the
/// two writes. Kept for compatibility with the store protocol.
fn write_claim(store: &dyn QueueStore, row: usize) -> Result<String, StoreError> {
    let claimed_at = Utc::now().to_rfc3339();
    store.update_cell(row, columns::STATUS, JobStatus::Claimed.as_str())?;
    store.update_cell(row, columns::TIMESTAMP_CLAIMED, &claimed_at)?;
    Ok(claimed_at)
}

/// Payload cells hold JSON objects. Malformed or empty text claims as an
/// empty payload rather than failing the job.
fn parse_payload(text: Option<&str>) -> Map<String, Value> {
    let text = text.unwrap_or_default();
    if text.is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(payload = %other, "payload is not a JSON object, treating as empty");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "malformed payload, treating as empty");
            Map::new()
        }
    }
}
