//! Abstract interface over the external row-store backing the job queue.
//!
//! The queue lives in a single table addressed sheet-style: rows and columns
//! are 1-based, and row 1 holds the column headers and is never treated as
//! data. The store is the sole I/O boundary of the processor; everything
//! above it works in terms of [`QueueStore`].
//!
//! All operations are synchronous and may fail transiently (the production
//! store sits behind a network). The adapter never retries — callers decide.

pub mod memory;

pub use memory::MemoryStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("row {0} is out of range")]
    RowOutOfRange(usize),
}

/// Column layout of the queue table, 1-based.
///
/// The order is load-bearing: the claim protocol and the executor address
/// cells positionally, and the enqueuing side writes rows in the same order.
pub mod columns {
    pub const JOB_ID: usize = 1;
    pub const JOB_NAME: usize = 2;
    pub const STATUS: usize = 3;
    pub const PAYLOAD: usize = 4;
    pub const TIMESTAMP_ENQUEUED: usize = 5;
    pub const USER_EMAIL: usize = 6;
    pub const TIMESTAMP_CLAIMED: usize = 7;
    pub const TIMESTAMP_COMPLETED: usize = 8;
    pub const RESULT: usize = 9;
    pub const ERROR_CODE: usize = 10;
    pub const ERROR_MESSAGE: usize = 11;

    pub const HEADERS: [&str; 11] = [
        "jobId",
        "jobName",
        "status",
        "payload",
        "timestamp_enqueued",
        "user_email",
        "timestamp_claimed",
        "timestamp_completed",
        "result",
        "errorCode",
        "errorMessage",
    ];
}

/// First row that holds job data; row 1 is the header.
pub const FIRST_DATA_ROW: usize = 2;

pub trait QueueStore: Send + Sync {
    /// Human-readable label for this store, surfaced by the control plane.
    fn identity(&self) -> String;

    /// All rows of the queue table, header included, in store order.
    fn list_rows(&self) -> Result<Vec<Vec<String>>, StoreError>;

    /// Write a single cell. `row` and `col` are 1-based.
    fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), StoreError>;

    /// Append a row after the last existing one.
    fn append_row(&self, values: &[String]) -> Result<(), StoreError>;
}

/// Fetch a cell from a listed row by 1-based column, tolerating short rows.
pub fn cell(row: &[String], col: usize) -> Option<&str> {
    row.get(col - 1).map(String::as_str)
}

/// Write the header row into an empty store so the enqueuing side and the
/// worker agree on the column layout. Leaves a non-empty store untouched.
pub fn ensure_header(store: &dyn QueueStore) -> Result<(), StoreError> {
    if store.list_rows()?.is_empty() {
        let headers: Vec<String> = columns::HEADERS.iter().map(|h| h.to_string()).collect();
        store.append_row(&headers)?;
        tracing::debug!(store = %store.identity(), "queue header row created");
    }
    Ok(())
}
