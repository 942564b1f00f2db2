use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::store::{QueueStore, StoreError};

/// In-process [`QueueStore`] used by tests, demos and the bundled binary.
///
/// Holds the whole table behind a mutex. A failure toggle simulates the
/// transient connectivity errors a networked store produces, so callers'
/// error paths can be exercised without a real backend.
pub struct MemoryStore {
    name: String,
    rows: Mutex<Vec<Vec<String>>>,
    failing: AtomicBool,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }

    /// When set, every store operation fails with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Copy of the full table, for assertions.
    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.rows().clone()
    }

    /// Number of `list_rows` calls served, failed ones included. Each poll
    /// iteration lists the table exactly once, so tests use this to count
    /// iterations.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn rows(&self) -> std::sync::MutexGuard<'_, Vec<Vec<String>>> {
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated connectivity loss".into()));
        }
        Ok(())
    }
}

impl QueueStore for MemoryStore {
    fn identity(&self) -> String {
        self.name.clone()
    }

    fn list_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.rows().clone())
    }

    fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut rows = self.rows();
        if row == 0 || row > rows.len() {
            return Err(StoreError::RowOutOfRange(row));
        }
        let cells = &mut rows[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
        Ok(())
    }

    fn append_row(&self, values: &[String]) -> Result<(), StoreError> {
        self.check_available()?;
        self.rows().push(values.to_vec());
        Ok(())
    }
}
