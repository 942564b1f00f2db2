use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;

use rowrunner::config::ProcessorConfig;
use rowrunner::handlers::HandlerRegistry;
use rowrunner::queue::enqueue;
use rowrunner::store::{cell, columns, ensure_header, MemoryStore, QueueStore, StoreError};
use rowrunner::worker::ProcessorLoop;

fn fast_config() -> ProcessorConfig {
    ProcessorConfig::default()
        .with_interval_secs(0.005)
        .with_auto_stop_minutes(None)
}

fn empty_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new("processor-tests"));
    ensure_header(store.as_ref()).unwrap();
    store
}

async fn run_loop(
    store: Arc<dyn QueueStore>,
    registry: HandlerRegistry,
    running: Arc<AtomicBool>,
    config: ProcessorConfig,
) {
    let processor = ProcessorLoop::new(store, Arc::new(registry), running, config);
    tokio::task::spawn_blocking(move || processor.run())
        .await
        .unwrap();
}

#[tokio::test]
async fn stops_after_exactly_max_iterations() {
    let store = empty_store();
    let running = Arc::new(AtomicBool::new(true));

    run_loop(
        store.clone(),
        HandlerRegistry::builtin(),
        running.clone(),
        fast_config().with_max_iterations(3),
    )
    .await;

    // One claim scan per iteration, and the flag is cleared on exit
    assert_eq!(store.read_count(), 3);
    assert!(!running.load(Ordering::SeqCst));
}

#[tokio::test]
async fn idle_queue_auto_stops_after_ten_misses() {
    let store = empty_store();
    let running = Arc::new(AtomicBool::new(true));
    let started = Instant::now();

    run_loop(
        store.clone(),
        HandlerRegistry::builtin(),
        running.clone(),
        fast_config().with_auto_stop_minutes(Some(60)),
    )
    .await;

    assert_eq!(store.read_count(), 10);
    assert!(!running.load(Ordering::SeqCst));
    // Stopped by idle count, long before the 60-minute bound
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test]
async fn idle_count_does_not_stop_without_auto_stop() {
    let store = empty_store();
    let running = Arc::new(AtomicBool::new(true));

    run_loop(
        store.clone(),
        HandlerRegistry::builtin(),
        running.clone(),
        fast_config().with_max_iterations(15),
    )
    .await;

    // Without auto-stop configured the idle policy is inert; all 15
    // iterations run
    assert_eq!(store.read_count(), 15);
}

#[tokio::test]
async fn elapsed_time_auto_stops_the_loop() {
    let store = empty_store();
    let running = Arc::new(AtomicBool::new(true));

    // 0 minutes elapse immediately; the second iteration's check fires
    run_loop(
        store.clone(),
        HandlerRegistry::builtin(),
        running.clone(),
        fast_config().with_auto_stop_minutes(Some(0)),
    )
    .await;

    assert!(!running.load(Ordering::SeqCst));
    assert!(store.read_count() <= 1);
}

#[tokio::test]
async fn flag_flip_cancels_cooperatively() {
    let store = empty_store();
    let running = Arc::new(AtomicBool::new(true));

    let processor = ProcessorLoop::new(
        store.clone(),
        Arc::new(HandlerRegistry::builtin()),
        running.clone(),
        ProcessorConfig::default()
            .with_interval_secs(0.01)
            .with_auto_stop_minutes(None),
    );
    let handle = tokio::task::spawn_blocking(move || processor.run());

    tokio::time::sleep(Duration::from_millis(50)).await;
    running.store(false, Ordering::SeqCst);

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("loop should observe the flag within one interval")
        .unwrap();
}

#[tokio::test]
async fn pending_job_is_processed_and_resets_idle_count() {
    let store = empty_store();
    enqueue(
        store.as_ref(),
        "J1",
        "EXPORT_CSV",
        &json!({ "sheetName": "Data" }),
        "user@example.com",
    )
    .unwrap();
    let running = Arc::new(AtomicBool::new(true));

    run_loop(
        store.clone(),
        HandlerRegistry::builtin(),
        running.clone(),
        fast_config().with_auto_stop_minutes(Some(60)),
    )
    .await;

    // One hit plus ten misses after the queue drained
    assert_eq!(store.read_count(), 11);

    let rows = store.snapshot();
    assert_eq!(cell(&rows[1], columns::STATUS), Some("COMPLETED"));
    let result = cell(&rows[1], columns::RESULT).unwrap();
    assert!(result.contains("Data"));
    assert!(result.contains("rows"));
}

#[tokio::test]
async fn unknown_job_fails_and_loop_continues() {
    let store = empty_store();
    enqueue(store.as_ref(), "J1", "UNKNOWN_X", &json!({}), "a@b").unwrap();
    enqueue(
        store.as_ref(),
        "J2",
        "GENERATE_REPORT",
        &json!({}),
        "a@b",
    )
    .unwrap();
    let running = Arc::new(AtomicBool::new(true));

    run_loop(
        store.clone(),
        HandlerRegistry::builtin(),
        running.clone(),
        fast_config().with_max_iterations(4),
    )
    .await;

    let rows = store.snapshot();
    assert_eq!(cell(&rows[1], columns::STATUS), Some("FAILED"));
    assert_eq!(cell(&rows[1], columns::ERROR_CODE), Some("UnknownJob"));
    assert!(cell(&rows[1], columns::ERROR_MESSAGE)
        .unwrap()
        .contains("UNKNOWN_X"));
    // The failure did not stop the loop; the next job still ran
    assert_eq!(cell(&rows[2], columns::STATUS), Some("COMPLETED"));
}

#[tokio::test]
async fn store_outage_during_scan_does_not_stop_the_loop() {
    let store = empty_store();
    store.set_failing(true);
    let running = Arc::new(AtomicBool::new(true));

    run_loop(
        store.clone(),
        HandlerRegistry::builtin(),
        running.clone(),
        fast_config().with_max_iterations(3),
    )
    .await;

    // Each failed scan counts as a claim miss; the loop survives the outage
    // and exits on its iteration limit
    assert_eq!(store.read_count(), 3);
}

/// Store wrapper that fails every status write, to drive the executor's
/// fail-stop path from inside the loop.
struct StatusWritesFail(Arc<MemoryStore>);

impl QueueStore for StatusWritesFail {
    fn identity(&self) -> String {
        self.0.identity()
    }

    fn list_rows(&self) -> Result<Vec<Vec<String>>, StoreError> {
        self.0.list_rows()
    }

    fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<(), StoreError> {
        if col == columns::STATUS && value == "RUNNING" {
            return Err(StoreError::Unavailable("injected".into()));
        }
        self.0.update_cell(row, col, value)
    }

    fn append_row(&self, values: &[String]) -> Result<(), StoreError> {
        self.0.append_row(values)
    }
}

#[tokio::test]
async fn executor_store_failure_fail_stops_the_loop() {
    let inner = empty_store();
    enqueue(inner.as_ref(), "J1", "GENERATE_REPORT", &json!({}), "a@b").unwrap();
    let running = Arc::new(AtomicBool::new(true));

    let store: Arc<dyn QueueStore> = Arc::new(StatusWritesFail(inner.clone()));
    run_loop(
        store,
        HandlerRegistry::builtin(),
        running.clone(),
        // No iteration bound: only the fail-stop ends the loop
        ProcessorConfig::default()
            .with_interval_secs(0.005)
            .with_auto_stop_minutes(None),
    )
    .await;

    // The loop died on the first claimed job and cleared its flag
    assert!(!running.load(Ordering::SeqCst));
    assert_eq!(inner.read_count(), 1);
}
