//! End-to-end local run: seed a few jobs into an in-memory store, activate
//! the processor, let it drain the queue, and print the resulting rows.
//!
//! ```sh
//! cargo run --example local_run
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use rowrunner::config::ProcessorConfig;
use rowrunner::control::Controller;
use rowrunner::handlers::HandlerRegistry;
use rowrunner::queue;
use rowrunner::store::{ensure_header, MemoryStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let store = Arc::new(MemoryStore::new("local-demo"));
    ensure_header(store.as_ref()).expect("memory store never fails");

    for (name, payload) in [
        ("EXPORT_CSV", json!({ "sheetName": "Data", "rows": [["a", "b"], ["c", "d"]] })),
        ("BATCH_CLEANUP", json!({ "days": 7 })),
        ("UNKNOWN_X", json!({})),
    ] {
        queue::enqueue(
            store.as_ref(),
            &Uuid::new_v4().to_string(),
            name,
            &payload,
            "demo@localhost",
        )
        .expect("memory store never fails");
    }

    let controller = Arc::new(Controller::new());
    controller.bind(store.clone(), HandlerRegistry::builtin());

    let response = controller.start(
        ProcessorConfig::default()
            .with_interval_secs(0.1)
            .with_max_iterations(5),
    );
    println!("start: {} ({})", response.success, response.message);

    // Five iterations at 100ms; give the loop time to drain and exit.
    while controller.is_running() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    let report = controller.status().expect("store is bound");
    println!(
        "processor_running={} completed={} failed={}",
        report.processor_running, report.job_stats.completed, report.job_stats.failed
    );

    for row in store.snapshot().iter().skip(1) {
        println!(
            "{} {} -> {} result={:?} error={:?}",
            &row[0][..8],
            row[1],
            row[2],
            row.get(8),
            row.get(10)
        );
    }
}
