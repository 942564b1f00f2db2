use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use rowrunner::control::Controller;
use rowrunner::handlers::HandlerRegistry;
use rowrunner::queue;
use rowrunner::shutdown::install_shutdown_handler;
use rowrunner::store::{ensure_header, MemoryStore, QueueStore};
use rowrunner::webhook;

#[derive(Parser, Debug)]
#[command(name = "rowrunner")]
#[command(version)]
#[command(about = "Remotely activated job processor over a tabular row-store")]
struct Args {
    /// Address for the control-plane HTTP server
    #[arg(long, default_value = "127.0.0.1:8700")]
    listen: SocketAddr,

    /// Identity label for the in-memory queue store
    #[arg(long, default_value = "memory-queue")]
    store_name: String,

    /// Seed this many demo jobs into the queue at startup
    #[arg(long, default_value_t = 0)]
    seed: usize,
}

const DEMO_JOBS: [&str; 4] = [
    "EXPORT_CSV",
    "BATCH_CLEANUP",
    "GENERATE_REPORT",
    "CALCULATE_STATS",
];

fn seed_demo_jobs(store: &dyn QueueStore, count: usize) {
    for i in 0..count {
        let job_name = DEMO_JOBS[i % DEMO_JOBS.len()];
        let payload = match job_name {
            "EXPORT_CSV" | "CALCULATE_STATS" => json!({ "sheetName": "Data" }),
            "BATCH_CLEANUP" => json!({ "days": 30 }),
            _ => json!({}),
        };
        if let Err(e) = queue::enqueue(
            store,
            &Uuid::new_v4().to_string(),
            job_name,
            &payload,
            "demo@localhost",
        ) {
            tracing::warn!(job_name, error = %e, "failed to seed demo job");
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let store = Arc::new(MemoryStore::new(args.store_name));
    if let Err(e) = ensure_header(store.as_ref()) {
        tracing::error!(error = %e, "failed to bootstrap queue header");
        return Err(std::io::Error::other(e.to_string()));
    }
    if args.seed > 0 {
        seed_demo_jobs(store.as_ref(), args.seed);
        tracing::info!(count = args.seed, "demo jobs seeded");
    }

    let controller = Arc::new(Controller::new());
    controller.bind(store, HandlerRegistry::builtin());

    let shutdown = install_shutdown_handler();
    webhook::serve(args.listen, controller, shutdown).await
}
