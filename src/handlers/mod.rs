//! Handler dispatch: job-name string → pluggable business logic.
//!
//! Handlers are pure, single-attempt computations over the job payload. They
//! never touch job status — the executor owns every state transition. The
//! registry is populated at startup and fails closed: an unregistered name is
//! a terminal [`UnknownJob`](crate::ProcessorError::UnknownJob) failure for
//! that job, and no handler runs.

pub mod builtin;

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{HandlerError, ProcessorError, Result};

pub trait JobHandler: Send + Sync {
    fn run(&self, payload: &Map<String, Value>) -> std::result::Result<Value, HandlerError>;
}

/// Any plain function with the handler signature is a handler.
impl<F> JobHandler for F
where
    F: Fn(&Map<String, Value>) -> std::result::Result<Value, HandlerError> + Send + Sync,
{
    fn run(&self, payload: &Map<String, Value>) -> std::result::Result<Value, HandlerError> {
        self(payload)
    }
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn JobHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in job types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("EXPORT_CSV", builtin::export_csv);
        registry.register("BATCH_CLEANUP", builtin::batch_cleanup);
        registry.register("GENERATE_REPORT", builtin::generate_report);
        registry.register("CALCULATE_STATS", builtin::calculate_stats);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, handler: impl JobHandler + 'static) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Run the handler registered under `name` against `payload`.
    pub fn dispatch(&self, name: &str, payload: &Map<String, Value>) -> Result<Value> {
        let handler = self
            .handlers
            .get(name)
            .ok_or_else(|| ProcessorError::UnknownJob(name.to_string()))?;
        handler.run(payload).map_err(|e| ProcessorError::Handler {
            code: e.code,
            message: e.message,
        })
    }
}
