use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle of a queue row.
///
/// `PENDING → CLAIMED → RUNNING → {COMPLETED | FAILED}`. Transitions only
/// move forward; there is no retry transition, and a terminal row is never
/// revisited. The wire form in the status column is the SCREAMING_SNAKE name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Claimed,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Claimed => "CLAIMED",
            JobStatus::Running => "RUNNING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "CLAIMED" => Ok(JobStatus::Claimed),
            "RUNNING" => Ok(JobStatus::Running),
            "COMPLETED" => Ok(JobStatus::Completed),
            "FAILED" => Ok(JobStatus::Failed),
            _ => Err(()),
        }
    }
}

/// A claimed queue row.
///
/// `row` is the 1-based positional handle into the backing store, used only
/// for targeted cell updates; the logical identity is `id`, assigned by the
/// enqueuing side. Timestamp fields hold the raw ISO-8601 cell text.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub row: usize,
    pub id: String,
    pub name: String,
    pub status: JobStatus,
    pub payload: Map<String, Value>,
    pub enqueued_at: String,
    pub user_email: String,
    pub claimed_at: String,
}
