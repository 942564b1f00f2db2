use std::time::Duration;

/// Consecutive claim-misses after which an auto-stopping processor halts.
pub const IDLE_STOP_THRESHOLD: u32 = 10;

/// How long `stop()` waits for the loop to observe the flag and exit.
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_INTERVAL_SECS: f64 = 5.0;
pub const DEFAULT_AUTO_STOP_MINUTES: u64 = 30;

/// Tuning for one run of the processor loop.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Sleep between polling iterations, in (fractional) seconds.
    pub interval_secs: f64,
    /// Hard cap on polling iterations; unlimited when absent.
    pub max_iterations: Option<u64>,
    /// Wall-clock bound on the whole run; when set, the idle-count policy is
    /// active as well. Absent means the loop only stops on request.
    pub auto_stop_minutes: Option<u64>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            max_iterations: None,
            auto_stop_minutes: Some(DEFAULT_AUTO_STOP_MINUTES),
        }
    }
}

impl ProcessorConfig {
    pub fn with_interval_secs(mut self, secs: f64) -> Self {
        self.interval_secs = secs;
        self
    }

    pub fn with_max_iterations(mut self, max: u64) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_auto_stop_minutes(mut self, minutes: Option<u64>) -> Self {
        self.auto_stop_minutes = minutes;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs.max(0.0))
    }

    pub fn auto_stop_after(&self) -> Option<Duration> {
        self.auto_stop_minutes
            .map(|minutes| Duration::from_secs(minutes * 60))
    }
}
