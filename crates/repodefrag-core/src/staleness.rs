use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Age threshold plus the instant ages are measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StalenessPolicy {
    pub threshold_days: u32,
    pub now: DateTime<Utc>,
}

impl StalenessPolicy {
    pub fn new(threshold_days: u32, now: DateTime<Utc>) -> Self {
        Self { threshold_days, now }
    }

    /// Strictly older than the threshold.
    pub fn is_stale(&self, at: DateTime<Utc>) -> bool {
        self.now - at > Duration::days(i64::from(self.threshold_days))
    }

    /// Unknown timestamps are never stale.
    pub fn is_stale_opt(&self, at: Option<DateTime<Utc>>) -> bool {
        at.is_some_and(|at| self.is_stale(at))
    }
}
