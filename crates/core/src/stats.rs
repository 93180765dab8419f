//! Aggregate counts for the public network-status endpoint.

use serde::Serialize;

use crate::job::JobStatus;
use crate::table::JobTable;
use crate::types::Timestamp;

/// Pool-wide counters, derived from one consistent table snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub waiting: usize,
    pub working: usize,
    /// Workers seen within the active window.
    pub miners: usize,
    /// Jobs ever completed, including those from previous runs.
    #[serde(rename = "totalMined")]
    pub total_mined: u64,
}

impl NetworkStats {
    pub fn from_table(table: &JobTable, now: Timestamp, active_window: chrono::Duration) -> Self {
        Self {
            waiting: table.count_jobs(JobStatus::Waiting),
            working: table.count_jobs(JobStatus::Working),
            miners: table.count_workers(Some((now, active_window))),
            total_mined: table.total_completed(),
        }
    }
}
