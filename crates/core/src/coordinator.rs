//! Lifecycle coordinator: the single owner of the job table.
//!
//! Every operation takes the coordination lock for its whole duration, so
//! no caller ever observes a job mid-transition. Maintenance (releasing dead
//! jobs, trimming canceled ones) piggybacks on request paths instead of
//! running on a timer.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::artifacts::ArtifactStore;
use crate::error::CoreError;
use crate::id0::Id0;
use crate::job::{JobDescriptor, JobStatus, NewJob, Worker};
use crate::stats::NetworkStats;
use crate::table::{HeartbeatOutcome, JobTable, JobsSnapshot, SubmitOutcome};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// A working job whose last heartbeat is older than this is reclaimed.
pub const DEFAULT_HEARTBEAT_TIMEOUT_SECS: u64 = 300;

/// How long a canceled job blocks its id0 before it is deleted.
pub const DEFAULT_CANCEL_GRACE_PERIOD_SECS: u64 = 300;

/// A worker seen within this window counts as active.
pub const DEFAULT_WORKER_ACTIVE_WINDOW_SECS: u64 = 300;

/// Timing knobs for the coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub heartbeat_timeout: Duration,
    pub cancel_grace_period: Duration,
    pub worker_active_window: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout: Duration::from_secs(DEFAULT_HEARTBEAT_TIMEOUT_SECS),
            cancel_grace_period: Duration::from_secs(DEFAULT_CANCEL_GRACE_PERIOD_SECS),
            worker_active_window: Duration::from_secs(DEFAULT_WORKER_ACTIVE_WINDOW_SECS),
        }
    }
}

/// Convert a std duration into chrono, saturating on overflow.
fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

pub struct Coordinator {
    table: Mutex<JobTable>,
    artifacts: Arc<dyn ArtifactStore>,
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Build a coordinator with an explicit completed-count seed.
    pub fn new(
        config: CoordinatorConfig,
        artifacts: Arc<dyn ArtifactStore>,
        total_completed: u64,
    ) -> Self {
        Self {
            table: Mutex::new(JobTable::with_completed(total_completed)),
            artifacts,
            config,
        }
    }

    /// Build a coordinator whose completed counter is seeded from the number
    /// of artifacts already in storage, so restarts keep historical totals.
    pub async fn initialize(
        config: CoordinatorConfig,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Result<Self, CoreError> {
        let previously_completed = artifacts.count().await?;
        tracing::info!(previously_completed, "Seeded completed job count from artifact store");
        Ok(Self::new(config, artifacts, previously_completed as u64))
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    fn now() -> Timestamp {
        Utc::now()
    }

    // -----------------------------------------------------------------------
    // Lifecycle operations
    // -----------------------------------------------------------------------

    /// Queue a job. Resubmitting a live id0 is a silent no-op; resubmitting
    /// a canceled one replaces it with a fresh waiting job.
    pub async fn submit(&self, job: NewJob) -> Id0 {
        let id0 = job.id0.clone();
        let outcome = self.table.lock().await.submit(job, Self::now());
        match outcome {
            SubmitOutcome::Queued { replaced_canceled } => {
                tracing::info!(id0 = %id0, replaced_canceled, "Job submitted");
            }
            SubmitOutcome::AlreadyLive(status) => {
                tracing::debug!(id0 = %id0, %status, "Resubmission of live job ignored");
            }
        }
        id0
    }

    /// Hand the next waiting job to `worker_name`, reclaiming dead jobs first.
    pub async fn request(
        &self,
        worker_name: &str,
        address: &str,
        version: Option<&str>,
    ) -> Option<JobDescriptor> {
        let now = Self::now();
        let mut table = self.table.lock().await;

        let released = table.release_dead(now, chrono_duration(self.config.heartbeat_timeout));
        log_released(&released);

        table.touch_worker(worker_name, address, version, now);
        let job = table.assign_next(worker_name, now);
        if let Some(job) = &job {
            tracing::info!(id0 = %job.id0, worker = worker_name, "Job assigned");
        }
        job
    }

    /// Liveness signal from the worker holding `id0`.
    pub async fn heartbeat(&self, id0: &Id0, address: &str) -> Result<HeartbeatOutcome, CoreError> {
        self.table.lock().await.heartbeat(id0, address, Self::now())
    }

    /// Cancel a job after trimming expired canceled jobs.
    pub async fn cancel(&self, id0: &Id0) -> Result<(), CoreError> {
        let now = Self::now();
        let mut table = self.table.lock().await;

        let deleted = table.trim_canceled(now, chrono_duration(self.config.cancel_grace_period));
        log_deleted(&deleted);

        table.cancel(id0, now)?;
        tracing::info!(id0 = %id0, "Job canceled");
        Ok(())
    }

    /// Store the result artifact and mark the job done.
    ///
    /// Canceled jobs are rejected before anything is written.
    pub async fn complete(&self, id0: &Id0, artifact: &[u8]) -> Result<(), CoreError> {
        let mut table = self.table.lock().await;
        table.ensure_completable(id0)?;

        let stored = self.artifacts.put(id0, artifact).await?;
        let first = table.complete(id0, stored, Self::now())?;
        tracing::info!(id0 = %id0, first_completion = first, "Job completed");
        Ok(())
    }

    /// Return a canceled job to the queue.
    pub async fn reset(&self, id0: &Id0) -> Result<(), CoreError> {
        self.table.lock().await.reset(id0, Self::now())?;
        tracing::info!(id0 = %id0, "Canceled job reset to waiting");
        Ok(())
    }

    /// Reclaim working jobs whose heartbeat went stale.
    pub async fn release_dead_jobs(&self) -> Vec<Id0> {
        let released = self
            .table
            .lock()
            .await
            .release_dead(Self::now(), chrono_duration(self.config.heartbeat_timeout));
        log_released(&released);
        released
    }

    /// Delete canceled jobs whose grace period has elapsed.
    pub async fn trim_canceled_jobs(&self) -> Vec<Id0> {
        let deleted = self
            .table
            .lock()
            .await
            .trim_canceled(Self::now(), chrono_duration(self.config.cancel_grace_period));
        log_deleted(&deleted);
        deleted
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn status(&self, id0: &Id0) -> Option<JobStatus> {
        self.table.lock().await.status(id0)
    }

    pub async fn count_jobs(&self, status: JobStatus) -> usize {
        self.table.lock().await.count_jobs(status)
    }

    pub async fn count_workers(&self, active_only: bool) -> usize {
        let window = active_only.then(|| {
            (
                Self::now(),
                chrono_duration(self.config.worker_active_window),
            )
        });
        self.table.lock().await.count_workers(window)
    }

    pub async fn list_jobs(&self) -> JobsSnapshot {
        self.table.lock().await.snapshot()
    }

    pub async fn list_workers(&self) -> Vec<Worker> {
        self.table.lock().await.workers()
    }

    pub async fn stats(&self) -> NetworkStats {
        let table = self.table.lock().await;
        NetworkStats::from_table(
            &table,
            Self::now(),
            chrono_duration(self.config.worker_active_window),
        )
    }

    /// Fetch a stored artifact. Reads the store directly; artifacts outlive
    /// their jobs.
    pub async fn artifact(&self, id0: &Id0) -> Result<Option<Vec<u8>>, CoreError> {
        Ok(self.artifacts.get(id0).await?)
    }
}

fn log_released(released: &[Id0]) {
    for id0 in released {
        tracing::info!(id0 = %id0, "Released dead job back to the queue");
    }
}

fn log_deleted(deleted: &[Id0]) {
    for id0 in deleted {
        tracing::info!(id0 = %id0, "Deleted expired canceled job");
    }
}
