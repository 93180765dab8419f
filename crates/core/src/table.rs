//! Authoritative in-memory job and worker state.
//!
//! [`JobTable`] is plain data with no interior locking. The coordinator owns
//! it behind a single mutex; every method here assumes exclusive access and
//! takes `now` explicitly so lifecycle timing is deterministic under test.
//!
//! Queue invariant: an id0 is in `queue` iff its job is `waiting`.

use std::collections::{HashMap, VecDeque};

use chrono::Duration;
use serde::Serialize;

use crate::artifacts::ArtifactRef;
use crate::error::CoreError;
use crate::id0::Id0;
use crate::job::{Job, JobDescriptor, JobState, JobStatus, NewJob, Worker};
use crate::types::Timestamp;

/// Result of a heartbeat from the worker holding a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatOutcome {
    /// The job is still assigned and being worked on.
    Acknowledged,
    /// The job left `working` (canceled, reclaimed or done); the worker
    /// should stop and act on the reported status.
    StatusOverride(JobStatus),
}

/// What [`JobTable::submit`] did with a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A fresh job was queued. `replaced_canceled` is set when a canceled
    /// job under the same id0 was deleted to make room.
    Queued { replaced_canceled: bool },
    /// A live job already exists under this id0; nothing changed.
    AlreadyLive(JobStatus),
}

/// Consistent copy of every job plus the queue order.
#[derive(Debug, Clone, Serialize)]
pub struct JobsSnapshot {
    pub jobs: Vec<Job>,
    pub queue: Vec<Id0>,
}

#[derive(Debug, Default)]
pub struct JobTable {
    jobs: HashMap<Id0, Job>,
    workers: HashMap<String, Worker>,
    queue: VecDeque<Id0>,
    total_completed: u64,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a completed counter carried over from a previous run.
    pub fn with_completed(total_completed: u64) -> Self {
        Self {
            total_completed,
            ..Self::default()
        }
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Insert a new job unless a live one already exists for its id0.
    ///
    /// A canceled entry is deleted first, so resubmitting after a cancel
    /// always yields a fresh waiting job.
    pub fn submit(&mut self, new_job: NewJob, now: Timestamp) -> SubmitOutcome {
        let replaced_canceled = match self.status(&new_job.id0) {
            Some(JobStatus::Canceled) => {
                self.delete(&new_job.id0);
                true
            }
            Some(status) => return SubmitOutcome::AlreadyLive(status),
            None => false,
        };

        let id0 = new_job.id0.clone();
        self.jobs.insert(id0.clone(), Job::new(new_job, now));
        self.queue.push_back(id0);
        SubmitOutcome::Queued { replaced_canceled }
    }

    /// Record contact from a worker, creating it on first sight.
    pub fn touch_worker(
        &mut self,
        name: &str,
        address: &str,
        version: Option<&str>,
        now: Timestamp,
    ) {
        let worker = self
            .workers
            .entry(name.to_string())
            .or_insert_with(|| Worker {
                name: name.to_string(),
                address: address.to_string(),
                version: None,
                last_seen: now,
            });
        worker.address = address.to_string();
        worker.last_seen = now;
        if let Some(version) = version {
            worker.version = Some(version.to_string());
        }
    }

    /// Pop the head of the queue and assign it to `worker_name`.
    ///
    /// Returns `None` when nothing is waiting.
    pub fn assign_next(&mut self, worker_name: &str, now: Timestamp) -> Option<JobDescriptor> {
        while let Some(id0) = self.queue.pop_front() {
            let Some(job) = self.jobs.get_mut(&id0) else {
                tracing::error!(id0 = %id0, "Queued id0 has no job entry, dropping");
                continue;
            };
            if job.status() != JobStatus::Waiting {
                tracing::error!(
                    id0 = %id0,
                    status = %job.status(),
                    "Queued job is not waiting, dropping queue entry",
                );
                continue;
            }
            job.set_state(
                JobState::Working {
                    assignee: worker_name.to_string(),
                    last_heartbeat: now,
                },
                now,
            );
            return Some(job.descriptor());
        }
        None
    }

    /// Refresh liveness for a working job.
    pub fn heartbeat(
        &mut self,
        id0: &Id0,
        address: &str,
        now: Timestamp,
    ) -> Result<HeartbeatOutcome, CoreError> {
        let job = self
            .jobs
            .get_mut(id0)
            .ok_or_else(|| CoreError::job_not_found(id0.as_str()))?;

        let JobState::Working { assignee, .. } = &job.state else {
            return Ok(HeartbeatOutcome::StatusOverride(job.status()));
        };
        let assignee = assignee.clone();
        job.set_state(
            JobState::Working {
                assignee: assignee.clone(),
                last_heartbeat: now,
            },
            now,
        );
        self.touch_worker(&assignee, address, None, now);
        Ok(HeartbeatOutcome::Acknowledged)
    }

    /// Cancel a job. Already canceled or finished jobs are left untouched.
    pub fn cancel(&mut self, id0: &Id0, now: Timestamp) -> Result<(), CoreError> {
        let job = self
            .jobs
            .get_mut(id0)
            .ok_or_else(|| CoreError::job_not_found(id0.as_str()))?;

        match job.status() {
            JobStatus::Canceled | JobStatus::Done => return Ok(()),
            JobStatus::Waiting | JobStatus::Working => {}
        }
        job.set_state(JobState::Canceled { canceled_at: now }, now);
        self.queue.retain(|queued| queued != id0);
        Ok(())
    }

    /// Check that `id0` exists and may be completed, without changing anything.
    pub fn ensure_completable(&self, id0: &Id0) -> Result<(), CoreError> {
        match self.ensure_exists(id0)? {
            JobStatus::Canceled => Err(cannot_complete_canceled(id0)),
            _ => Ok(()),
        }
    }

    /// Fail with `NotFound` unless a job exists for `id0`.
    pub fn ensure_exists(&self, id0: &Id0) -> Result<JobStatus, CoreError> {
        self.status(id0)
            .ok_or_else(|| CoreError::job_not_found(id0.as_str()))
    }

    /// Mark a job done with an already stored artifact.
    ///
    /// Returns `true` if this was the job's first completion, which is the
    /// only case that bumps the completed counter. A canceled job cannot be
    /// completed; it stays canceled until trimmed or resubmitted.
    pub fn complete(
        &mut self,
        id0: &Id0,
        artifact: ArtifactRef,
        now: Timestamp,
    ) -> Result<bool, CoreError> {
        let job = self
            .jobs
            .get_mut(id0)
            .ok_or_else(|| CoreError::job_not_found(id0.as_str()))?;

        if job.status() == JobStatus::Canceled {
            return Err(cannot_complete_canceled(id0));
        }
        let first_completion = job.status() != JobStatus::Done;
        let was_waiting = job.status() == JobStatus::Waiting;
        job.set_state(JobState::Done { result: artifact }, now);
        if was_waiting {
            self.queue.retain(|queued| queued != id0);
        }
        if first_completion {
            self.total_completed += 1;
        }
        Ok(first_completion)
    }

    /// Put a canceled job back at the tail of the queue.
    pub fn reset(&mut self, id0: &Id0, now: Timestamp) -> Result<(), CoreError> {
        let job = self
            .jobs
            .get_mut(id0)
            .ok_or_else(|| CoreError::job_not_found(id0.as_str()))?;

        if job.status() != JobStatus::Canceled {
            return Err(CoreError::Conflict(format!(
                "Only canceled jobs can be reset (job is {})",
                job.status()
            )));
        }
        job.set_state(JobState::Waiting, now);
        self.queue.push_back(id0.clone());
        Ok(())
    }

    /// Return working jobs whose last heartbeat is older than `timeout` to
    /// the head of the queue, oldest submission first.
    pub fn release_dead(&mut self, now: Timestamp, timeout: Duration) -> Vec<Id0> {
        let mut dead: Vec<&mut Job> = self
            .jobs
            .values_mut()
            .filter(|job| match job.state {
                JobState::Working { last_heartbeat, .. } => {
                    now.signed_duration_since(last_heartbeat) > timeout
                }
                _ => false,
            })
            .collect();
        dead.sort_by_key(|job| job.created_at);

        let mut released = Vec::with_capacity(dead.len());
        for job in dead {
            job.set_state(JobState::Waiting, now);
            released.push(job.id0.clone());
        }
        for id0 in released.iter().rev() {
            self.queue.push_front(id0.clone());
        }
        released
    }

    /// Delete canceled jobs whose grace period has elapsed.
    pub fn trim_canceled(&mut self, now: Timestamp, grace: Duration) -> Vec<Id0> {
        let expired: Vec<Id0> = self
            .jobs
            .values()
            .filter(|job| match job.state {
                JobState::Canceled { canceled_at } => {
                    now.signed_duration_since(canceled_at) > grace
                }
                _ => false,
            })
            .map(|job| job.id0.clone())
            .collect();

        for id0 in &expired {
            self.delete(id0);
        }
        expired
    }

    fn delete(&mut self, id0: &Id0) {
        if let Some(job) = self.jobs.remove(id0) {
            if job.status() == JobStatus::Waiting {
                self.queue.retain(|queued| queued != id0);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn status(&self, id0: &Id0) -> Option<JobStatus> {
        self.jobs.get(id0).map(Job::status)
    }

    pub fn job(&self, id0: &Id0) -> Option<&Job> {
        self.jobs.get(id0)
    }

    pub fn count_jobs(&self, status: JobStatus) -> usize {
        self.jobs.values().filter(|j| j.status() == status).count()
    }

    pub fn count_workers(&self, active_window: Option<(Timestamp, Duration)>) -> usize {
        match active_window {
            None => self.workers.len(),
            Some((now, window)) => self
                .workers
                .values()
                .filter(|w| w.is_active(now, window))
                .count(),
        }
    }

    pub fn total_completed(&self) -> u64 {
        self.total_completed
    }

    /// All jobs (oldest first) and the queue in dispatch order.
    pub fn snapshot(&self) -> JobsSnapshot {
        let mut jobs: Vec<Job> = self.jobs.values().cloned().collect();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id0.cmp(&b.id0)));
        JobsSnapshot {
            jobs,
            queue: self.queue.iter().cloned().collect(),
        }
    }

    /// All workers, most recently seen first.
    pub fn workers(&self) -> Vec<Worker> {
        let mut workers: Vec<Worker> = self.workers.values().cloned().collect();
        workers.sort_by(|a, b| b.last_seen.cmp(&a.last_seen).then(a.name.cmp(&b.name)));
        workers
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

fn cannot_complete_canceled(id0: &Id0) -> CoreError {
    CoreError::Conflict(format!("Job {id0} was canceled and cannot be completed"))
}
