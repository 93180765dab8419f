//! Job and worker records owned by the job table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactRef;
use crate::id0::Id0;
use crate::types::Timestamp;

/// Externally visible job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Waiting,
    Working,
    Canceled,
    Done,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Working => "working",
            Self::Canceled => "canceled",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Console hardware revision the mii was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleModel {
    Old,
    New,
}

impl ConsoleModel {
    /// Parse an already lowercased model name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "old" => Some(Self::Old),
            "new" => Some(Self::New),
            _ => None,
        }
    }
}

/// Kind-specific input handed to a miner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum JobPayload {
    /// Full bruteforce starting from a 112-byte mii blob (base64).
    Mii {
        model: ConsoleModel,
        year: Option<u16>,
        mii_data: String,
    },
    /// Resumed search from an already computed `movable_part1.sed` (base64).
    Part1 { part1_data: String },
}

/// A validated submission, ready to be handed to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub id0: Id0,
    pub payload: JobPayload,
}

/// Lifecycle state. Status-specific fields live on the variant that owns them,
/// so a job cannot carry an assignee unless it is working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobState {
    Waiting,
    Working {
        assignee: String,
        last_heartbeat: Timestamp,
    },
    Canceled {
        canceled_at: Timestamp,
    },
    Done {
        result: ArtifactRef,
    },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Waiting => JobStatus::Waiting,
            Self::Working { .. } => JobStatus::Working,
            Self::Canceled { .. } => JobStatus::Canceled,
            Self::Done { .. } => JobStatus::Done,
        }
    }
}

/// A single bruteforce task bound to a device identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    pub id0: Id0,
    #[serde(flatten)]
    pub payload: JobPayload,
    #[serde(flatten)]
    pub state: JobState,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    pub fn new(new_job: NewJob, now: Timestamp) -> Self {
        Self {
            id0: new_job.id0,
            payload: new_job.payload,
            state: JobState::Waiting,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    /// Name of the worker holding this job, if it is being worked on.
    pub fn assignee(&self) -> Option<&str> {
        match &self.state {
            JobState::Working { assignee, .. } => Some(assignee),
            _ => None,
        }
    }

    pub fn descriptor(&self) -> JobDescriptor {
        JobDescriptor {
            id0: self.id0.clone(),
            payload: self.payload.clone(),
        }
    }

    pub(crate) fn set_state(&mut self, state: JobState, now: Timestamp) {
        self.state = state;
        self.updated_at = now;
    }
}

/// What a miner receives when it is assigned a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id0: Id0,
    #[serde(flatten)]
    pub payload: JobPayload,
}

/// A polling client. Created on first contact, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worker {
    pub name: String,
    pub address: String,
    pub version: Option<String>,
    pub last_seen: Timestamp,
}

impl Worker {
    /// Whether the worker has been seen within `window` of `now`.
    pub fn is_active(&self, now: Timestamp, window: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_seen) <= window
    }
}
