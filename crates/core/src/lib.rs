//! Job coordination engine for the seedpool volunteer mining service.
//!
//! Everything here is transport agnostic: the API crate owns HTTP, this crate
//! owns identifiers, submissions, the job/worker table and the coordinator
//! that serializes access to it.

pub mod artifacts;
pub mod coordinator;
pub mod error;
pub mod id0;
pub mod job;
pub mod mii;
pub mod stats;
pub mod submission;
pub mod table;
pub mod types;
