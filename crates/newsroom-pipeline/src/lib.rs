//! `newsroom-pipeline` — the per-item orchestrator and the job runner.
//!
//! The orchestrator walks one raw item through the full gauntlet: validation,
//! exact-duplicate gate, raw persistence, services health, length gate,
//! semantic-duplicate gate (with rollback), vectorization, editorial, and the
//! final transactional write of processed + short-form records.
//!
//! The job runner owns job lifecycle: accepts requests, runs orchestrations
//! in background tasks under a worker cap, and exposes poll-able job state.
//! Jobs are process-local; loss on restart is accepted.

pub mod orchestrator;
pub mod outcome;
pub mod params;
pub mod runner;
pub mod traits;

pub use orchestrator::{ItemOptions, Orchestrator};
pub use outcome::ItemOutcome;
pub use params::JobParams;
pub use runner::{JobRecord, JobRunner, JobState};
pub use traits::{Deduplicator, Editor};
