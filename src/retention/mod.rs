//! The retention engine: policy resolution, cleanup execution, scheduling.
//!
//! A cleanup run resolves an immutable policy snapshot, then processes each
//! policy sequentially: compute the cutoff, count matches, optionally
//! archive the batch, delete in bounded batches. Failures are isolated per
//! policy; a run always produces a report. Scheduled and forced runs share
//! one concurrency guard.

mod engine;
mod policy;
mod scheduler;

pub use engine::{CleanupEngine, EngineError, META_AUDIT_ACTION};
pub use policy::{FALLBACK_RETENTION_DAYS, PolicySnapshot};
pub use scheduler::CleanupScheduler;
