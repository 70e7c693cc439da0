//! Archive export and lifecycle management.
//!
//! Expiring audit batches are serialized to flat files (JSON or CSV,
//! optionally gzipped) together with a manifest, written atomically via a
//! temp-file rename. The store side lists, serves, and age-purges those
//! files.

mod store;
mod writer;

pub use store::ArchiveStore;
use thiserror::Error;
pub use writer::ArchiveWriter;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive of {actual} bytes exceeds the {limit_mb} MB size limit")]
    TooLarge { limit_mb: u64, actual: u64 },

    #[error("invalid archive file name: {0}")]
    InvalidName(String),

    #[error("archive not found: {0}")]
    NotFound(String),
}
