mod archive;
mod audit_log;
mod cleanup;

pub use archive::{ActionCount, ArchiveInfo, ArchiveManifest, ArchiveStatistics};
pub use audit_log::{AuditLog, AuditLogStats, CreateAuditLog};
pub use cleanup::{CleanupOptions, CleanupReport, PolicyOutcome};
