pub mod archives;
pub mod audit_logs;
pub mod retention;
