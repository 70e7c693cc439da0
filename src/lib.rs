//! Audit log retention and archival engine.
//!
//! Tabularium appends audit events to an append-only store and reclaims
//! them on a configurable schedule: per-action retention policies, optional
//! archive-before-delete to flat files, bounded batch deletion, and an
//! admin API for triggering runs and managing archives.

pub mod archive;
pub mod config;
pub mod db;
pub mod models;
pub mod observability;
pub mod retention;
pub mod routes;
