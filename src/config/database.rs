use serde::{Deserialize, Serialize};

/// SQLite database configuration for the audit table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    /// Default: tabularium.db
    #[serde(default = "default_path")]
    pub path: String,

    /// Maximum number of pooled connections.
    /// Default: 5
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Create the database file if it does not exist.
    /// Default: true
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,

    /// Use WAL journal mode for better write concurrency.
    /// Default: true
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Busy timeout in milliseconds before a locked database errors.
    /// Default: 5000
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            max_connections: default_max_connections(),
            create_if_missing: default_create_if_missing(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_path() -> String {
    "tabularium.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_create_if_missing() -> bool {
    true
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5000
}
