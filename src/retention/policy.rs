use std::collections::BTreeMap;

use crate::config::RetentionConfig;

/// Applied when the configured default is unusable. Matches the configured
/// default shipped out of the box.
pub const FALLBACK_RETENTION_DAYS: u32 = 365;

/// Immutable view of the retention policies for one cleanup run.
///
/// Resolution is total: every action maps to a retention period, falling
/// back first to the configured default and then to the built-in fallback.
#[derive(Debug, Clone)]
pub struct PolicySnapshot {
    policies: BTreeMap<String, u32>,
    default_days: u32,
}

impl PolicySnapshot {
    pub fn from_config(config: &RetentionConfig) -> Self {
        Self {
            policies: config.policies.clone(),
            default_days: config.default_retention_days,
        }
    }

    /// Retention period in days for an action. Never fails and never
    /// returns zero.
    pub fn resolve(&self, action: &str) -> u32 {
        if let Some(&days) = self.policies.get(action) {
            return days;
        }
        if self.default_days > 0 {
            self.default_days
        } else {
            FALLBACK_RETENTION_DAYS
        }
    }

    /// Configured policies in deterministic (action-sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.policies.iter().map(|(action, &days)| (action.as_str(), days))
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
