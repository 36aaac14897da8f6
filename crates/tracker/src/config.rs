//! Per-tracker batching policy
//!
//! Callers supply a `TrackerConfig` with only the fields they want to
//! override; unset fields resolve to the defaults at creation time.

use serde::{Deserialize, Serialize};

/// Caller-supplied policy overrides for a tracker.
///
/// Both fields default to unset, which resolves to `true`. The distinction
/// matters: an explicit `Some(false)` is honored, while an absent field
/// falls back to the default rather than being treated as false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// When enabled, only the latest item per id is kept in the batch.
    /// When disabled, every action is appended, preserving the full
    /// mutation history for that batch (useful for undo).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutable_batch: Option<bool>,

    /// When enabled, the batch is emptied after each callback firing.
    /// When disabled, items are retained and must be cleared manually
    /// via `clean_batch` to avoid unbounded growth.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_batch_on_callback: Option<bool>,
}

impl TrackerConfig {
    /// Merge these overrides onto the defaults.
    pub fn resolve(self) -> ResolvedConfig {
        let defaults = ResolvedConfig::default();
        ResolvedConfig {
            mutable_batch: self.mutable_batch.unwrap_or(defaults.mutable_batch),
            clean_batch_on_callback: self
                .clean_batch_on_callback
                .unwrap_or(defaults.clean_batch_on_callback),
        }
    }
}

/// Fully-resolved tracker policy, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Keep only the latest item per id.
    pub mutable_batch: bool,
    /// Empty the batch after each callback firing.
    pub clean_batch_on_callback: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            mutable_batch: true,
            clean_batch_on_callback: true,
        }
    }
}
