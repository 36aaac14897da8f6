//! Registry error taxonomy

use thiserror::Error;

/// Usage mistakes surfaced by the registry.
///
/// Both variants are non-fatal by design: the warn-and-no-op operations
/// (`create_tracker`, `action`, `override_callback`, `clean_batch`) log
/// these and return, so racy call sites (e.g. an `action` firing before its
/// `create_tracker` effect has run) degrade to a dropped update instead of
/// a crash. The `try_*` methods return them directly for callers that want
/// to handle the failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A tracker with this name is already registered.
    #[error("tracker `{0}` already exists")]
    DuplicateName(String),

    /// No tracker with this name is registered.
    #[error("no tracker named `{0}`")]
    UnknownTracker(String),
}
