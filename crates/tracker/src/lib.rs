//! Named-tracker debounce/batch scheduler
//!
//! This crate provides a registry of independent, named debounce timers
//! ("trackers") with:
//! - Per-tracker debounce windows (every action resets the timer)
//! - Item accumulation with configurable de-duplication by id
//! - Manual flush (override) and batch clearing
//! - A registry on-change hook for host-layer notification
//!
//! Trackers coalesce high-frequency state-change notifications (e.g.
//! autosave triggers) into a single callback per period of inactivity.

pub mod config;
pub mod error;
pub mod item;
pub mod registry;
pub mod timer;
pub mod tracker;

pub use config::{ResolvedConfig, TrackerConfig};
pub use error::RegistryError;
pub use item::BatchItem;
pub use registry::TrackerRegistry;
pub use tracker::Tracker;
