//! Name-keyed collection of trackers and the public operation surface

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::error::RegistryError;
use crate::item::BatchItem;
use crate::tracker::Tracker;

/// Observer invoked with the tracker name after each successful insert.
type OnChange = Arc<dyn Fn(&str) + Send + Sync>;

/// Registry of named trackers.
///
/// The single source of truth for name-to-tracker lookup. Operations on
/// unknown names (and duplicate creates) are non-fatal: they log a warning
/// and return, so call sites racing against tracker creation degrade to a
/// dropped update instead of a crash. Use the `try_*` methods to observe
/// those failures instead.
///
/// Lookups hand out `Arc<Tracker>` clones rather than map guards, so a
/// callback may re-enter the registry (including for its own tracker)
/// without deadlocking.
pub struct TrackerRegistry<T: BatchItem> {
    trackers: DashMap<String, Arc<Tracker<T>>>,
    on_change: RwLock<Option<OnChange>>,
}

impl<T: BatchItem> Default for TrackerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: BatchItem> TrackerRegistry<T> {
    pub fn new() -> Self {
        Self {
            trackers: DashMap::new(),
            on_change: RwLock::new(None),
        }
    }

    /// Register an observer notified (with the tracker name) after every
    /// successful insert. The host layer subscribes here to re-render or
    /// re-run consumers once a new tracker becomes visible.
    pub fn set_on_change<F>(&self, observer: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        *self.on_change.write() = Some(Arc::new(observer));
    }

    /// Create and register a tracker with the default policy.
    ///
    /// Duplicate name: warning, no-op; the original tracker is untouched.
    pub fn create_tracker<F>(&self, name: &str, timeout: Duration, callback: F)
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        self.create_tracker_with(name, timeout, callback, TrackerConfig::default(), None::<fn()>);
    }

    /// Create and register a tracker with policy overrides and an optional
    /// one-shot creation hook.
    ///
    /// `on_created` fires synchronously once registration is visible to
    /// subsequent calls, so it may immediately `action` the new tracker
    /// without racing the insert. It does not fire on a duplicate name.
    pub fn create_tracker_with<F, G>(
        &self,
        name: &str,
        timeout: Duration,
        callback: F,
        config: TrackerConfig,
        on_created: Option<G>,
    ) where
        F: Fn(Vec<T>) + Send + Sync + 'static,
        G: FnOnce(),
    {
        match self.try_create_tracker(name, timeout, callback, config) {
            Ok(_) => {
                if let Some(hook) = on_created {
                    hook();
                }
            }
            Err(err) => warn!(%err, "cannot create tracker; ignoring"),
        }
    }

    /// Fallible creation path. Returns the new tracker handle.
    pub fn try_create_tracker<F>(
        &self,
        name: &str,
        timeout: Duration,
        callback: F,
        config: TrackerConfig,
    ) -> Result<Arc<Tracker<T>>, RegistryError>
    where
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        let tracker = {
            match self.trackers.entry(name.to_owned()) {
                Entry::Occupied(_) => {
                    return Err(RegistryError::DuplicateName(name.to_owned()));
                }
                Entry::Vacant(slot) => {
                    let tracker = Tracker::new(
                        name.to_owned(),
                        timeout,
                        Arc::new(callback),
                        config.resolve(),
                    );
                    slot.insert(Arc::clone(&tracker));
                    tracker
                }
            }
            // Shard guard dropped here; observers may look the tracker up.
        };

        debug!(tracker = name, ?timeout, "tracker registered");
        // Clone the observer out so it runs without any registry lock held.
        let observer = self.on_change.read().clone();
        if let Some(observer) = observer {
            observer(name);
        }
        Ok(tracker)
    }

    /// Register an action on a tracker, resetting its debounce window.
    ///
    /// The item, if supplied, is appended under the tracker's own
    /// mutable-batch policy. The window resets regardless of whether an
    /// item was supplied. Unknown name: warning, no-op.
    pub fn action(&self, name: &str, item: Option<T>) {
        let Some(tracker) = self.lookup_or_warn(name, "register action") else {
            return;
        };
        if let Some(item) = item {
            tracker.add_item(item);
        }
        tracker.start();
    }

    /// Force an immediate flush: cancel the pending timer and invoke the
    /// tracker's callback synchronously with the current batch.
    ///
    /// Unknown name: warning, no-op.
    pub fn override_callback(&self, name: &str) {
        let Some(tracker) = self.lookup_or_warn(name, "override callback") else {
            return;
        };
        tracker.run_callback_now();
    }

    /// Empty a tracker's batch without firing its callback.
    ///
    /// Unknown name: warning, no-op.
    pub fn clean_batch(&self, name: &str) {
        let Some(tracker) = self.lookup_or_warn(name, "clean batch") else {
            return;
        };
        tracker.clear();
    }

    /// Look up a tracker by name. Pure query, no side effects.
    pub fn get_tracker(&self, name: &str) -> Option<Arc<Tracker<T>>> {
        self.try_lookup(name).ok()
    }

    /// Fallible lookup path.
    pub fn try_lookup(&self, name: &str) -> Result<Arc<Tracker<T>>, RegistryError> {
        self.trackers
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RegistryError::UnknownTracker(name.to_owned()))
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    fn lookup_or_warn(&self, name: &str, operation: &str) -> Option<Arc<Tracker<T>>> {
        match self.try_lookup(name) {
            Ok(tracker) => Some(tracker),
            Err(err) => {
                warn!(%err, operation, "operation on unknown tracker; ignoring");
                None
            }
        }
    }
}
