//! One named debounce stream: items, policy, and the pending timer

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::item::BatchItem;
use crate::timer::TimerHandle;

/// Callback invoked with the accumulated batch when a tracker fires.
pub(crate) type BatchCallback<T> = Arc<dyn Fn(Vec<T>) + Send + Sync>;

/// A single named debounce unit.
///
/// Owns its debounce duration, accumulated items, resolved policy, and the
/// pending-timer handle. At most one timer is pending at a time: every
/// `start` cancels the prior one, so only the most recent deadline can fire
/// (last-start-wins). Armed timers fire from a spawned task; the manual
/// override fires synchronously on the caller.
pub struct Tracker<T: BatchItem> {
    name: String,
    timeout: Duration,
    callback: BatchCallback<T>,
    config: ResolvedConfig,
    /// Handle to ourselves for the spawned timer task. Weak, so a tracker
    /// dropped with its registry can never fire afterwards.
    weak: Weak<Tracker<T>>,
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    items: Vec<T>,
    timer: Option<TimerHandle>,
    /// Bumped on every arm or cancel. A firing task re-checks its epoch
    /// under the lock, so a superseded or cancelled timer that already woke
    /// up returns without invoking the callback.
    epoch: u64,
}

impl<T: BatchItem> Tracker<T> {
    pub(crate) fn new(
        name: String,
        timeout: Duration,
        callback: BatchCallback<T>,
        config: ResolvedConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            name,
            timeout,
            callback,
            config,
            weak: weak.clone(),
            inner: Mutex::new(Inner {
                items: Vec::new(),
                timer: None,
                epoch: 0,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn config(&self) -> ResolvedConfig {
        self.config
    }

    /// Snapshot of the current batch, in insertion order.
    pub fn items(&self) -> Vec<T> {
        self.inner.lock().items.clone()
    }

    /// Whether a debounce window is currently counting down.
    pub fn timer_pending(&self) -> bool {
        self.inner.lock().timer.is_some()
    }

    /// Append an item to the batch.
    ///
    /// With `mutable_batch` enabled, a prior entry with the same id is
    /// removed first, so the new item lands at the end of the batch.
    pub fn add_item(&self, item: T) {
        let mut inner = self.inner.lock();
        if self.config.mutable_batch {
            let id = item.id().to_owned();
            inner.items.retain(|existing| existing.id() != id);
        }
        inner.items.push(item);
    }

    /// Remove all items with a matching id, leaving the timer untouched.
    pub fn purge_items(&self, id: &str) {
        self.inner.lock().items.retain(|item| item.id() != id);
    }

    /// Empty the batch without firing the callback or touching the timer.
    pub fn clear(&self) {
        self.inner.lock().items.clear();
    }

    /// Cancel any pending timer and arm a new one for `timeout` from now.
    ///
    /// Must be called from within a tokio runtime context. The callback
    /// runs from a spawned task once the window elapses with no further
    /// `start` calls; a zero timeout still fires asynchronously.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        if let Some(timer) = inner.timer.take() {
            timer.cancel();
        }
        inner.epoch = inner.epoch.wrapping_add(1);
        let epoch = inner.epoch;
        let weak = self.weak.clone();
        inner.timer = Some(TimerHandle::schedule(self.timeout, move || {
            if let Some(tracker) = weak.upgrade() {
                tracker.fire(epoch);
            }
        }));
    }

    /// Cancel any pending timer and invoke the callback immediately and
    /// synchronously with the current batch.
    ///
    /// The batch may be empty; the callback must tolerate an empty `Vec`.
    pub fn run_callback_now(&self) {
        let batch = {
            let mut inner = self.inner.lock();
            Self::cancel_timer(&mut inner);
            self.take_batch(&mut inner)
        };
        debug!(tracker = %self.name, items = batch.len(), "manual callback override");
        (self.callback)(batch);
    }

    /// Timer-fire path. Runs on the spawned timer task.
    fn fire(&self, epoch: u64) {
        let batch = {
            let mut inner = self.inner.lock();
            if inner.epoch != epoch {
                // Superseded by a later start or an override after we woke.
                return;
            }
            inner.timer = None;
            self.take_batch(&mut inner)
        };
        debug!(tracker = %self.name, items = batch.len(), "debounce window elapsed");
        (self.callback)(batch);
    }

    /// Remove the batch for delivery, per policy.
    ///
    /// The batch is moved out under the lock *before* the callback runs, so
    /// with `clean_batch_on_callback` enabled the tracker is cleared on
    /// every exit path, including a panicking callback.
    fn take_batch(&self, inner: &mut Inner<T>) -> Vec<T> {
        if self.config.clean_batch_on_callback {
            std::mem::take(&mut inner.items)
        } else {
            inner.items.clone()
        }
    }

    fn cancel_timer(inner: &mut Inner<T>) {
        if let Some(timer) = inner.timer.take() {
            timer.cancel();
        }
        // Invalidate any fire already past its sleep.
        inner.epoch = inner.epoch.wrapping_add(1);
    }
}

impl<T: BatchItem> std::fmt::Debug for Tracker<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Note {
        id: String,
        body: &'static str,
    }

    impl BatchItem for Note {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, body: &'static str) -> Note {
        Note {
            id: id.to_owned(),
            body,
        }
    }

    fn tracker_with(config: TrackerConfig) -> Arc<Tracker<Note>> {
        Tracker::new(
            "test".to_owned(),
            Duration::from_millis(10),
            Arc::new(|_| {}),
            config.resolve(),
        )
    }

    #[test]
    fn mutable_batch_replaces_by_id_and_moves_to_end() {
        let tracker = tracker_with(TrackerConfig::default());
        tracker.add_item(note("a", "first"));
        tracker.add_item(note("b", "other"));
        tracker.add_item(note("a", "second"));

        let items = tracker.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], note("b", "other"));
        assert_eq!(items[1], note("a", "second"));
    }

    #[test]
    fn immutable_batch_keeps_history() {
        let tracker = tracker_with(TrackerConfig {
            mutable_batch: Some(false),
            ..Default::default()
        });
        tracker.add_item(note("a", "first"));
        tracker.add_item(note("a", "second"));

        let items = tracker.items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].body, "first");
        assert_eq!(items[1].body, "second");
    }

    #[test]
    fn purge_removes_only_matching_ids() {
        let tracker = tracker_with(TrackerConfig {
            mutable_batch: Some(false),
            ..Default::default()
        });
        tracker.add_item(note("a", "one"));
        tracker.add_item(note("b", "two"));
        tracker.add_item(note("a", "three"));

        tracker.purge_items("a");
        assert_eq!(tracker.items(), vec![note("b", "two")]);

        tracker.clear();
        assert!(tracker.items().is_empty());
    }

    #[test]
    fn manual_override_clears_batch_by_default() {
        let received: Arc<Mutex<Vec<Vec<Note>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let tracker = Tracker::new(
            "flush".to_owned(),
            Duration::from_millis(10),
            Arc::new(move |batch| sink.lock().push(batch)),
            TrackerConfig::default().resolve(),
        );

        tracker.add_item(note("a", "payload"));
        tracker.run_callback_now();

        let calls = received.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec![note("a", "payload")]);
        drop(calls);
        assert!(tracker.items().is_empty());
    }

    #[test]
    fn manual_override_retains_batch_when_configured() {
        let received: Arc<Mutex<Vec<Vec<Note>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let tracker = Tracker::new(
            "retain".to_owned(),
            Duration::from_millis(10),
            Arc::new(move |batch| sink.lock().push(batch)),
            TrackerConfig {
                clean_batch_on_callback: Some(false),
                ..Default::default()
            }
            .resolve(),
        );

        tracker.add_item(note("a", "payload"));
        tracker.run_callback_now();

        assert_eq!(received.lock().len(), 1);
        assert_eq!(tracker.items(), vec![note("a", "payload")]);
    }

    #[test]
    fn empty_batch_override_invokes_callback() {
        let received: Arc<Mutex<Vec<Vec<Note>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let tracker = Tracker::new(
            "empty".to_owned(),
            Duration::from_millis(10),
            Arc::new(move |batch| sink.lock().push(batch)),
            TrackerConfig::default().resolve(),
        );

        tracker.run_callback_now();

        let calls = received.lock();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].is_empty());
    }
}
