//! Delayed-call scheduling on the tokio runtime
//!
//! A tracker's pending timer is a spawned task that sleeps for the debounce
//! duration and then runs a closure. The handle cancels the task; whether a
//! woken-but-not-yet-fired task may still run its closure is decided by the
//! caller's epoch check, not here.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Cancellable handle to one scheduled delayed call.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Schedule `f` to run after `delay` on the current tokio runtime.
    ///
    /// The call is always asynchronous with respect to the scheduling site,
    /// even for a zero delay. Panics if called outside a runtime context.
    pub fn schedule<F>(delay: Duration, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            f();
        });
        Self { task }
    }

    /// Cancel the scheduled call.
    ///
    /// Best-effort: a task already past its sleep may still be running.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
