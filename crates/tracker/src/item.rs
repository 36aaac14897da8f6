//! Item identity seam for batch de-duplication

/// An item that can be accumulated in a tracker's batch.
///
/// The `id` is the identity used by the mutable-batch policy: when a tracker
/// runs with `mutable_batch` enabled, adding an item whose id already exists
/// in the batch replaces the prior entry (moved to the end of the batch).
///
/// Items are cloned when a batch is retained across a callback
/// (`clean_batch_on_callback` disabled) and when snapshots are taken, so
/// payloads should be cheap to clone or internally reference-counted.
pub trait BatchItem: Clone + Send + 'static {
    /// Identity of this item within a batch.
    fn id(&self) -> &str;
}
