use std::sync::Mutex;

/// Why the producer side of a relay stopped updating, observable by
/// the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// The producer is connected and may still publish.
    Live,
    /// Clean end-of-stream; the service closed the connection or the
    /// worker was stopped.
    Ended,
    /// The producer died on a transport error.
    Failed,
}

struct Slot<T> {
    value: Option<T>,
    status: StreamStatus,
}

/// Single-slot handoff between one producer and one consumer thread.
///
/// The producer overwrites the slot under the lock; the consumer
/// clones it out under the lock. No history, no backpressure: if the
/// consumer is slower than the producer, intermediate values are
/// dropped and only the latest survives.
///
/// A snapshot observes either the initial empty state or the value of
/// exactly one completed publish, never a mix of two. The lock guard is
/// scoped, so it is released on every exit path; neither side ever
/// holds it across I/O or rendering work.
pub struct LatestValue<T> {
    slot: Mutex<Slot<T>>,
}

impl<T: Clone> LatestValue<T> {
    pub fn new() -> Self {
        LatestValue {
            slot: Mutex::new(Slot {
                value: None,
                status: StreamStatus::Live,
            }),
        }
    }

    /// Replace the stored value. Never waits on a consumer.
    pub fn publish(&self, value: T) {
        self.lock().value = Some(value);
    }

    /// Copy of the current value, or `None` if nothing has been
    /// published yet. The lock is held only for the clone.
    pub fn snapshot(&self) -> Option<T> {
        self.lock().value.clone()
    }

    /// Current producer status. A consumer that stops seeing fresh
    /// values can distinguish "idle" from "gone".
    pub fn status(&self) -> StreamStatus {
        self.lock().status
    }

    pub(crate) fn set_status(&self, status: StreamStatus) {
        self.lock().status = status;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot<T>> {
        // A slot is overwritten atomically under the lock, so even a
        // panicked publisher leaves a complete value behind.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Default for LatestValue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Relay carrying the most recent row-major 4x4 transform of the
/// selected device.
pub type TransformRelay = LatestValue<[f32; 16]>;
