//! Overwrite-semantics shared cells connecting the capture loop, the
//! recognition worker, and IPC consumers.

use std::sync::{Arc, Mutex};

/// Single-value shared cell: every publish replaces the previous value,
/// and readers always see the most recent value or nothing.
///
/// No history is kept; a slow reader silently skips intermediate
/// values and the producer never waits for consumers. The lock is held
/// only for the pointer swap.
pub struct SharedSlot<T> {
    inner: Mutex<Option<Arc<T>>>,
}

impl<T> SharedSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Replace the current value unconditionally.
    pub fn publish(&self, value: T) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(Arc::new(value));
    }

    /// The most recent value, or `None` if nothing was published yet.
    /// Never blocks beyond the pointer swap and never fails.
    pub fn read(&self) -> Option<Arc<T>> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Drop the current value, returning the slot to empty.
    pub fn clear(&self) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = None;
    }
}

impl<T> Default for SharedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slot_reads_none() {
        let slot: SharedSlot<u32> = SharedSlot::new();
        assert!(slot.read().is_none());
    }

    #[test]
    fn later_publish_overwrites_earlier() {
        let slot = SharedSlot::new();
        slot.publish(1u32);
        slot.publish(2u32);
        // Only the latest value is observable; the first write is gone.
        assert_eq!(*slot.read().expect("value published"), 2);
        assert_eq!(*slot.read().expect("read is not consuming"), 2);
    }

    #[test]
    fn clear_empties_the_slot() {
        let slot = SharedSlot::new();
        slot.publish("x");
        slot.clear();
        assert!(slot.read().is_none());
    }

    #[test]
    fn publish_and_read_across_threads() {
        let slot = Arc::new(SharedSlot::new());
        let writer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for i in 0..100u32 {
                    slot.publish(i);
                }
            })
        };
        writer.join().expect("writer thread");
        assert_eq!(*slot.read().expect("writer published"), 99);
    }
}
