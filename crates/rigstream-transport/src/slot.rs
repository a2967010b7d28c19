//! Latest-value slot
//!
//! The only state shared between a receiver task and the consumer. Writers
//! replace the whole value, readers clone an `Arc`; nobody ever sees a
//! partially written frame and nothing queues up behind a slow reader.

use std::sync::Arc;

use parking_lot::Mutex;

/// Single-value mailbox with a publish counter
#[derive(Debug)]
pub struct LatestSlot<T> {
    inner: Mutex<SlotState<T>>,
}

#[derive(Debug)]
struct SlotState<T> {
    sequence: u64,
    value: Option<Arc<T>>,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        LatestSlot {
            inner: Mutex::new(SlotState {
                sequence: 0,
                value: None,
            }),
        }
    }

    /// Publish a new value, replacing any unread one. Returns its sequence.
    pub fn store(&self, value: T) -> u64 {
        let value = Arc::new(value);
        let mut state = self.inner.lock();
        state.sequence += 1;
        state.value = Some(value);
        state.sequence
    }

    /// Most recent value, if any was ever published
    pub fn latest(&self) -> Option<Arc<T>> {
        self.inner.lock().value.clone()
    }

    /// Most recent value with its sequence number
    pub fn latest_with_sequence(&self) -> Option<(u64, Arc<T>)> {
        let state = self.inner.lock();
        state.value.clone().map(|v| (state.sequence, v))
    }

    /// Value published after `seen`, if any
    pub fn newer_than(&self, seen: u64) -> Option<(u64, Arc<T>)> {
        let state = self.inner.lock();
        if state.sequence > seen {
            state.value.clone().map(|v| (state.sequence, v))
        } else {
            None
        }
    }

    /// Number of values published so far
    pub fn sequence(&self) -> u64 {
        self.inner.lock().sequence
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_value_wins() {
        let slot = LatestSlot::new();
        assert!(slot.latest().is_none());
        assert_eq!(slot.store(1), 1);
        assert_eq!(slot.store(2), 2);
        assert_eq!(slot.store(3), 3);
        assert_eq!(*slot.latest().unwrap(), 3);
        assert_eq!(slot.sequence(), 3);
    }

    #[test]
    fn test_newer_than() {
        let slot = LatestSlot::new();
        slot.store("a");
        let (seq, v) = slot.newer_than(0).unwrap();
        assert_eq!((seq, *v), (1, "a"));
        assert!(slot.newer_than(seq).is_none());
        slot.store("b");
        assert_eq!(*slot.newer_than(seq).unwrap().1, "b");
    }

    #[test]
    fn test_concurrent_writers_and_reader() {
        let slot = Arc::new(LatestSlot::new());
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let slot = Arc::clone(&slot);
                std::thread::spawn(move || {
                    for i in 0..1000u64 {
                        slot.store((w, i, i * 2));
                    }
                })
            })
            .collect();

        for _ in 0..1000 {
            if let Some(v) = slot.latest() {
                // A value is always whole
                assert_eq!(v.2, v.1 * 2);
            }
        }
        for w in writers {
            w.join().unwrap();
        }
        assert_eq!(slot.sequence(), 4000);
    }
}
