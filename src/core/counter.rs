// src/core/counter.rs

//! The generation-counted cell shared between the leader elector, the peer
//! notifier, and the `/notify` HTTP handler.
//!
//! A single instance mutates `value`/`meta` only when `generation` advances,
//! which gives every reader a consistent `(value, generation, meta)` triple
//! with no torn reads.

use parking_lot::RwLock;

/// A snapshot of the shared counter at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub value: i64,
    pub generation: u64,
    pub meta: String,
}

struct Inner {
    value: i64,
    generation: u64,
    meta: String,
}

/// Single-writer-many-reader cell protected by a reader-writer lock.
///
/// `generation` is monotonically non-decreasing on any single instance;
/// `value` and `meta` change only when `generation` advances.
pub struct SharedCounter {
    inner: RwLock<Inner>,
}

impl SharedCounter {
    /// Created at process start with `value = -1`, `generation = 0`, `meta = ""`.
    ///
    /// `-1` is less than any possible leader-election octet sum, so the
    /// first election always triggers adoption (spec.md §4.5, §9).
    pub fn new() -> Self {
        SharedCounter {
            inner: RwLock::new(Inner {
                value: -1,
                generation: 0,
                meta: String::new(),
            }),
        }
    }

    /// Never blocks writers indefinitely; returns a consistent triple.
    pub fn get(&self) -> CounterSnapshot {
        let guard = self.inner.read();
        CounterSnapshot {
            value: guard.value,
            generation: guard.generation,
            meta: guard.meta.clone(),
        }
    }

    /// Atomically assigns `value`, `meta`, and bumps `generation`.
    pub fn set(&self, new_value: i64, meta: impl Into<String>) {
        let mut guard = self.inner.write();
        guard.value = new_value;
        guard.meta = meta.into();
        guard.generation += 1;
    }

    /// Adopts a remote observation iff it is strictly fresher.
    ///
    /// Equality does *not* update; only strict `>` does, so a node only
    /// ever accepts strictly fresher observations.
    pub fn notify(&self, remote_value: i64, remote_generation: u64, remote_meta: &str) -> bool {
        let mut guard = self.inner.write();
        if remote_generation > guard.generation {
            guard.value = remote_value;
            guard.generation = remote_generation;
            guard.meta = remote_meta.to_string();
            true
        } else {
            false
        }
    }
}

impl Default for SharedCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_minus_one_with_generation_zero() {
        let counter = SharedCounter::new();
        let snap = counter.get();
        assert_eq!(snap.value, -1);
        assert_eq!(snap.generation, 0);
        assert_eq!(snap.meta, "");
    }

    #[test]
    fn set_bumps_generation_monotonically() {
        let counter = SharedCounter::new();
        counter.set(10, "a");
        counter.set(20, "b");
        let snap = counter.get();
        assert_eq!(snap.value, 20);
        assert_eq!(snap.meta, "b");
        assert_eq!(snap.generation, 2);
    }

    #[test]
    fn notify_adopts_only_strictly_fresher_generation() {
        let counter = SharedCounter::new();
        counter.set(30, "A"); // generation 1

        // A strictly fresher observation at the same generation is rejected.
        assert!(!counter.notify(30, 1, "A"));

        // A genuinely fresher generation is adopted (S5).
        assert!(counter.notify(31, 2, "A"));
        let snap = counter.get();
        assert_eq!((snap.value, snap.generation, snap.meta.as_str()), (31, 2, "A"));

        // A stale notify at a lower generation never mutates (S5).
        assert!(!counter.notify(15, 1, "old"));
        let snap = counter.get();
        assert_eq!((snap.value, snap.generation, snap.meta.as_str()), (31, 2, "A"));
    }

    #[test]
    fn equal_generation_does_not_update() {
        let counter = SharedCounter::new();
        counter.set(5, "x");
        assert!(!counter.notify(99, 1, "y"));
        assert_eq!(counter.get().value, 5);
    }
}
