//! Single-slot in-flight guard
//!
//! Admits one task at a time. A second caller is turned away instead of
//! queued, and the slot frees itself when the guard drops, including on
//! early return or unwinding.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct InFlightSlot {
    busy: AtomicBool,
}

impl InFlightSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, None if a task already holds it
    pub fn try_acquire(&self) -> Option<SlotGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotGuard { slot: self })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Holds the slot until dropped
#[derive(Debug)]
pub struct SlotGuard<'a> {
    slot: &'a InFlightSlot,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}

/// Counts tasks that may overlap, such as track analyses
#[derive(Debug, Default)]
pub struct ActivityCounter {
    active: AtomicUsize,
}

impl ActivityCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running task until the guard drops
    pub fn enter(&self) -> ActivityGuard<'_> {
        self.active.fetch_add(1, Ordering::AcqRel);
        ActivityGuard { counter: self }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire) > 0
    }
}

#[derive(Debug)]
pub struct ActivityGuard<'a> {
    counter: &'a ActivityCounter,
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.counter.active.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused() {
        let slot = InFlightSlot::new();
        let guard = slot.try_acquire();
        assert!(guard.is_some());
        assert!(slot.is_busy());
        assert!(slot.try_acquire().is_none());

        drop(guard);
        assert!(!slot.is_busy());
        assert!(slot.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_unwind() {
        let slot = InFlightSlot::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = slot.try_acquire();
            panic!("analysis blew up");
        }));
        assert!(result.is_err());
        assert!(!slot.is_busy());
    }

    #[test]
    fn test_activity_counter_tracks_overlapping_tasks() {
        let counter = ActivityCounter::new();
        assert!(!counter.is_active());

        let first = counter.enter();
        let second = counter.enter();
        drop(first);
        assert!(counter.is_active());
        drop(second);
        assert!(!counter.is_active());
    }
}
