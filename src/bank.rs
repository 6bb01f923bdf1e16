// Surface-crossing particle bank
//
// Fixed-capacity shared container that particle histories append crossing
// records into from many threads at once. Producers reserve a slot with an
// atomic counter increment and then publish into that slot only, so the
// append path never takes a lock and a full bank costs one fetch_add per
// dropped record.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::source_site::SourceSite;

/// Result of a single append attempt. Dropping past capacity is expected
/// behavior, not an error: the bank keeps the first `capacity` crossings
/// and silently discards the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Stored,
    Dropped,
}

/// Fixed-capacity, concurrently-writable bank of surface-crossing records.
///
/// The backing store is allocated once at construction and never resized.
/// During collection every worker holds a shared reference and calls
/// [`try_append`](SurfaceBank::try_append); when all workers have stopped,
/// the owner calls [`finalize`](SurfaceBank::finalize), which consumes the
/// bank. Because `finalize` takes `self` by value, the compiler rejects any
/// program that could still append afterwards.
pub struct SurfaceBank {
    slots: Box<[OnceLock<SourceSite>]>,
    attempts: AtomicUsize,
}

impl SurfaceBank {
    /// Create a bank holding at most `capacity` records.
    ///
    /// # Panics
    /// Panics if `capacity` is zero; a zero-capacity bank is a
    /// configuration error, not a runtime condition.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "surface bank capacity must be positive");
        let slots = (0..capacity).map(|_| OnceLock::new()).collect();
        Self {
            slots,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Append a crossing record if a slot is free.
    ///
    /// Thread-safe and non-blocking: the atomic increment reserves a
    /// unique slot index, and only the reserving thread ever writes that
    /// slot. Once the counter passes capacity every further attempt is
    /// reported as [`AppendOutcome::Dropped`] without touching the store.
    pub fn try_append(&self, site: SourceSite) -> AppendOutcome {
        let index = self.attempts.fetch_add(1, Ordering::Relaxed);
        if index >= self.slots.len() {
            return AppendOutcome::Dropped;
        }
        // The slot was reserved by the fetch_add above, so this set cannot
        // race with another producer.
        if self.slots[index].set(site).is_err() {
            debug_assert!(false, "surface bank slot {} written twice", index);
        }
        AppendOutcome::Stored
    }

    /// Total number of append attempts so far, stored or dropped.
    /// Together with [`len`](SurfaceBank::len) this is the only
    /// observability of capacity overflow.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Number of records that will survive finalization
    pub fn len(&self) -> usize {
        self.attempts().min(self.slots.len())
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.load(Ordering::Relaxed) == 0
    }

    /// Close the bank and return its records, exactly
    /// `min(attempts, capacity)` of them with no gaps.
    ///
    /// Consuming `self` requires that no shared references remain, which
    /// is how the type system guarantees all producers have stopped.
    pub fn finalize(self) -> Vec<SourceSite> {
        let stored = self.attempts.into_inner().min(self.slots.len());
        self.slots
            .into_vec()
            .into_iter()
            .take(stored)
            .map(|slot| {
                slot.into_inner()
                    .expect("reserved surface bank slot holds no record")
            })
            .collect()
    }
}
