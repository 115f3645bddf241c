//! Lock-free context exchange between two periodic tasks.
//!
//! Single-producer/single-consumer triple buffer. The publisher owns the
//! back slot, the subscriber owns the front slot, and the middle slot is
//! exchanged through one atomic byte. Neither side ever blocks or waits.
//! Data crosses only by deep copy (`Clone::clone_from`) into and out of the
//! slots; no reference is shared between the two tasks.
//!
//! ## Change detection
//!
//! Every publish stamps the slot with a monotonically increasing sequence
//! number (first publish = 1; 0 = never published). The subscriber counts
//! consecutive reads without a new sequence, like the segment heartbeat
//! check, and reports `Stale` once the count reaches the threshold.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use static_assertions::const_assert_eq;
use tracing::warn;

/// Bit set in `middle` when it holds a slot the subscriber has not taken.
const DIRTY: u8 = 0b100;
const INDEX_MASK: u8 = 0b011;

const_assert_eq!(DIRTY & INDEX_MASK, 0);

struct Slot<T> {
    sequence: u64,
    value: T,
}

/// Shared storage behind a publisher/subscriber pair.
pub struct ContextExchange<T> {
    slots: [UnsafeCell<Slot<T>>; 3],
    middle: AtomicU8,
}

// SAFETY: each slot is accessed by at most one side at a time. Slot
// ownership moves only through the `middle` swap (AcqRel), which orders the
// writer's slot writes before the reader's slot reads.
unsafe impl<T: Send> Sync for ContextExchange<T> {}

impl<T: Clone + Send> ContextExchange<T> {
    /// Create a connected pair. All three slots start as copies of
    /// `initial` with sequence 0.
    pub fn channel(initial: T, stale_threshold: u32) -> (ContextPublisher<T>, ContextSubscriber<T>) {
        let make = |value: T| UnsafeCell::new(Slot { sequence: 0, value });
        let shared = Arc::new(Self {
            slots: [make(initial.clone()), make(initial.clone()), make(initial)],
            middle: AtomicU8::new(1),
        });
        (
            ContextPublisher {
                shared: Arc::clone(&shared),
                back: 2,
                sequence: 0,
            },
            ContextSubscriber {
                shared,
                front: 0,
                last_sequence: 0,
                stale_count: 0,
                stale_threshold: stale_threshold.max(1),
            },
        )
    }
}

/// Writing half, owned by the producing task.
pub struct ContextPublisher<T> {
    shared: Arc<ContextExchange<T>>,
    back: u8,
    sequence: u64,
}

impl<T: Clone + Send> ContextPublisher<T> {
    /// Deep-copy `value` into the back slot and make it the latest.
    /// Returns the sequence number assigned to this publish.
    pub fn publish(&mut self, value: &T) -> u64 {
        self.sequence += 1;
        // SAFETY: `back` is owned exclusively by this publisher until the
        // swap below hands it over.
        let slot = unsafe { &mut *self.shared.slots[self.back as usize].get() };
        slot.value.clone_from(value);
        slot.sequence = self.sequence;

        let previous = self.shared.middle.swap(self.back | DIRTY, Ordering::AcqRel);
        self.back = previous & INDEX_MASK;
        self.sequence
    }

    /// Sequence of the last publish (0 if none).
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Outcome of one subscriber read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFreshness {
    /// Nothing was ever published; the output buffer is untouched.
    NoData,
    /// A new publish. `skipped` publishes were overwritten before this read.
    Fresh { sequence: u64, skipped: u64 },
    /// Same publish as the previous read, below the stale threshold.
    Repeated { missed: u32 },
    /// Same publish for `missed` ≥ threshold consecutive reads.
    Stale { missed: u32 },
}

impl ContextFreshness {
    #[inline]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }

    /// True whenever the output buffer holds a published value.
    #[inline]
    pub const fn has_data(&self) -> bool {
        !matches!(self, Self::NoData)
    }
}

/// Reading half, owned by the consuming task.
pub struct ContextSubscriber<T> {
    shared: Arc<ContextExchange<T>>,
    front: u8,
    last_sequence: u64,
    stale_count: u32,
    stale_threshold: u32,
}

impl<T: Clone + Send> ContextSubscriber<T> {
    /// Deep-copy the latest published value into `out`.
    ///
    /// Repeated reads of one publish still copy, so `out` always mirrors
    /// the latest snapshot after any call that returns data.
    pub fn read_into(&mut self, out: &mut T) -> ContextFreshness {
        if self.shared.middle.load(Ordering::Relaxed) & DIRTY != 0 {
            let previous = self.shared.middle.swap(self.front, Ordering::AcqRel);
            self.front = previous & INDEX_MASK;
        }

        // SAFETY: `front` is owned exclusively by this subscriber.
        let slot = unsafe { &*self.shared.slots[self.front as usize].get() };
        if slot.sequence == 0 {
            return ContextFreshness::NoData;
        }
        out.clone_from(&slot.value);

        if slot.sequence > self.last_sequence {
            let skipped = slot.sequence - self.last_sequence - 1;
            self.last_sequence = slot.sequence;
            self.stale_count = 0;
            return ContextFreshness::Fresh {
                sequence: slot.sequence,
                skipped,
            };
        }

        self.stale_count = self.stale_count.saturating_add(1);
        if self.stale_count >= self.stale_threshold {
            if self.stale_count == self.stale_threshold {
                warn!(
                    sequence = self.last_sequence,
                    missed = self.stale_count,
                    "context stale: no new publish"
                );
            }
            ContextFreshness::Stale {
                missed: self.stale_count,
            }
        } else {
            ContextFreshness::Repeated {
                missed: self.stale_count,
            }
        }
    }

    /// Consecutive reads without a new publish.
    #[inline]
    pub fn stale_count(&self) -> u32 {
        self.stale_count
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
