//! Contact phases and the fixed-capacity look-ahead ring.

use heapless::Deque;
use tracing::debug;

use stride_common::consts::CONTACT_PHASE_CAPACITY;
use stride_common::walking::footstep::{Pose, SupportPolygon};
use stride_common::walking::side::{FeetInContact, SideMap};

/// Interval of constant foot contact.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactPhase {
    pub feet_in_contact: FeetInContact,
    /// Absolute start time [s].
    pub start_time: f64,
    /// Absolute end time [s]; `f64::INFINITY` while the phase is open.
    pub end_time: f64,
    /// Sole pose of each contacting foot at phase start.
    pub sole_poses: SideMap<Option<Pose>>,
    /// Convex hull of the contacting soles, world ground plane.
    pub support_region: SupportPolygon,
}

impl ContactPhase {
    /// Open phase starting at `start_time`.
    pub fn open(
        feet_in_contact: FeetInContact,
        start_time: f64,
        sole_poses: SideMap<Option<Pose>>,
        support_region: SupportPolygon,
    ) -> Self {
        Self {
            feet_in_contact,
            start_time,
            end_time: f64::INFINITY,
            sole_poses,
            support_region,
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.end_time == f64::INFINITY
    }

    /// Phase length [s]; infinite while open.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// True if `time` lies in `[start_time, end_time)`.
    #[inline]
    pub fn contains_time(&self, time: f64) -> bool {
        time >= self.start_time && time < self.end_time
    }
}

/// Ring of upcoming contact phases, oldest first.
///
/// Pushing onto a full ring evicts the strictly-oldest phase.
#[derive(Debug, Clone)]
pub struct ContactPhaseRing {
    phases: Deque<ContactPhase, CONTACT_PHASE_CAPACITY>,
}

impl Default for ContactPhaseRing {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactPhaseRing {
    pub const CAPACITY: usize = CONTACT_PHASE_CAPACITY;

    pub const fn new() -> Self {
        Self {
            phases: Deque::new(),
        }
    }

    pub fn clear(&mut self) {
        self.phases.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.phases.is_full()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContactPhase> {
        self.phases.iter()
    }

    /// Phase at `index`, oldest first.
    pub fn get(&self, index: usize) -> Option<&ContactPhase> {
        self.phases.iter().nth(index)
    }

    pub fn first(&self) -> Option<&ContactPhase> {
        self.phases.front()
    }

    pub fn last(&self) -> Option<&ContactPhase> {
        self.phases.back()
    }

    pub(crate) fn last_mut(&mut self) -> Option<&mut ContactPhase> {
        self.phases.back_mut()
    }

    /// Append a phase, evicting the oldest if the ring is full.
    ///
    /// Returns the evicted phase, if any.
    pub fn push(&mut self, phase: ContactPhase) -> Option<ContactPhase> {
        let evicted = if self.phases.is_full() {
            let oldest = self.phases.pop_front();
            if let Some(ref old) = oldest {
                debug!(
                    start = old.start_time,
                    end = old.end_time,
                    "contact phase ring full, evicting oldest phase"
                );
            }
            oldest
        } else {
            None
        };
        // A slot is free: either the ring was not full or one was just popped.
        let _ = self.phases.push_back(phase);
        evicted
    }

    /// Drop phases that ended at or before `time`. Returns how many were dropped.
    pub fn retire_before(&mut self, time: f64) -> usize {
        let mut retired = 0;
        while let Some(front) = self.phases.front() {
            if front.end_time > time {
                break;
            }
            self.phases.pop_front();
            retired += 1;
        }
        retired
    }

    /// Phase active at `time`, if scheduled.
    pub fn phase_at(&self, time: f64) -> Option<&ContactPhase> {
        self.phases.iter().find(|p| p.contains_time(time))
    }

    /// Sorted, contiguous and only the last phase open.
    pub fn is_well_formed(&self) -> bool {
        let n = self.phases.len();
        let mut prev_end: Option<f64> = None;
        for (i, phase) in self.phases.iter().enumerate() {
            if let Some(end) = prev_end {
                if phase.start_time != end {
                    return false;
                }
            }
            let last = i + 1 == n;
            if phase.is_open() != last || phase.end_time < phase.start_time {
                return false;
            }
            prev_end = Some(phase.end_time);
        }
        true
    }
}
