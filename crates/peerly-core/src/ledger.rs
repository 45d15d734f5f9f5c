//! Per-slot seat accounting
//!
//! The ledger is the only place where committed seat counts live. Each slot
//! owns an atomic counter, so reservations on one slot are serialized by a
//! compare-and-increment while reservations on other slots never wait on it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::directory::TutorDirectory;
use crate::tutor::SlotId;
use crate::{Error, Result};

#[derive(Debug)]
struct SlotCounter {
    capacity: AtomicU32,
    committed: AtomicU32,
}

/// A seat granted by [`CapacityLedger::try_reserve`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub slot_id: SlotId,
    /// Committed seats including this one
    pub committed: u32,
    pub capacity: u32,
}

/// Seat usage of one slot at the time of the query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub slot_id: SlotId,
    pub capacity: u32,
    pub committed: u32,
    pub remaining: u32,
}

#[derive(Debug, Default)]
pub struct CapacityLedger {
    slots: DashMap<SlotId, Arc<SlotCounter>>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger with every slot of the directory at zero committed seats
    pub fn from_directory(directory: &TutorDirectory, default_capacity: u32) -> Self {
        let ledger = Self::new();
        ledger.sync(directory, default_capacity);
        ledger
    }

    /// Register a slot or refresh its capacity snapshot.
    ///
    /// The committed count of an already known slot is kept, so reloading
    /// the directory never frees seats that were already sold.
    pub fn register(&self, slot_id: &SlotId, capacity: u32) {
        match self.slots.get(slot_id) {
            Some(counter) => {
                let previous = counter.capacity.swap(capacity, Ordering::AcqRel);
                if previous != capacity {
                    debug!(slot = %slot_id, previous, capacity, "slot capacity changed");
                }
            }
            None => {
                self.slots.entry(slot_id.clone()).or_insert_with(|| {
                    Arc::new(SlotCounter {
                        capacity: AtomicU32::new(capacity),
                        committed: AtomicU32::new(0),
                    })
                });
            }
        }
    }

    /// Register every slot of a directory snapshot
    pub fn sync(&self, directory: &TutorDirectory, default_capacity: u32) {
        for slot in directory.slots() {
            self.register(&slot.id, slot.effective_capacity(default_capacity));
        }
        debug!(slots = self.slots.len(), "capacity ledger synced");
    }

    /// Take one seat if the slot still has one.
    ///
    /// The count is re-read and incremented in a single atomic step; when
    /// several callers race for the last seat exactly one of them wins and
    /// the others get [`Error::SlotFull`].
    pub fn try_reserve(&self, slot_id: &SlotId) -> Result<Reservation> {
        let counter = self.counter(slot_id)?;
        let mut capacity = 0;
        let outcome = counter
            .committed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |committed| {
                capacity = counter.capacity.load(Ordering::Acquire);
                (committed < capacity).then_some(committed + 1)
            });

        match outcome {
            Ok(previous) => Ok(Reservation {
                slot_id: slot_id.clone(),
                committed: previous + 1,
                capacity,
            }),
            Err(committed) => {
                warn!(slot = %slot_id, committed, capacity, "reservation rejected, slot full");
                Err(Error::SlotFull {
                    slot_id: slot_id.clone(),
                    capacity,
                })
            }
        }
    }

    /// Give back one seat after a committed booking was cancelled or declined.
    ///
    /// Returns the committed count after the release. Releasing a slot with
    /// no committed seats is logged and leaves the count at zero.
    pub fn release(&self, slot_id: &SlotId) -> Result<u32> {
        let counter = self.counter(slot_id)?;
        match counter
            .committed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |committed| {
                committed.checked_sub(1)
            }) {
            Ok(previous) => Ok(previous - 1),
            Err(_) => {
                warn!(slot = %slot_id, "release on a slot with no committed seats");
                Ok(0)
            }
        }
    }

    pub fn availability(&self, slot_id: &SlotId) -> Result<Availability> {
        let counter = self.counter(slot_id)?;
        let capacity = counter.capacity.load(Ordering::Acquire);
        let committed = counter.committed.load(Ordering::Acquire);
        Ok(Availability {
            slot_id: slot_id.clone(),
            capacity,
            committed,
            remaining: capacity.saturating_sub(committed),
        })
    }

    pub fn committed(&self, slot_id: &SlotId) -> Option<u32> {
        self.slots
            .get(slot_id)
            .map(|counter| counter.committed.load(Ordering::Acquire))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // Clone the counter out so the map shard is not held during the update
    fn counter(&self, slot_id: &SlotId) -> Result<Arc<SlotCounter>> {
        self.slots
            .get(slot_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::SlotNotFound(slot_id.clone()))
    }
}
