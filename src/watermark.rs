//! Consumer-side activity ordering bookkeeping
//!
//! Index-writer workers run independently, so activities can complete out of
//! order. A consumer that advances optimistically past missing ids must
//! remember them explicitly; completion time proves nothing about order.
//! [`ActivityWatermark`] keeps the highest observed id plus the sorted set of
//! lower ids not yet applied, and derives the contiguous watermark from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::ids::ActivityId;

/// Low watermark plus explicit pending set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityWatermark {
    /// Highest id ever observed or applied
    last_observed: ActivityId,

    /// Ids at or below `last_observed` not yet applied; includes ids the
    /// consumer skipped past without ever seeing
    pending: BTreeSet<ActivityId>,
}

impl ActivityWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a known position, treating everything at or below `last`
    /// as already applied (a worker seeding from `last_activity_id`)
    pub fn seeded(last: ActivityId) -> Self {
        Self {
            last_observed: last,
            pending: BTreeSet::new(),
        }
    }

    /// Record that `id` has been claimed for execution
    ///
    /// Ids between the previous high mark and `id` were skipped and become
    /// pending alongside `id` itself.
    pub fn observe(&mut self, id: ActivityId) {
        if id <= self.last_observed {
            return;
        }
        for skipped in (self.last_observed.0 + 1)..=id.0 {
            self.pending.insert(ActivityId(skipped));
        }
        self.last_observed = id;
    }

    /// Record that `id` has been fully applied to the index
    pub fn applied(&mut self, id: ActivityId) {
        if id > self.last_observed {
            // Applied without a prior observe; the skipped range is pending
            for skipped in (self.last_observed.0 + 1)..id.0 {
                self.pending.insert(ActivityId(skipped));
            }
            self.last_observed = id;
            return;
        }
        self.pending.remove(&id);
    }

    /// Highest id with every id at or below it applied
    pub fn watermark(&self) -> ActivityId {
        match self.pending.iter().next() {
            Some(lowest_pending) => ActivityId(lowest_pending.0 - 1),
            None => self.last_observed,
        }
    }

    /// Ids below the high mark still waiting to be applied, sorted
    ///
    /// Feed these to `claim_activity_gaps` to execute stragglers.
    pub fn gaps(&self) -> Vec<ActivityId> {
        self.pending.iter().copied().collect()
    }

    pub fn has_gaps(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Serializable position snapshot for persisting into the index
    pub fn status(&self) -> ActivityStatus {
        ActivityStatus {
            last_activity_id: self.last_observed.0,
            gaps: self.pending.iter().map(|id| id.0).collect(),
        }
    }

    /// Rebuild from a persisted position snapshot
    ///
    /// Id zero is never assigned, so a zero in the persisted gaps is a
    /// corrupt entry and is dropped.
    pub fn from_status(status: &ActivityStatus) -> Self {
        Self {
            last_observed: ActivityId(status.last_activity_id),
            pending: status
                .gaps
                .iter()
                .filter(|id| **id > 0)
                .map(|id| ActivityId(*id))
                .collect(),
        }
    }
}

/// Persistable consumer position: high mark plus explicit gaps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityStatus {
    pub last_activity_id: u64,
    pub gaps: Vec<u64>,
}
