//! Indexing-activity operations of the in-memory backend
//!
//! Claims are lease-guarded under the dataset mutex: a record claimed here
//! is atomically transitioned to Running with a fresh lease stamp, so no
//! other worker can claim it until the lease expires.

use chrono::Utc;
use std::time::Duration;

use crate::error::BackendError;
use crate::model::activity::{ActivityRecord, NewActivity, RunningState};
use crate::model::ids::ActivityId;
use crate::traits::backend::ExecutableActivities;

use super::store::{Dataset, InMemoryBackend};

impl InMemoryBackend {
    pub(super) fn append_activity_impl(
        &self,
        activity: NewActivity,
    ) -> Result<ActivityId, BackendError> {
        let mut data = self.dataset()?;
        let id = data.take_activity_id();
        data.activities
            .insert(id, ActivityRecord::from_new(id, activity));
        Ok(id)
    }

    pub(super) fn load_activities_impl(
        &self,
        from: ActivityId,
        to: ActivityId,
        max_count: usize,
        lease: Duration,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        // A consumer polling past its own high mark produces an inverted
        // range; that is an empty claim, not a panic
        if from > to {
            return Ok(Vec::new());
        }
        let mut data = self.dataset()?;
        let candidates: Vec<ActivityId> = data
            .activities
            .range(from..=to)
            .filter(|(_, record)| is_claimable(record, lease))
            .map(|(id, _)| *id)
            .take(max_count)
            .collect();
        Ok(claim(&mut data, &candidates))
    }

    pub(super) fn load_activity_gaps_impl(
        &self,
        gaps: Vec<ActivityId>,
        lease: Duration,
    ) -> Result<Vec<ActivityRecord>, BackendError> {
        let mut data = self.dataset()?;
        let mut candidates: Vec<ActivityId> = gaps
            .into_iter()
            .filter(|id| {
                data.activities
                    .get(id)
                    .is_some_and(|record| is_claimable(record, lease))
            })
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        Ok(claim(&mut data, &candidates))
    }

    pub(super) fn load_executable_activities_impl(
        &self,
        max_count: usize,
        running_timeout: Duration,
    ) -> Result<ExecutableActivities, BackendError> {
        let mut data = self.dataset()?;
        let mut candidates = Vec::new();
        let mut waiting = Vec::new();
        for (id, record) in &data.activities {
            if is_claimable(record, running_timeout) {
                if candidates.len() < max_count {
                    candidates.push(*id);
                }
            } else if record.state == RunningState::Running {
                waiting.push(*id);
            }
        }
        Ok(ExecutableActivities {
            executable: claim(&mut data, &candidates),
            waiting,
        })
    }

    pub(super) fn set_activity_state_impl(
        &self,
        id: ActivityId,
        state: RunningState,
    ) -> Result<(), BackendError> {
        let mut data = self.dataset()?;
        if let Some(record) = data.activities.get_mut(&id) {
            record.state = state;
        }
        Ok(())
    }

    pub(super) fn refresh_activity_lease_impl(
        &self,
        ids: Vec<ActivityId>,
    ) -> Result<(), BackendError> {
        let mut data = self.dataset()?;
        let now = Utc::now();
        for id in ids {
            if let Some(record) = data.activities.get_mut(&id) {
                if record.state == RunningState::Running {
                    record.lock_time = Some(now);
                }
            }
        }
        Ok(())
    }

    pub(super) fn delete_finished_activities_impl(&self) -> Result<u64, BackendError> {
        let mut data = self.dataset()?;
        // Done below the lowest non-Done id is the only state proving every
        // consumer has passed an activity
        let lowest_pending = data
            .activities
            .iter()
            .find(|(_, record)| record.state != RunningState::Done)
            .map(|(id, _)| *id);
        let before = data.activities.len();
        data.activities.retain(|id, record| {
            record.state != RunningState::Done
                || lowest_pending.is_some_and(|pending| *id > pending)
        });
        Ok((before - data.activities.len()) as u64)
    }

    pub(super) fn delete_all_activities_impl(&self) -> Result<(), BackendError> {
        let mut data = self.dataset()?;
        data.activities.clear();
        data.next_activity_id = 1;
        Ok(())
    }

    pub(super) fn last_activity_id_impl(&self) -> Result<ActivityId, BackendError> {
        let data = self.dataset()?;
        Ok(ActivityId(data.next_activity_id - 1))
    }
}

/// Waiting, or Running past its lease (abandoned by a crashed worker)
fn is_claimable(record: &ActivityRecord, lease: Duration) -> bool {
    match record.state {
        RunningState::Waiting => true,
        RunningState::Done => false,
        RunningState::Running => match record.lock_time {
            Some(locked_at) => {
                let elapsed = Utc::now().signed_duration_since(locked_at);
                elapsed.num_milliseconds() > lease.as_millis() as i64
            }
            None => true,
        },
    }
}

/// Transition the candidates to Running with a fresh lease stamp
fn claim(data: &mut Dataset, ids: &[ActivityId]) -> Vec<ActivityRecord> {
    let now = Utc::now();
    let mut claimed = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(record) = data.activities.get_mut(id) {
            record.state = RunningState::Running;
            record.lock_time = Some(now);
            claimed.push(record.clone());
        }
    }
    claimed
}
