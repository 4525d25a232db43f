//! Indexing activity log surface
//!
//! A durable, strictly ordered append log decoupling index maintenance from
//! the content-commit path. Committers append; independent leased workers
//! claim and execute. Claims atomically transition returned records to
//! Running, so the lease window is the only mutual exclusion between
//! workers - lease expiry is also the sole recovery path for a crashed one.

use std::time::Duration;

use crate::error::Result;
use crate::model::activity::{ActivityFactory, NewActivity, RunningState};
use crate::model::ids::ActivityId;

use super::DataStore;

impl DataStore {
    /// Append an activity; the backend assigns the next monotonic id
    pub async fn append_activity(&self, activity: NewActivity) -> Result<ActivityId> {
        self.ensure_enabled()?;
        let id = self.backend().append_activity(activity).await?;
        tracing::debug!(activity_id = %id, "indexing activity appended");
        Ok(id)
    }

    /// Claim executable activities in `from..=to`, at most `max_count`
    ///
    /// Records Running inside an unexpired lease are skipped; past the
    /// configured lease they count as abandoned and are reclaimed. With
    /// `include_unprocessed` the returned records are stamped as belonging
    /// to the system-start recovery pass. Records the factory declines are
    /// dropped.
    pub async fn claim_activities<F: ActivityFactory>(
        &self,
        from: ActivityId,
        to: ActivityId,
        max_count: usize,
        include_unprocessed: bool,
        factory: &F,
    ) -> Result<Vec<F::Output>> {
        self.ensure_enabled()?;
        let records = self
            .backend()
            .load_activities(from, to, max_count, self.config().activity_lease)
            .await?;
        Ok(Self::build(records, include_unprocessed, factory))
    }

    /// Re-fetch specific ids a consumer knows are missing below its
    /// watermark
    ///
    /// Done ids and ids Running inside an unexpired lease are filtered out;
    /// ids that never existed are silently absent. This is how a consumer
    /// that advanced optimistically still executes stragglers.
    pub async fn claim_activity_gaps<F: ActivityFactory>(
        &self,
        gaps: Vec<ActivityId>,
        include_unprocessed: bool,
        factory: &F,
    ) -> Result<Vec<F::Output>> {
        self.ensure_enabled()?;
        if gaps.is_empty() {
            return Ok(Vec::new());
        }
        let records = self
            .backend()
            .load_activity_gaps(gaps, self.config().activity_lease)
            .await?;
        Ok(Self::build(records, include_unprocessed, factory))
    }

    /// Claim ready activities for a worker with no prior watermark
    ///
    /// Returns the claimed activities plus the ids still legitimately
    /// waiting: Running inside `running_timeout`, owned by another worker.
    /// Waiting ids are "wait for these"; anything else missing is a gap.
    /// Everything returned is stamped unprocessed - this is the recovery
    /// path after a restart.
    pub async fn claim_executable_activities<F: ActivityFactory>(
        &self,
        factory: &F,
        max_count: usize,
        running_timeout: Duration,
    ) -> Result<(Vec<F::Output>, Vec<ActivityId>)> {
        self.ensure_enabled()?;
        let result = self
            .backend()
            .load_executable_activities(max_count, running_timeout)
            .await?;
        if !result.waiting.is_empty() {
            tracing::debug!(
                executable = result.executable.len(),
                waiting = result.waiting.len(),
                "executable claim found activities owned by other workers"
            );
        }
        Ok((Self::build(result.executable, true, factory), result.waiting))
    }

    /// Transition an activity's running state
    ///
    /// The backend enforces the lease window, so two workers never run one
    /// activity concurrently inside it. Unknown ids are ignored.
    pub async fn set_activity_state(&self, id: ActivityId, state: RunningState) -> Result<()> {
        self.ensure_enabled()?;
        self.backend().set_activity_state(id, state).await?;
        Ok(())
    }

    /// Extend the lease of ids a worker is still legitimately waiting on,
    /// preventing false reclamation by others
    pub async fn refresh_activity_lease(&self, ids: Vec<ActivityId>) -> Result<()> {
        self.ensure_enabled()?;
        if ids.is_empty() {
            return Ok(());
        }
        self.backend().refresh_activity_lease(ids).await?;
        Ok(())
    }

    /// Compact Done activities every consumer has passed; returns the count
    /// removed
    pub async fn delete_finished_activities(&self) -> Result<u64> {
        self.ensure_enabled()?;
        let removed = self.backend().delete_finished_activities().await?;
        if removed > 0 {
            tracing::info!(removed, "compacted finished indexing activities");
        }
        Ok(removed)
    }

    /// Full reset of the log (full reindex)
    pub async fn delete_all_activities(&self) -> Result<()> {
        self.ensure_enabled()?;
        self.backend().delete_all_activities().await?;
        tracing::info!("indexing activity log reset");
        Ok(())
    }

    /// Highest id ever assigned, zero for an empty log; seeds a fresh
    /// consumer's watermark
    pub async fn last_activity_id(&self) -> Result<ActivityId> {
        self.ensure_enabled()?;
        Ok(self.backend().last_activity_id().await?)
    }

    fn build<F: ActivityFactory>(
        records: Vec<crate::model::activity::ActivityRecord>,
        include_unprocessed: bool,
        factory: &F,
    ) -> Vec<F::Output> {
        records
            .into_iter()
            .map(|mut record| {
                record.unprocessed = include_unprocessed;
                record
            })
            .filter_map(|record| factory.from_record(record))
            .collect()
    }
}
