//! Reconciliation between the Local Store and the Remote Store.
//!
//! # Pull
//!
//! 1. Fetch (or receive) the remote subtree for a [`SyncScope`]
//! 2. Decode it into candidate tasks, skipping malformed leaves
//! 3. Diff candidate ids against the local snapshot
//! 4. Insert the new ones; existing local records are never touched
//!
//! # Push
//!
//! Local mutations replicate through a [`Replicator`] after they commit.
//! [`SyncReconciler::push_all`] replays the whole local collection.
//!
//! There is no conflict resolution and no delivery guarantee. Local
//! existence wins; the remote applies last-write-wins.

use std::sync::Arc;

use serde_json::Value;
use tasksync_engine::{
    is_default_category, plan_category_pull, plan_pull, wire, CategoryRecord, IdClock, RemotePath,
    SyncScope,
};
use tokio::task::JoinHandle;

use crate::error::{RemoteError, RemoteResult, StoreError, StoreResult};
use crate::local::LocalStore;
use crate::remote::RemoteStore;
use crate::replicate::{Change, Replicator};

/// Counts from one pull.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullReport {
    /// Records newly inserted locally
    pub inserted: usize,
    /// Records skipped because their id already existed
    pub already_known: usize,
    /// Remote leaves that could not be decoded
    pub malformed: usize,
    /// Set when the remote could not be read; nothing was applied
    pub remote_error: Option<RemoteError>,
}

impl PullReport {
    fn failed(err: RemoteError) -> Self {
        Self {
            remote_error: Some(err),
            ..Self::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.remote_error.is_none()
    }
}

/// Pulls remote records into the Local Store and replays local records.
#[derive(Clone)]
pub struct SyncReconciler {
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
    replicator: Arc<dyn Replicator>,
    clock: Option<Arc<IdClock>>,
}

impl SyncReconciler {
    pub fn new(
        local: LocalStore,
        remote: Arc<dyn RemoteStore>,
        replicator: Arc<dyn Replicator>,
    ) -> Self {
        Self {
            local,
            remote,
            replicator,
            clock: None,
        }
    }

    /// Advance `clock` past every pulled id.
    pub fn with_clock(mut self, clock: Arc<IdClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// One-shot pull of `scope`.
    ///
    /// Remote failures are logged and reported; store failures other than a
    /// racing duplicate insert are returned.
    pub async fn pull(&self, scope: &SyncScope) -> StoreResult<PullReport> {
        let path = match scope.path() {
            Ok(path) => path,
            Err(e) => return Ok(PullReport::failed(e.into())),
        };

        let value = match self.remote.read(&path).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Pull failed, keeping local state");
                return Ok(PullReport::failed(e));
            }
        };

        let report = self.apply_snapshot(scope, &value).await?;
        tracing::info!(
            path = %path,
            inserted = report.inserted,
            already_known = report.already_known,
            malformed = report.malformed,
            "Pull complete"
        );
        Ok(report)
    }

    /// Adopt the new records of one remote snapshot of `scope`.
    pub async fn apply_snapshot(
        &self,
        scope: &SyncScope,
        value: &Value,
    ) -> StoreResult<PullReport> {
        let decoded = scope.decode(value);
        for err in &decoded.malformed {
            tracing::warn!(error = %err, "Skipping malformed remote record");
        }

        let local = self.local.snapshot_tasks().await?;
        let plan = plan_pull(local.iter().map(|t| t.id.as_str()), decoded.tasks);

        let mut report = PullReport {
            already_known: plan.already_known + plan.duplicates,
            malformed: decoded.malformed.len(),
            ..PullReport::default()
        };

        for task in plan.inserts {
            match self.local.insert_task(&task).await {
                Ok(()) => {
                    tracing::debug!(
                        id = %task.id,
                        category = %task.category,
                        "Adopted remote task"
                    );
                    if let Some(clock) = &self.clock {
                        clock.observe(&task.id);
                    }
                    report.inserted += 1;
                }
                Err(StoreError::ConstraintViolation(_)) => report.already_known += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    /// Adopt every remote category name not known locally.
    ///
    /// Names come from `categories/*` records and from the category nodes
    /// under `tasks/*`.
    pub async fn pull_categories(&self) -> StoreResult<PullReport> {
        let (records, tasks) = match self.read_category_sources().await {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(error = %e, "Category pull failed");
                return Ok(PullReport::failed(e));
            }
        };

        let (mut names, malformed) = wire::decode_category_names(&records);
        for err in &malformed {
            tracing::warn!(error = %err, "Skipping malformed category record");
        }
        names.extend(wire::category_names_in_tasks(&tasks));

        let local = self.local.snapshot_categories().await?;
        let planned = plan_category_pull(
            local.iter().map(|c| c.name.as_str()),
            names.iter().map(String::as_str),
        );

        let mut report = PullReport {
            malformed: malformed.len(),
            already_known: names.len() - planned.len(),
            ..PullReport::default()
        };
        for category in planned {
            match self.local.insert_category(&category).await {
                Ok(()) => {
                    tracing::debug!(name = %category.name, "Adopted remote category");
                    report.inserted += 1;
                }
                Err(StoreError::ConstraintViolation(_)) => report.already_known += 1,
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    async fn read_category_sources(&self) -> RemoteResult<(Value, Value)> {
        let records = self.remote.read(&RemotePath::categories_root()).await?;
        let tasks = self.remote.read(&RemotePath::tasks_root()).await?;
        Ok((records, tasks))
    }

    /// Queue every local task and custom category for replication.
    ///
    /// Category records already on the remote are left as they are, so their
    /// `created` time survives. If the remote cannot be read, every custom
    /// category is written. Returns the number of changes queued.
    pub async fn push_all(&self) -> StoreResult<usize> {
        let tasks = self.local.snapshot_tasks().await?;
        let categories = self.local.snapshot_categories().await?;
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;

        let existing = match self.remote.read(&RemotePath::categories_root()).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read remote categories, writing all");
                Value::Null
            }
        };

        let mut queued = 0;
        for task in tasks {
            self.replicator.replicate(Change::UpsertTask(task));
            queued += 1;
        }
        for category in categories {
            if is_default_category(&category.name) {
                continue;
            }
            if existing.get(&category.name).is_some_and(|r| !r.is_null()) {
                continue;
            }
            let record = CategoryRecord::new(category.name, now);
            self.replicator.replicate(Change::CreateCategory(record));
            queued += 1;
        }

        tracing::info!(queued, "Queued full replay");
        Ok(queued)
    }

    /// Keep pulling `scope` on every remote change until the handle is dropped.
    pub async fn watch(&self, scope: SyncScope) -> RemoteResult<SyncHandle> {
        let path = scope.path()?;
        let mut subscription = self.remote.subscribe(&path).await?;
        let reconciler = self.clone();

        let task = tokio::spawn(async move {
            while let Some(value) = subscription.next().await {
                match reconciler.apply_snapshot(&scope, &value).await {
                    Ok(report) if report.inserted > 0 => {
                        tracing::info!(
                            path = %path,
                            inserted = report.inserted,
                            "Applied remote change"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "Failed to apply remote change")
                    }
                }
            }
            tracing::debug!(path = %path, "Remote subscription ended");
        });

        Ok(SyncHandle { task })
    }
}

/// A running [`SyncReconciler::watch`]. Dropping it stops the watch.
#[derive(Debug)]
pub struct SyncHandle {
    task: JoinHandle<()>,
}

impl SyncHandle {
    pub fn cancel(self) {}

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
