//! Best-effort replication of local changes to the Remote Store.
//!
//! A change is pushed once, in the background, after its local commit.
//! Pushes run one at a time in the order they were queued.
//! Failures are logged and published as [`PushOutcome`]s; they are never
//! retried and never roll back the local write.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tasksync_engine::{encode_task, CategoryRecord, RemotePath, Task, TaskId};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::RemoteResult;
use crate::remote::RemoteStore;

const OUTCOME_CAPACITY: usize = 64;

/// One local change to mirror remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Write the task leaf at `tasks/{category}/{id}`
    UpsertTask(Task),
    /// Remove the task leaf at `tasks/{category}/{id}`
    RemoveTask { category: String, id: TaskId },
    /// Write the record at `categories/{name}`
    CreateCategory(CategoryRecord),
    /// Remove the record at `categories/{name}`
    RemoveCategory(String),
}

impl Change {
    /// Remote path the change targets.
    pub fn path(&self) -> tasksync_engine::error::Result<RemotePath> {
        match self {
            Change::UpsertTask(task) => RemotePath::task(&task.category, &task.id),
            Change::RemoveTask { category, id } => RemotePath::task(category, id),
            Change::CreateCategory(record) => RemotePath::category(&record.name),
            Change::RemoveCategory(name) => RemotePath::category(name),
        }
    }

    /// Value to write, `None` for removals.
    pub fn value(&self) -> Option<Value> {
        match self {
            Change::UpsertTask(task) => Some(encode_task(task)),
            Change::CreateCategory(record) => Some(record.to_value()),
            Change::RemoveTask { .. } | Change::RemoveCategory(_) => None,
        }
    }

    /// Push this change to `remote` once.
    pub async fn apply(&self, remote: &dyn RemoteStore) -> RemoteResult<()> {
        let path = self.path()?;
        match self.value() {
            Some(value) => remote.write(&path, value).await,
            None => remote.remove(&path).await,
        }
    }
}

/// Result of one push attempt.
#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub change: Change,
    pub result: RemoteResult<()>,
}

impl PushOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Mirrors local changes to a remote.
#[async_trait]
pub trait Replicator: Send + Sync {
    /// Queue one push. Returns immediately.
    fn replicate(&self, change: Change);

    /// Wait until every queued push has finished.
    async fn flush(&self);

    /// Feed of push outcomes.
    fn outcomes(&self) -> broadcast::Receiver<PushOutcome>;
}

/// Work for the push worker.
enum Job {
    Push(Change),
    Flush(oneshot::Sender<()>),
}

/// Fire-and-forget replicator: one background worker, queue order, no retry.
pub struct BestEffortReplicator {
    queue: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
    outcomes: broadcast::Sender<PushOutcome>,
}

impl BestEffortReplicator {
    /// Start the push worker. Must be called inside a Tokio runtime.
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        let (queue, jobs) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let (outcomes, _) = broadcast::channel(OUTCOME_CAPACITY);

        tokio::spawn(run_pushes(
            remote,
            jobs,
            Arc::clone(&pending),
            outcomes.clone(),
        ));

        Self {
            queue,
            pending,
            outcomes,
        }
    }

    /// Number of queued pushes that have not finished yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

async fn run_pushes(
    remote: Arc<dyn RemoteStore>,
    mut jobs: mpsc::UnboundedReceiver<Job>,
    pending: Arc<AtomicUsize>,
    outcomes: broadcast::Sender<PushOutcome>,
) {
    while let Some(job) = jobs.recv().await {
        let change = match job {
            Job::Push(change) => change,
            Job::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };

        let result = change.apply(remote.as_ref()).await;
        match (&result, change.path()) {
            (Ok(()), Ok(path)) => tracing::debug!(path = %path, "Pushed change"),
            (Ok(()), Err(_)) => {}
            (Err(e), Ok(path)) => {
                tracing::warn!(path = %path, error = %e, "Push failed, keeping local copy")
            }
            (Err(e), Err(_)) => tracing::warn!(error = %e, "Push skipped"),
        }

        pending.fetch_sub(1, Ordering::SeqCst);
        let _ = outcomes.send(PushOutcome { change, result });
    }
    tracing::debug!("Push worker stopped");
}

#[async_trait]
impl Replicator for BestEffortReplicator {
    fn replicate(&self, change: Change) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::error::SendError(job)) = self.queue.send(Job::Push(change)) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            if let Job::Push(change) = job {
                tracing::warn!(?change, "Push worker gone, change stays local");
            }
        }
    }

    async fn flush(&self) {
        let (done, finished) = oneshot::channel();
        if self.queue.send(Job::Flush(done)).is_ok() {
            let _ = finished.await;
        }
    }

    fn outcomes(&self) -> broadcast::Receiver<PushOutcome> {
        self.outcomes.subscribe()
    }
}

/// Replicator for running without a remote. Drops every change.
pub struct NoopReplicator {
    outcomes: broadcast::Sender<PushOutcome>,
}

impl NoopReplicator {
    pub fn new() -> Self {
        let (outcomes, _) = broadcast::channel(1);
        Self { outcomes }
    }
}

impl Default for NoopReplicator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Replicator for NoopReplicator {
    fn replicate(&self, change: Change) {
        tracing::trace!(?change, "No remote configured, change stays local");
    }

    async fn flush(&self) {}

    fn outcomes(&self) -> broadcast::Receiver<PushOutcome> {
        self.outcomes.subscribe()
    }
}
