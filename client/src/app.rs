//! Application wiring: one explicitly opened, explicitly closed handle.

use std::sync::Arc;

use tasksync_engine::IdClock;

use crate::config::ClientConfig;
use crate::error::{RemoteError, StoreError};
use crate::local::LocalStore;
use crate::remote::{HttpRemote, RemoteStore};
use crate::replicate::{BestEffortReplicator, NoopReplicator, Replicator};
use crate::service::TaskService;
use crate::sync::SyncReconciler;

/// Errors while opening the application.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("remote setup failed: {0}")]
    Remote(#[from] RemoteError),
}

/// The opened application: Local Store, replication and sync.
pub struct TaskApp {
    local: LocalStore,
    replicator: Arc<dyn Replicator>,
    service: TaskService,
    reconciler: Option<SyncReconciler>,
}

impl TaskApp {
    /// Open the Local Store and, if a remote URL is configured, the mirror.
    pub async fn open(config: &ClientConfig) -> Result<Self, OpenError> {
        let local = LocalStore::open(&config.database_url).await?;

        let app = match &config.remote_url {
            Some(url) => {
                let remote = HttpRemote::new(url, config.remote_timeout)?;
                tracing::info!(remote = %url, "Mirroring to remote");
                Self::with_remote(local, Arc::new(remote)).await?
            }
            None => {
                tracing::info!("No remote configured, running local-only");
                let clock = seeded_clock(&local).await?;
                let replicator: Arc<dyn Replicator> = Arc::new(NoopReplicator::new());
                Self {
                    service: TaskService::new(local.clone(), Arc::clone(&replicator), clock),
                    local,
                    replicator,
                    reconciler: None,
                }
            }
        };
        Ok(app)
    }

    /// Build the application around an already opened store and any remote.
    pub async fn with_remote(
        local: LocalStore,
        remote: Arc<dyn RemoteStore>,
    ) -> Result<Self, StoreError> {
        let clock = seeded_clock(&local).await?;
        let replicator: Arc<dyn Replicator> =
            Arc::new(BestEffortReplicator::new(Arc::clone(&remote)));
        let reconciler = SyncReconciler::new(local.clone(), remote, Arc::clone(&replicator))
            .with_clock(Arc::clone(&clock));

        Ok(Self {
            service: TaskService::new(local.clone(), Arc::clone(&replicator), clock),
            local,
            replicator,
            reconciler: Some(reconciler),
        })
    }

    pub fn service(&self) -> &TaskService {
        &self.service
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// `None` when running local-only.
    pub fn reconciler(&self) -> Option<&SyncReconciler> {
        self.reconciler.as_ref()
    }

    /// Wait for pending pushes, then close the Local Store.
    pub async fn close(self) {
        self.replicator.flush().await;
        self.local.close().await;
    }
}

/// A clock that issues ids above every numeric id already stored.
async fn seeded_clock(local: &LocalStore) -> Result<Arc<IdClock>, StoreError> {
    let clock = IdClock::new();
    for task in local.snapshot_tasks().await? {
        clock.observe(&task.id);
    }
    Ok(Arc::new(clock))
}
