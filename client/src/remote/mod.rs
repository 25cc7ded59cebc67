//! The Remote Store: a tree-structured realtime database used as a mirror.
//!
//! Nodes are addressed by [`RemotePath`]. Absent paths read as `null`, and
//! writing `null` removes a node.

mod http;
mod memory;

use async_trait::async_trait;
use serde_json::Value;
use tasksync_engine::RemotePath;
use tokio::sync::mpsc;

use crate::error::RemoteResult;

pub use http::HttpRemote;
pub use memory::MemoryRemote;

/// Hierarchical remote key-value tree.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upsert the subtree at `path`. Writing `null` removes it.
    async fn write(&self, path: &RemotePath, value: Value) -> RemoteResult<()>;

    /// One-shot fetch of the subtree at `path`.
    async fn read(&self, path: &RemotePath) -> RemoteResult<Value>;

    /// Delete the subtree at `path`.
    async fn remove(&self, path: &RemotePath) -> RemoteResult<()>;

    /// Watch the subtree at `path`.
    ///
    /// The subscription yields the current value first, then the full value
    /// again whenever an ancestor or descendant path changes.
    async fn subscribe(&self, path: &RemotePath) -> RemoteResult<Subscription>;
}

/// Handle for a live subscription. Unsubscribes when dropped.
pub struct Subscription {
    path: RemotePath,
    rx: mpsc::UnboundedReceiver<Value>,
    on_cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Build a subscription fed by `rx`; `on_cancel` runs exactly once on drop.
    pub fn new(
        path: RemotePath,
        rx: mpsc::UnboundedReceiver<Value>,
        on_cancel: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            path,
            rx,
            on_cancel: Some(Box::new(on_cancel)),
        }
    }

    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Wait for the next snapshot. `None` once the remote side is gone.
    pub async fn next(&mut self) -> Option<Value> {
        self.rx.recv().await
    }

    /// Stop receiving snapshots.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(on_cancel) = self.on_cancel.take() {
            on_cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
