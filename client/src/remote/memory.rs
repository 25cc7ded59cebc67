//! In-process Remote Store.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tasksync_engine::{RemotePath, Tree};
use tokio::sync::mpsc;

use super::{RemoteStore, Subscription};
use crate::error::{RemoteError, RemoteResult};

/// A Remote Store kept in memory.
///
/// Clones share the same tree. Switching it offline makes every call fail
/// with [`RemoteError::Network`] until it is switched back.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    tree: RwLock<Tree>,
    listeners: DashMap<u64, Listener>,
    next_listener: AtomicU64,
    offline: AtomicBool,
}

#[derive(Debug)]
struct Listener {
    path: RemotePath,
    tx: mpsc::UnboundedSender<Value>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing tree value.
    pub fn from_value(value: Value) -> Self {
        let remote = Self::default();
        *remote.tree_mut() = Tree::from_value(value);
        remote
    }

    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
        tracing::debug!(offline, "Memory remote connectivity changed");
    }

    pub fn is_offline(&self) -> bool {
        self.inner.offline.load(Ordering::SeqCst)
    }

    /// The whole tree, bypassing the offline switch.
    pub fn snapshot(&self) -> Value {
        self.inner
            .tree
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_value()
            .clone()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.len()
    }

    fn tree_mut(&self) -> RwLockWriteGuard<'_, Tree> {
        self.inner.tree.write().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_online(&self) -> RemoteResult<()> {
        if self.is_offline() {
            return Err(RemoteError::Network("remote is offline".into()));
        }
        Ok(())
    }

    /// Apply a mutation and notify related listeners while the tree is locked,
    /// so every listener sees snapshots in mutation order.
    fn mutate(&self, path: &RemotePath, apply: impl FnOnce(&mut Tree)) {
        let mut tree = self.tree_mut();
        apply(&mut tree);

        self.inner.listeners.retain(|_, listener| {
            if !listener.path.is_related(path) {
                return true;
            }
            listener.tx.send(tree.get(&listener.path)).is_ok()
        });
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn write(&self, path: &RemotePath, value: Value) -> RemoteResult<()> {
        self.ensure_online()?;
        self.mutate(path, |tree| tree.set(path, value));
        Ok(())
    }

    async fn read(&self, path: &RemotePath) -> RemoteResult<Value> {
        self.ensure_online()?;
        let tree = self.inner.tree.read().unwrap_or_else(|e| e.into_inner());
        Ok(tree.get(path))
    }

    async fn remove(&self, path: &RemotePath) -> RemoteResult<()> {
        self.ensure_online()?;
        self.mutate(path, |tree| {
            tree.remove(path);
        });
        Ok(())
    }

    async fn subscribe(&self, path: &RemotePath) -> RemoteResult<Subscription> {
        self.ensure_online()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        {
            // Hold the tree lock so no change slips between snapshot and registration
            let tree = self.tree_mut();
            let _ = tx.send(tree.get(path));
            self.inner.listeners.insert(
                id,
                Listener {
                    path: path.clone(),
                    tx,
                },
            );
        }

        let inner = Arc::downgrade(&self.inner);
        Ok(Subscription::new(path.clone(), rx, move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.remove(&id);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> RemotePath {
        RemotePath::parse(s).unwrap()
    }

    #[tokio::test]
    async fn write_read_remove() {
        let remote = MemoryRemote::new();
        remote
            .write(&path("tasks/Work/1"), json!({"text": "Report"}))
            .await
            .unwrap();

        assert_eq!(
            remote.read(&path("tasks/Work")).await.unwrap(),
            json!({"1": {"text": "Report"}})
        );

        remote.remove(&path("tasks/Work/1")).await.unwrap();
        assert_eq!(remote.read(&path("tasks")).await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn offline_fails_with_network() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);

        let err = remote.read(&path("tasks")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Network(_)));
        assert!(remote.write(&path("a"), json!(1)).await.is_err());
        assert!(remote.subscribe(&path("a")).await.is_err());

        remote.set_offline(false);
        assert!(remote.write(&path("a"), json!(1)).await.is_ok());
    }

    #[tokio::test]
    async fn subscription_sees_related_changes_only() {
        let remote = MemoryRemote::new();
        let mut sub = remote.subscribe(&path("tasks/Work")).await.unwrap();
        assert_eq!(sub.next().await, Some(Value::Null));

        remote.write(&path("categories/Travel"), json!({"name": "Travel"})).await.unwrap();
        remote.write(&path("tasks/Work/1"), json!({"text": "a"})).await.unwrap();
        assert_eq!(sub.next().await, Some(json!({"1": {"text": "a"}})));

        // A write to an ancestor is related too
        remote.write(&path("tasks"), json!({"Home": {"2": {"text": "b"}}})).await.unwrap();
        assert_eq!(sub.next().await, Some(Value::Null));
    }

    #[tokio::test]
    async fn dropping_subscription_unregisters() {
        let remote = MemoryRemote::new();
        let sub = remote.subscribe(&path("tasks")).await.unwrap();
        assert_eq!(remote.subscriber_count(), 1);

        drop(sub);
        assert_eq!(remote.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn clones_share_state() {
        let remote = MemoryRemote::from_value(json!({"tasks": {"Work": {"1": {"text": "a"}}}}));
        let other = remote.clone();
        other.remove(&path("tasks/Work/1")).await.unwrap();
        assert_eq!(remote.snapshot(), Value::Null);
    }
}
