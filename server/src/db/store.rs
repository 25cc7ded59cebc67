//! The in-memory tree and its optional backing file.

use std::io;
use std::path::PathBuf;

use serde_json::Value;
use tasksync_engine::{RemotePath, Tree};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{load_snapshot, save_snapshot};

/// The mirrored tree behind a lock.
///
/// Writers hold the write guard while they persist a candidate tree, swap it
/// in and notify, so subscribers and the snapshot file see changes in order.
#[derive(Debug, Default)]
pub struct TreeStore {
    tree: RwLock<Tree>,
    data_file: Option<PathBuf>,
}

impl TreeStore {
    /// An empty, memory-only store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store, loading `data_file` if it exists.
    pub async fn open(data_file: Option<PathBuf>) -> io::Result<Self> {
        let tree = match &data_file {
            Some(path) => {
                let tree = load_snapshot(path).await?;
                tracing::info!(file = %path.display(), "Loaded tree snapshot");
                tree
            }
            None => Tree::new(),
        };
        Ok(Self {
            tree: RwLock::new(tree),
            data_file,
        })
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().await
    }

    /// Read the subtree at `path`.
    pub async fn get(&self, path: &RemotePath) -> Value {
        self.tree.read().await.get(path)
    }

    /// Save `tree` to the backing file, if there is one.
    pub async fn persist(&self, tree: &Tree) -> io::Result<()> {
        match &self.data_file {
            Some(path) => save_snapshot(path, tree).await,
            None => Ok(()),
        }
    }

    pub fn data_file(&self) -> Option<&PathBuf> {
        self.data_file.as_ref()
    }
}
