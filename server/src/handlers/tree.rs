//! Tree reads and writes shared by the REST routes.
//!
//! Every mutation is applied to a candidate copy and persisted first. Only a
//! saved candidate replaces the live tree and reaches subscribers.

use serde_json::Value;
use tasksync_engine::{RemotePath, Tree};

use crate::error::{AppError, Result};
use crate::AppState;

/// Suffix every REST path carries.
pub const JSON_SUFFIX: &str = ".json";

/// Parse a REST path like `tasks/Work/17.json`. `.json` alone is the root.
pub fn parse_json_path(raw: &str) -> Result<RemotePath> {
    let Some(path) = raw.strip_suffix(JSON_SUFFIX) else {
        return Err(AppError::NotFound(format!("'/{}' is not a .json path", raw)));
    };
    Ok(RemotePath::parse(path)?)
}

/// Read the subtree at `path`, `null` if absent.
pub async fn read_node(state: &AppState, path: &RemotePath) -> Value {
    state.tree.get(path).await
}

/// Replace the subtree at `path`. Returns the stored value.
pub async fn write_node(state: &AppState, path: &RemotePath, value: Value) -> Result<Value> {
    commit(state, path, |tree| {
        tree.set(path, value);
        tree.get(path)
    })
    .await
}

/// Delete the subtree at `path`. Returns whether anything was removed.
pub async fn remove_node(state: &AppState, path: &RemotePath) -> Result<bool> {
    commit(state, path, |tree| tree.remove(path)).await
}

async fn commit<T>(
    state: &AppState,
    path: &RemotePath,
    mutate: impl FnOnce(&mut Tree) -> T,
) -> Result<T> {
    let mut tree = state.tree.write().await;
    let mut candidate = tree.clone();
    let result = mutate(&mut candidate);

    if let Err(e) = state.tree.persist(&candidate).await {
        tracing::warn!(path = %path, "Write rejected, tree left unchanged");
        return Err(e.into());
    }
    *tree = candidate;

    state.conn_manager.notify_change(path, &tree);

    tracing::debug!(path = %path, "Tree updated");
    Ok(result)
}
