//! JSON snapshot file persistence.

use std::io;
use std::path::Path;

use tasksync_engine::Tree;

/// Load a tree from `path`. A missing file is an empty tree.
pub async fn load_snapshot(path: &Path) -> io::Result<Tree> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Tree::new()),
        Err(e) => return Err(e),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Tree::new());
    }

    let value = serde_json::from_slice(&bytes)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Tree::from_value(value))
}

/// Write `tree` to `path`, replacing the previous snapshot atomically.
pub async fn save_snapshot(path: &Path, tree: &Tree) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(tree.as_value())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await
}
