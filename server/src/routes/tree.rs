//! REST access to the tree: `GET`/`PUT`/`DELETE /{path}.json`.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use crate::error::Result;
use crate::handlers::{parse_json_path, read_node, remove_node, write_node};
use crate::AppState;

/// Create tree routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/{*path}",
        get(get_handler).put(put_handler).delete(delete_handler),
    )
}

/// GET /{path}.json - Read a subtree.
async fn get_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Value>> {
    let path = parse_json_path(&raw)?;
    Ok(Json(read_node(&state, &path).await))
}

/// PUT /{path}.json - Replace a subtree, echoing the stored value.
async fn put_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Json(value): Json<Value>,
) -> Result<Json<Value>> {
    let path = parse_json_path(&raw)?;
    let stored = write_node(&state, &path, value).await?;
    Ok(Json(stored))
}

/// DELETE /{path}.json - Remove a subtree.
async fn delete_handler(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Value>> {
    let path = parse_json_path(&raw)?;
    remove_node(&state, &path).await?;
    Ok(Json(Value::Null))
}
