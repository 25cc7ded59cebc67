//! Database operations for the tasks table.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tasksync_engine::{Priority, Task};

use super::LocalStore;
use crate::error::{StoreError, StoreResult};

/// A stored task row from the database.
#[derive(Debug)]
pub(super) struct TaskRow {
    pub id: String,
    pub text: String,
    pub is_completed: bool,
    pub priority: String,
    pub category: String,
}

impl<'r> sqlx::FromRow<'r, SqliteRow> for TaskRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(TaskRow {
            id: row.try_get("id")?,
            text: row.try_get("text")?,
            is_completed: row.try_get("is_completed")?,
            priority: row.try_get("priority")?,
            category: row.try_get("category")?,
        })
    }
}

impl TaskRow {
    /// Convert a database row to a Task.
    fn into_task(self) -> StoreResult<Task> {
        let priority: Priority = self.priority.parse().map_err(|_| {
            StoreError::Corrupt(format!(
                "task '{}' has unknown priority '{}'",
                self.id, self.priority
            ))
        })?;
        Ok(Task {
            id: self.id,
            text: self.text,
            is_completed: self.is_completed,
            priority,
            category: self.category,
        })
    }
}

pub(super) async fn load_all(pool: &SqlitePool) -> StoreResult<Vec<Task>> {
    sqlx::query_as::<_, TaskRow>(
        r#"
        SELECT id, text, is_completed, priority, category
        FROM tasks
        ORDER BY rowid
        "#,
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(TaskRow::into_task)
    .collect()
}

impl LocalStore {
    /// Insert a new task. Fails with `ConstraintViolation` if the id exists.
    pub async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        let _guard = self.write_guard().await;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, text, is_completed, priority, category)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&task.id)
        .bind(&task.text)
        .bind(task.is_completed)
        .bind(task.priority.as_str())
        .bind(&task.category)
        .execute(&self.inner.pool)
        .await?;

        tracing::debug!(id = %task.id, category = %task.category, "Task inserted");
        self.publish_tasks().await
    }

    /// Replace the task with the same id. Fails with `NotFound` if absent.
    pub async fn update_task(&self, task: &Task) -> StoreResult<()> {
        let _guard = self.write_guard().await;

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET text = ?2, is_completed = ?3, priority = ?4, category = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&task.id)
        .bind(&task.text)
        .bind(task.is_completed)
        .bind(task.priority.as_str())
        .bind(&task.category)
        .execute(&self.inner.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("task '{}'", task.id)));
        }

        tracing::debug!(id = %task.id, "Task updated");
        self.publish_tasks().await
    }

    /// Delete a task by id. Returns whether a row was removed.
    pub async fn delete_task(&self, id: &str) -> StoreResult<bool> {
        let _guard = self.write_guard().await;

        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id)
            .execute(&self.inner.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            tracing::debug!(id = %id, "Task deleted");
            self.publish_tasks().await?;
        }
        Ok(removed)
    }

    /// Get a task by id.
    pub async fn get_task_by_id(&self, id: &str) -> StoreResult<Option<Task>> {
        sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, text, is_completed, priority, category
            FROM tasks
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.inner.pool)
        .await?
        .map(TaskRow::into_task)
        .transpose()
    }

    /// One-shot read of every task in insertion order.
    pub async fn snapshot_tasks(&self) -> StoreResult<Vec<Task>> {
        load_all(&self.inner.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn task(id: &str, text: &str) -> Task {
        Task::new(id, text, Priority::Medium, "Personal")
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let mut t = Task::new("1", "Report", Priority::High, "Work");
        t.is_completed = true;
        store.insert_task(&t).await.unwrap();

        assert_eq!(store.get_task_by_id("1").await.unwrap(), Some(t));
        assert_eq!(store.get_task_by_id("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_keeps_first() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.insert_task(&task("T1", "A")).await.unwrap();

        let err = store.insert_task(&task("T1", "B")).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        assert_eq!(store.get_task_by_id("T1").await.unwrap().unwrap().text, "A");
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = LocalStore::open_in_memory().await.unwrap();
        let err = store.update_task(&task("nope", "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert!(store.snapshot_tasks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_is_not_an_error() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.insert_task(&task("1", "a")).await.unwrap();

        assert!(store.delete_task("1").await.unwrap());
        assert!(!store.delete_task("1").await.unwrap());
    }

    #[tokio::test]
    async fn snapshots_keep_insertion_order() {
        let store = LocalStore::open_in_memory().await.unwrap();
        for id in ["30", "10", "20"] {
            store.insert_task(&task(id, id)).await.unwrap();
        }
        store.update_task(&task("30", "changed")).await.unwrap();

        let ids: Vec<_> = store
            .snapshot_tasks()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["30", "10", "20"]);
    }

    #[tokio::test]
    async fn stream_yields_current_then_changes() {
        let store = LocalStore::open_in_memory().await.unwrap();
        store.insert_task(&task("1", "a")).await.unwrap();

        let mut stream = Box::pin(store.get_all_tasks());
        assert_eq!(stream.next().await.unwrap().len(), 1);

        store.insert_task(&task("2", "b")).await.unwrap();
        assert_eq!(stream.next().await.unwrap().len(), 2);

        store.delete_task("1").await.unwrap();
        let snapshot = stream.next().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "2");

        // A second stream starts from the latest snapshot
        let mut again = Box::pin(store.get_all_tasks());
        assert_eq!(again.next().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_priority_is_corrupt() {
        let store = LocalStore::open_in_memory().await.unwrap();
        sqlx::query("INSERT INTO tasks (id, text, priority) VALUES ('1', 'x', 'URGENT')")
            .execute(store.pool())
            .await
            .unwrap();

        let err = store.get_task_by_id("1").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
