//! Database operations for the categories table.

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tasksync_engine::Category;

use super::LocalStore;
use crate::error::StoreResult;

/// A stored category row from the database.
struct CategoryRow(Category);

impl<'r> sqlx::FromRow<'r, SqliteRow> for CategoryRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let task_count: i64 = row.try_get("task_count")?;
        Ok(CategoryRow(Category {
            name: row.try_get("name")?,
            icon_name: row.try_get("icon_name")?,
            color_hex: row.try_get("color_hex")?,
            task_count: u32::try_from(task_count).unwrap_or(0),
        }))
    }
}

pub(super) async fn load_all(pool: &SqlitePool) -> StoreResult<Vec<Category>> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT name, icon_name, color_hex, task_count FROM categories ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|row| row.0).collect())
}

impl LocalStore {
    /// Insert a category. Fails with `ConstraintViolation` if the name exists.
    pub async fn insert_category(&self, category: &Category) -> StoreResult<()> {
        let _guard = self.write_guard().await;

        sqlx::query(
            r#"
            INSERT INTO categories (name, icon_name, color_hex, task_count)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&category.name)
        .bind(&category.icon_name)
        .bind(&category.color_hex)
        .bind(i64::from(category.task_count))
        .execute(&self.inner.pool)
        .await?;

        tracing::debug!(name = %category.name, "Category inserted");
        self.publish_categories().await
    }

    /// Delete a category by name. Returns whether a row was removed.
    pub async fn delete_category(&self, name: &str) -> StoreResult<bool> {
        let _guard = self.write_guard().await;

        let result = sqlx::query("DELETE FROM categories WHERE name = ?1")
            .bind(name)
            .execute(&self.inner.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            tracing::debug!(name = %name, "Category deleted");
            self.publish_categories().await?;
        }
        Ok(removed)
    }

    /// One-shot read of every category in insertion order.
    pub async fn snapshot_categories(&self) -> StoreResult<Vec<Category>> {
        load_all(&self.inner.pool).await
    }
}
