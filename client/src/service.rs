//! User-facing task and category actions.
//!
//! Every action writes the Local Store first and only then hands the change
//! to the replicator. Store errors are returned; remote failures never are.

use std::sync::Arc;

use tasksync_engine::{
    category_overview, filter_tasks, is_default_category, Category, CategoryRecord,
    CategorySummary, IdClock, NewTask, Task, Timestamp,
};
use tokio::sync::broadcast;

use crate::error::{Result, StoreError};
use crate::local::LocalStore;
use crate::replicate::{Change, PushOutcome, Replicator};

fn now_ms() -> Timestamp {
    chrono::Utc::now().timestamp_millis().max(0) as Timestamp
}

/// Task list actions: local write, then best-effort replicate.
#[derive(Clone)]
pub struct TaskService {
    local: LocalStore,
    replicator: Arc<dyn Replicator>,
    clock: Arc<IdClock>,
}

impl TaskService {
    pub fn new(local: LocalStore, replicator: Arc<dyn Replicator>, clock: Arc<IdClock>) -> Self {
        Self {
            local,
            replicator,
            clock,
        }
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Feed of push outcomes, for transient success/failure feedback.
    pub fn push_outcomes(&self) -> broadcast::Receiver<PushOutcome> {
        self.replicator.outcomes()
    }

    /// Wait until every queued push has finished.
    pub async fn flush(&self) {
        self.replicator.flush().await;
    }

    /// Create a task with a fresh id.
    pub async fn add_task(&self, new: NewTask) -> Result<Task> {
        let task = new.into_task(self.clock.next_id(now_ms()));
        task.validate()?;

        self.local.insert_task(&task).await?;
        tracing::info!(id = %task.id, category = %task.category, "Task added");

        self.replicator.replicate(Change::UpsertTask(task.clone()));
        Ok(task)
    }

    /// Insert `task`, or update it if its id already exists.
    pub async fn save_task(&self, task: Task) -> Result<()> {
        task.validate()?;
        self.clock.observe(&task.id);

        match self.local.insert_task(&task).await {
            Ok(()) => {
                self.replicator.replicate(Change::UpsertTask(task));
                Ok(())
            }
            Err(StoreError::ConstraintViolation(_)) => self.edit_task(task).await,
            Err(e) => Err(e.into()),
        }
    }

    /// Update an existing task. Fails with `NotFound` if it does not exist.
    ///
    /// Moving a task to another category also removes its old remote leaf.
    pub async fn edit_task(&self, task: Task) -> Result<()> {
        task.validate()?;
        let previous = self
            .local
            .get_task_by_id(&task.id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("task '{}'", task.id)))?;

        self.local.update_task(&task).await?;
        tracing::info!(id = %task.id, "Task edited");

        if previous.category != task.category {
            self.replicator.replicate(Change::RemoveTask {
                category: previous.category,
                id: previous.id,
            });
        }
        self.replicator.replicate(Change::UpsertTask(task));
        Ok(())
    }

    /// Flip the completion flag of a task and return the new version.
    pub async fn toggle_task(&self, id: &str) -> Result<Task> {
        let task = self
            .local
            .get_task_by_id(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("task '{}'", id)))?
            .toggled();

        self.local.update_task(&task).await?;
        tracing::debug!(id = %task.id, completed = task.is_completed, "Task toggled");

        self.replicator.replicate(Change::UpsertTask(task.clone()));
        Ok(task)
    }

    /// Delete a task. Returns the removed task, `None` if there was none.
    pub async fn delete_task(&self, id: &str) -> Result<Option<Task>> {
        let Some(task) = self.local.get_task_by_id(id).await? else {
            return Ok(None);
        };
        if !self.local.delete_task(id).await? {
            return Ok(None);
        }
        tracing::info!(id = %task.id, category = %task.category, "Task deleted");

        self.replicator.replicate(Change::RemoveTask {
            category: task.category.clone(),
            id: task.id.clone(),
        });
        Ok(Some(task))
    }

    /// Create a custom category.
    ///
    /// Names equal (ignoring case) to a default or existing category are
    /// rejected with `ConstraintViolation`.
    pub async fn add_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        Category::validate_name(name)?;

        let taken = is_default_category(name)
            || self
                .local
                .snapshot_categories()
                .await?
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(StoreError::ConstraintViolation(format!(
                "category '{}' already exists",
                name
            ))
            .into());
        }

        let category = Category::new(name);
        self.local.insert_category(&category).await?;
        tracing::info!(name = %category.name, "Category added");

        self.replicator
            .replicate(Change::CreateCategory(CategoryRecord::new(name, now_ms())));
        Ok(category)
    }

    /// Delete a category record. Its tasks keep their category name.
    ///
    /// The remote record is only removed when a local record was.
    pub async fn delete_category(&self, name: &str) -> Result<bool> {
        let removed = self.local.delete_category(name).await?;
        tracing::info!(name = %name, removed, "Category deleted");

        if removed && !is_default_category(name) {
            self.replicator.replicate(Change::RemoveCategory(name.to_string()));
        }
        Ok(removed)
    }

    /// Every category with counts recomputed from the current tasks.
    pub async fn category_overview(&self) -> Result<Vec<CategorySummary>> {
        let categories = self.local.snapshot_categories().await?;
        let tasks = self.local.snapshot_tasks().await?;
        Ok(category_overview(&categories, &tasks))
    }

    /// Tasks in `category`, in insertion order.
    pub async fn tasks_in(&self, category: &str) -> Result<Vec<Task>> {
        self.search_tasks(Some(category), "").await
    }

    /// Tasks in `category` (`None` for all) whose text contains `query`,
    /// ignoring case.
    pub async fn search_tasks(&self, category: Option<&str>, query: &str) -> Result<Vec<Task>> {
        let tasks = self.local.snapshot_tasks().await?;
        Ok(filter_tasks(&tasks, category, query))
    }
}
