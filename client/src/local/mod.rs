//! The Local Store: durable on-device persistence on SQLite.
//!
//! Every mutation commits before it returns and then publishes a fresh
//! snapshot of the affected collection to watchers. Writers are serialized
//! by an internal lock; reads go straight to the pool.

mod categories;
mod pool;
mod tasks;

use std::sync::Arc;

use futures::Stream;
use sqlx::SqlitePool;
use tasksync_engine::{Category, Task};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::error::StoreResult;

pub use pool::{create_pool, run_migrations, MEMORY_URL};

/// Handle to the Local Store. Cheap to clone; clones share one pool.
#[derive(Debug, Clone)]
pub struct LocalStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    pool: SqlitePool,
    write_lock: Mutex<()>,
    tasks: watch::Sender<Arc<Vec<Task>>>,
    categories: watch::Sender<Arc<Vec<Category>>>,
}

impl LocalStore {
    /// Open (creating if needed) the database at `url` and run migrations.
    pub async fn open(url: &str) -> StoreResult<Self> {
        let pool = create_pool(url).await?;
        Self::from_pool(pool).await
    }

    /// Open a private in-memory database.
    pub async fn open_in_memory() -> StoreResult<Self> {
        Self::open(MEMORY_URL).await
    }

    /// Wrap an existing pool, running migrations first.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        run_migrations(&pool).await?;

        let tasks = tasks::load_all(&pool).await?;
        let categories = categories::load_all(&pool).await?;
        tracing::info!(
            tasks = tasks.len(),
            categories = categories.len(),
            "Local store opened"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                pool,
                write_lock: Mutex::new(()),
                tasks: watch::Sender::new(Arc::new(tasks)),
                categories: watch::Sender::new(Arc::new(categories)),
            }),
        })
    }

    /// Close the pool. Other clones become unusable.
    pub async fn close(&self) {
        self.inner.pool.close().await;
        tracing::info!("Local store closed");
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    async fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.inner.write_lock.lock().await
    }

    async fn publish_tasks(&self) -> StoreResult<()> {
        let tasks = tasks::load_all(&self.inner.pool).await?;
        self.inner.tasks.send_replace(Arc::new(tasks));
        Ok(())
    }

    async fn publish_categories(&self) -> StoreResult<()> {
        let categories = categories::load_all(&self.inner.pool).await?;
        self.inner.categories.send_replace(Arc::new(categories));
        Ok(())
    }

    /// Live snapshots of the task collection in insertion order.
    ///
    /// Yields the current snapshot immediately, then one after every
    /// committed task mutation. Each call returns an independent stream.
    pub fn get_all_tasks(&self) -> impl Stream<Item = Arc<Vec<Task>>> + Send + 'static {
        snapshots(self.inner.tasks.subscribe())
    }

    /// Live snapshots of the category collection in insertion order.
    pub fn get_all_categories(&self) -> impl Stream<Item = Arc<Vec<Category>>> + Send + 'static {
        snapshots(self.inner.categories.subscribe())
    }
}

/// Turn a watch receiver into a stream that starts with the current value.
///
/// Intermediate values may be skipped when the consumer is slower than the
/// writers; the latest snapshot is always delivered.
fn snapshots<T>(rx: watch::Receiver<T>) -> impl Stream<Item = T> + Send + 'static
where
    T: Clone + Send + Sync + 'static,
{
    futures::stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first {
            rx.changed().await.ok()?;
        }
        let value = rx.borrow_and_update().clone();
        Some((value, (rx, false)))
    })
}
