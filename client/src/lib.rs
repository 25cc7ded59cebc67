//! # Tasksync
//!
//! An offline-first task list. Every action commits to an on-device SQLite
//! store first and is then mirrored, best effort, into a tree-structured
//! realtime database that other devices pull from.
//!
//! ## Layers
//!
//! - [`LocalStore`]: the source of truth, with live snapshot streams
//! - [`RemoteStore`]: the mirror, either [`HttpRemote`] or [`MemoryRemote`]
//! - [`Replicator`]: pushes committed changes without blocking the caller
//! - [`SyncReconciler`]: adopts remote records whose ids are new locally
//! - [`TaskService`]: the user-facing actions
//! - [`TaskApp`]: opens and closes all of the above
//!
//! ## Example
//!
//! ```rust,no_run
//! use tasksync::{ClientConfig, TaskApp};
//! use tasksync_engine::NewTask;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let app = TaskApp::open(&config).await?;
//!
//! app.service()
//!     .add_task(NewTask::new("Book flight").category("Travel"))
//!     .await?;
//!
//! if let Some(sync) = app.reconciler() {
//!     let report = sync.pull(&tasksync_engine::SyncScope::All).await?;
//!     println!("adopted {} tasks", report.inserted);
//! }
//!
//! app.close().await;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod local;
pub mod remote;
pub mod replicate;
pub mod service;
pub mod sync;

pub use app::{OpenError, TaskApp};
pub use config::{ClientConfig, ConfigError};
pub use error::{RemoteError, ServiceError, StoreError};
pub use local::LocalStore;
pub use remote::{HttpRemote, MemoryRemote, RemoteStore, Subscription};
pub use replicate::{BestEffortReplicator, Change, NoopReplicator, PushOutcome, Replicator};
pub use service::TaskService;
pub use sync::{PullReport, SyncHandle, SyncReconciler};
