//! # Tasksync Engine
//!
//! The pure core of a local-first to-do list that mirrors itself into a
//! tree-structured realtime database.
//!
//! This crate holds everything that can be decided without touching a disk
//! or a socket: the task and category records, the remote tree layout, the
//! encoding of records into that tree, and the pull planner that decides
//! which remote records a device adopts.
//!
//! ## Design Principles
//!
//! - **No IO**: persistence and networking live in the client crate
//! - **Local existence wins**: a pull only ever adds records with new ids
//! - **Tolerant decoding**: malformed remote leaves are skipped, never fatal
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Task`] has an id, text, completion flag, [`Priority`] and the name of
//! its category. A [`Category`] is a name plus presentation hints derived
//! from [`CategoryStyle`]. Four categories always exist, see
//! [`DEFAULT_CATEGORIES`].
//!
//! ### Remote tree
//!
//! ```text
//! tasks/{category}/{taskId}   -> task leaf
//! categories/{name}           -> category record
//! ```
//!
//! [`RemotePath`] addresses nodes, [`Tree`] implements the read/set/remove
//! semantics, and [`wire`] encodes and decodes the leaves.
//!
//! ### Pull planning
//!
//! [`plan_pull`] computes the set difference between a decoded remote
//! snapshot and the ids already stored locally.
//!
//! ## Quick Start
//!
//! ```rust
//! use tasksync_engine::{plan_pull, SyncScope};
//! use serde_json::json;
//!
//! let remote = json!({
//!     "Work": {
//!         "1706745600000": {"id": "1706745600000", "text": "Quarterly report"}
//!     }
//! });
//!
//! let decoded = SyncScope::All.decode(&remote);
//! assert_eq!(decoded.tasks[0].category, "Work");
//!
//! let plan = plan_pull(["1706745600000"], decoded.tasks);
//! assert!(plan.is_empty());
//! assert_eq!(plan.already_known, 1);
//! ```

pub mod clock;
pub mod error;
pub mod model;
pub mod path;
pub mod reconcile;
pub mod style;
pub mod tree;
pub mod wire;

// Re-export main types at crate root
pub use clock::IdClock;
pub use error::Error;
pub use model::{
    is_default_category, Category, NewTask, Priority, Task, DEFAULT_CATEGORIES, DEFAULT_CATEGORY,
};
pub use path::{RemotePath, CATEGORIES_ROOT, TASKS_ROOT};
pub use reconcile::{
    category_overview, filter_tasks, plan_category_pull, plan_pull, CategorySummary, PullPlan,
    SyncScope,
};
pub use style::{CategoryIcon, CategoryStyle};
pub use tree::Tree;
pub use wire::{encode_task, CategoryRecord, DecodedTasks};

/// Type aliases for clarity
pub type TaskId = String;
pub type Timestamp = u64;
