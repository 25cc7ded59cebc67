//! WebSocket support for live subscriptions.
//!
//! Clients connect, subscribe to paths, and receive a full snapshot of each
//! watched subtree whenever a related path changes.

mod manager;
mod protocol;

pub use manager::ConnectionManager;
pub use protocol::*;
