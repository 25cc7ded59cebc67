//! Request handlers for tree access and live subscriptions.

mod tree;
mod websocket;

pub use tree::*;
pub use websocket::*;
