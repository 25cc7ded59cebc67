//! WebSocket message protocol definitions.
//!
//! All messages are JSON-encoded and use snake_case for field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Messages sent from client to server.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Watch the subtree at `path`.
    Subscribe {
        /// `/`-separated path, empty for the root
        path: String,
        /// Request ID for correlating responses
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Stop watching.
    Unsubscribe {
        subscription_id: String,
        #[serde(default)]
        request_id: Option<String>,
    },

    /// Keep-alive ping.
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A subscription was registered. Always precedes its first snapshot.
    Subscribed {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// A subscription was removed.
    Unsubscribed {
        subscription_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },

    /// Full value of a watched subtree, sent on subscribe and after each
    /// related change.
    Snapshot {
        subscription_id: String,
        path: String,
        value: Value,
    },

    /// Response to ping.
    Pong,

    /// Error message.
    Error {
        /// Error description
        message: String,
        /// Request ID from the original request (if applicable)
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
}

impl ServerMessage {
    /// Create an error message.
    pub fn error(message: impl Into<String>, request_id: Option<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
            request_id,
        }
    }

    /// Create a snapshot message.
    pub fn snapshot(
        subscription_id: impl Into<String>,
        path: impl Into<String>,
        value: Value,
    ) -> Self {
        ServerMessage::Snapshot {
            subscription_id: subscription_id.into(),
            path: path.into(),
            value,
        }
    }
}
