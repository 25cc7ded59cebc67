//! Remote Store over a Firebase-style REST endpoint.
//!
//! Reads and writes go to `{base}/{path}.json` with GET/PUT/DELETE. Live
//! subscriptions use the mirror's WebSocket protocol at `{base}/ws`, one
//! socket per subscription.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tasksync_engine::RemotePath;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::{RemoteStore, Subscription};
use crate::error::{RemoteError, RemoteResult};

/// Messages sent to the mirror.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame<'a> {
    Subscribe {
        path: &'a str,
        request_id: &'a str,
    },
}

/// Messages received from the mirror.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    Subscribed {
        subscription_id: String,
    },
    Snapshot {
        subscription_id: String,
        value: Value,
    },
    Error {
        message: String,
    },
    #[serde(other)]
    Other,
}

/// HTTP + WebSocket client for a mirror server.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    base: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRemote {
    /// Create a client for the remote at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> RemoteResult<Self> {
        let base = Url::parse(base_url).map_err(|e| {
            RemoteError::Rejected(format!("invalid remote url '{}': {}", base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::Rejected(format!(
                "invalid remote url '{}'",
                base_url
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base,
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// `{base}/{segments...}.json`, each segment percent-encoded.
    fn json_url(&self, path: &RemotePath) -> RemoteResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RemoteError::Rejected("remote url cannot be a base".into()))?;
            segments.pop_if_empty();
            match path.segments().split_last() {
                None => {
                    segments.push(".json");
                }
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{}.json", last));
                }
            }
        }
        Ok(url)
    }

    fn ws_url(&self) -> RemoteResult<Url> {
        let mut url = self.base.clone();
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme).map_err(|_| {
            RemoteError::Rejected(format!("cannot derive websocket url from '{}'", self.base))
        })?;
        url.path_segments_mut()
            .map_err(|_| RemoteError::Rejected("remote url cannot be a base".into()))?
            .pop_if_empty()
            .push("ws");
        Ok(url)
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Read frames until the mirror acknowledges the subscription.
async fn await_ack(ws: &mut Socket) -> RemoteResult<String> {
    while let Some(frame) = ws.next().await {
        let Message::Text(text) = frame? else {
            continue;
        };
        match serde_json::from_str::<ServerFrame>(&text) {
            Ok(ServerFrame::Subscribed { subscription_id }) => return Ok(subscription_id),
            Ok(ServerFrame::Error { message }) => return Err(RemoteError::Rejected(message)),
            Ok(_) => continue,
            Err(e) => return Err(RemoteError::Rejected(format!("bad frame: {}", e))),
        }
    }
    Err(RemoteError::Network("connection closed before subscribing".into()))
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn write(&self, path: &RemotePath, value: Value) -> RemoteResult<()> {
        let url = self.json_url(path)?;
        self.client
            .put(url)
            .json(&value)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(path = %path, "Remote write");
        Ok(())
    }

    async fn read(&self, path: &RemotePath) -> RemoteResult<Value> {
        let url = self.json_url(path)?;
        let value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(value)
    }

    async fn remove(&self, path: &RemotePath) -> RemoteResult<()> {
        let url = self.json_url(path)?;
        self.client.delete(url).send().await?.error_for_status()?;
        tracing::debug!(path = %path, "Remote remove");
        Ok(())
    }

    async fn subscribe(&self, path: &RemotePath) -> RemoteResult<Subscription> {
        let url = self.ws_url()?;
        let (mut ws, _) = tokio::time::timeout(self.timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| RemoteError::Network(format!("timed out connecting to {}", url)))??;

        let path_str = path.to_string();
        let request = serde_json::to_string(&ClientFrame::Subscribe {
            path: &path_str,
            request_id: "1",
        })
        .map_err(|e| RemoteError::Rejected(e.to_string()))?;
        ws.send(Message::Text(request)).await?;

        let subscription_id = tokio::time::timeout(self.timeout, await_ack(&mut ws))
            .await
            .map_err(|_| RemoteError::Network(format!("timed out subscribing to '{}'", path)))??;

        tracing::debug!(
            path = %path,
            subscription_id = %subscription_id,
            "Remote subscription opened"
        );

        let (tx, rx) = mpsc::unbounded_channel();
        let task_path = path.clone();
        let task = tokio::spawn(async move {
            while let Some(frame) = ws.next().await {
                let text = match frame {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!(path = %task_path, "Subscription socket error: {}", e);
                        break;
                    }
                };
                match serde_json::from_str::<ServerFrame>(&text) {
                    Ok(ServerFrame::Snapshot {
                        subscription_id: id,
                        value,
                    }) if id == subscription_id => {
                        if tx.send(value).is_err() {
                            break;
                        }
                    }
                    Ok(ServerFrame::Error { message }) => {
                        tracing::warn!(path = %task_path, "Remote reported error: {}", message);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(path = %task_path, "Ignoring unreadable frame: {}", e);
                    }
                }
            }
            let _ = ws.close(None).await;
        });

        let abort = task.abort_handle();
        Ok(Subscription::new(path.clone(), rx, move || abort.abort()))
    }
}
