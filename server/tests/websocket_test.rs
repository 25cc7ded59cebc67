//! Live WebSocket subscription tests against a mirror on an ephemeral port.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tasksync_mirror::{serve, AppState};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a memory-only mirror and return its address.
async fn spawn_mirror() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        serve(listener, AppState::in_memory()).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Socket {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    ws
}

async fn send(ws: &mut Socket, msg: Value) {
    ws.send(Message::Text(msg.to_string())).await.unwrap();
}

/// Next JSON text frame, failing the test after a second of silence.
async fn recv(ws: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(1), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn put(addr: SocketAddr, path: &str, value: Value) {
    reqwest::Client::new()
        .put(format!("http://{}/{}.json", addr, path))
        .json(&value)
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();
}

#[cfg(test)]
mod websocket_tests {
    use super::*;

    #[tokio::test]
    async fn test_ping_pong() {
        let addr = spawn_mirror().await;
        let mut ws = connect(addr).await;

        send(&mut ws, json!({"type": "ping"})).await;
        assert_eq!(recv(&mut ws).await, json!({"type": "pong"}));
    }

    #[tokio::test]
    async fn test_subscribe_receives_initial_then_changes() {
        let addr = spawn_mirror().await;
        put(addr, "tasks/Work/1", json!({"id": "1", "text": "Report"})).await;

        let mut ws = connect(addr).await;
        send(
            &mut ws,
            json!({"type": "subscribe", "path": "tasks/Work", "request_id": "r1"}),
        )
        .await;

        let ack = recv(&mut ws).await;
        assert_eq!(ack["type"], "subscribed");
        assert_eq!(ack["request_id"], "r1");
        let sub_id = ack["subscription_id"].as_str().unwrap().to_string();

        let initial = recv(&mut ws).await;
        assert_eq!(initial["type"], "snapshot");
        assert_eq!(initial["subscription_id"], sub_id.as_str());
        assert_eq!(initial["path"], "tasks/Work");
        assert_eq!(initial["value"]["1"]["text"], "Report");

        // Unrelated writes are not delivered
        put(addr, "categories/Travel", json!({"name": "Travel"})).await;
        put(addr, "tasks/Work/2", json!({"id": "2", "text": "Slides"})).await;

        let update = recv(&mut ws).await;
        assert_eq!(update["type"], "snapshot");
        assert_eq!(update["value"]["2"]["text"], "Slides");
        assert_eq!(update["value"]["1"]["text"], "Report");
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_snapshots() {
        let addr = spawn_mirror().await;
        let mut ws = connect(addr).await;

        send(&mut ws, json!({"type": "subscribe", "path": "tasks"})).await;
        let sub_id = recv(&mut ws).await["subscription_id"].clone();
        assert_eq!(recv(&mut ws).await["value"], Value::Null);

        send(
            &mut ws,
            json!({"type": "unsubscribe", "subscription_id": sub_id}),
        )
        .await;
        assert_eq!(recv(&mut ws).await["type"], "unsubscribed");

        put(addr, "tasks/Work/1", json!({"id": "1", "text": "Report"})).await;
        send(&mut ws, json!({"type": "ping"})).await;
        assert_eq!(recv(&mut ws).await["type"], "pong");
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let addr = spawn_mirror().await;
        let mut ws = connect(addr).await;

        send(&mut ws, json!({"type": "subscribe", "path": "tasks/a.b", "request_id": "r9"})).await;
        let err = recv(&mut ws).await;
        assert_eq!(err["type"], "error");
        assert_eq!(err["request_id"], "r9");

        ws.send(Message::Text("not json".to_string())).await.unwrap();
        let err = recv(&mut ws).await;
        assert_eq!(err["type"], "error");
        assert!(err["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid message format"));

        send(&mut ws, json!({"type": "unsubscribe", "subscription_id": "nope"})).await;
        assert_eq!(recv(&mut ws).await["type"], "error");
    }
}
