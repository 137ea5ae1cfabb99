use futures_util::{SinkExt, StreamExt};
use ingest_types::Address;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::error::AdapterError;

/// One `logsNotification` push (§4.8). `err` is the raw (possibly absent)
/// JSON-RPC `err` value; any non-null value makes the event a failure.
#[derive(Debug, Clone)]
pub struct LogsNotification {
    pub signature: String,
    pub err: Option<Value>,
}

impl LogsNotification {
    pub fn is_success(&self) -> bool {
        self.err.is_none()
    }
}

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// A single `logsSubscribe` connection (C9 wire layer; the reconnect
/// policy and circuit breaker live in `ingest-live`, not here).
pub struct LogsWsConnection {
    socket: Socket,
    subscription_id: Option<u64>,
}

impl LogsWsConnection {
    pub async fn connect(url: &url::Url) -> Result<Self, AdapterError> {
        let (socket, _) = connect_async(url.as_str()).await.map_err(|e| AdapterError::Transient(e.to_string()))?;
        Ok(Self { socket, subscription_id: None })
    }

    /// Sends `logsSubscribe({mentions: [address]}, {commitment: "confirmed"})`
    /// and waits for the subscription-id acknowledgement (§4.8).
    pub async fn subscribe(&mut self, address: &Address) -> Result<u64, AdapterError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "logsSubscribe",
            "params": [
                { "mentions": [address.as_str()] },
                { "commitment": "confirmed" }
            ]
        });

        self.socket
            .send(Message::Text(request.to_string()))
            .await
            .map_err(|e| AdapterError::Transient(e.to_string()))?;

        loop {
            let message = self
                .socket
                .next()
                .await
                .ok_or_else(|| AdapterError::Transient("socket closed before subscribe ack".into()))?
                .map_err(|e| AdapterError::Transient(e.to_string()))?;

            let Message::Text(text) = message else { continue };
            let value: Value = serde_json::from_str(&text).map_err(|e| AdapterError::DataShape(e.to_string()))?;

            if let Some(result) = value.get("result").and_then(Value::as_u64) {
                self.subscription_id = Some(result);
                return Ok(result);
            }
        }
    }

    /// Reads the next `logsNotification`, skipping any other JSON-RPC
    /// frame (acks, pings recast as text, etc.).
    pub async fn next_notification(&mut self) -> Result<LogsNotification, AdapterError> {
        loop {
            let message = self
                .socket
                .next()
                .await
                .ok_or_else(|| AdapterError::Transient("websocket read error: connection closed".into()))?
                .map_err(|e| AdapterError::Transient(format!("websocket read error: {e}")))?;

            let text = match message {
                Message::Text(text) => text,
                Message::Close(_) => {
                    return Err(AdapterError::Transient("websocket read error: connection closed".into()))
                }
                _ => continue,
            };

            let value: Value = serde_json::from_str(&text).map_err(|e| AdapterError::DataShape(e.to_string()))?;
            if value.get("method").and_then(Value::as_str) != Some("logsNotification") {
                continue;
            }

            let params = &value["params"]["result"]["value"];
            let signature = params
                .get("signature")
                .and_then(Value::as_str)
                .or_else(|| value["params"]["result"].get("signature").and_then(Value::as_str))
                .ok_or_else(|| AdapterError::DataShape("logsNotification missing signature".into()))?
                .to_string();
            let err = params.get("err").cloned().filter(|v| !v.is_null());

            return Ok(LogsNotification { signature, err });
        }
    }

    pub async fn close(mut self) -> Result<(), AdapterError> {
        self.socket.close(None).await.map_err(|e| AdapterError::Transient(e.to_string()))
    }
}
