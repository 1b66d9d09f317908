//! # Relay Subscriptions
//!
//! Server-sent event streams of the notification relay, decoded into [`StreamItem`]s
//! on a channel.
//!
//! A subscription ends when the server closes the stream or the network drops. There
//! is no automatic reconnect: subscribe again and call
//! [`ChatSession::refresh`](crate::ChatSession::refresh) to catch up.

use crate::client::{parse, ApiClient};
use crate::error::{ClientError, Result};
use futures_util::StreamExt;
use reqwest::header;
use shared::dto::RelayEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    Event(RelayEvent),
    /// Events were dropped; refetch.
    Resync,
}

/// One parsed SSE frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

impl SseFrame {
    fn into_item(self) -> Option<StreamItem> {
        if self.event.as_deref() == Some("resync") {
            return Some(StreamItem::Resync);
        }
        match serde_json::from_str::<RelayEvent>(&self.data) {
            Ok(event) => Some(StreamItem::Event(event)),
            Err(e) => {
                warn!("Skipping undecodable relay frame: {}", e);
                None
            }
        }
    }
}

/// Incremental `text/event-stream` decoder. Chunks may split frames anywhere.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend(chunk.iter().copied().filter(|&b| b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&raw[..end])) {
                frames.push(frame);
            }
        }
        frames
    }
}

/// Keep-alive comments and frames without data yield `None`.
fn parse_frame(text: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut data_lines = Vec::new();

    for line in text.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => frame.event = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    frame.data = data_lines.join("\n");
    Some(frame)
}

/// A live relay stream. Dropping it closes the connection.
pub struct Subscription {
    rx: mpsc::Receiver<StreamItem>,
    task: JoinHandle<()>,
}

impl Subscription {
    /// Next item, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<StreamItem> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl ApiClient {
    /// Subscribe to one conversation. Fails with the gate error when the connection
    /// is not open to this user.
    pub async fn subscribe_connection(&self, connection_id: i64) -> Result<Subscription> {
        self.subscribe(&format!("/api/connections/{}/stream", connection_id))
            .await
    }

    /// Subscribe to every event touching the user's connections.
    pub async fn subscribe_notifications(&self) -> Result<Subscription> {
        self.subscribe("/api/notifications/stream").await
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        let response = self
            .authorize(self.stream_client.get(self.url(path)))
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(parse::<serde_json::Value>(response)
                .await
                .err()
                .unwrap_or_else(|| ClientError::Stream("Unexpected stream response".to_string())));
        }
        info!("Subscribed to {}", path);

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let path = path.to_string();
        let task = tokio::spawn(async move {
            let mut parser = SseParser::new();
            let mut body = response.bytes_stream();

            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("Stream {} interrupted: {}", path, e);
                        break;
                    }
                };
                for item in parser.push(&chunk).into_iter().filter_map(SseFrame::into_item) {
                    if tx.send(item).await.is_err() {
                        return;
                    }
                }
            }
            debug!("Stream {} ended", path);
        });

        Ok(Subscription { rx, task })
    }
}
