//! # Notification Relay
//!
//! In-process fan-out of [`RelayEvent`]s to SSE subscribers.
//!
//! Two families of channels, both created lazily on first subscribe:
//! - one per user, carrying every event touching one of the user's connections;
//! - one per connection, carrying its `message_created` events in write order.
//!
//! Delivery is best effort. A subscriber that falls more than the channel capacity
//! behind receives a single `resync` event and is expected to refetch. A channel with
//! no receivers left is dropped the next time something is published to it.
//!
//! Message writes on one connection hold [`Relay::lock_connection`] from the insert
//! until the publish, so a connection stream sees ids in ascending order.

use axum::response::sse::Event;
use futures_util::{Stream, StreamExt};
use shared::dto::RelayEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, RwLock};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{debug, warn};

const DEFAULT_CAPACITY: usize = 100;

type Channels = RwLock<HashMap<i64, broadcast::Sender<RelayEvent>>>;

pub struct Relay {
    user_channels: Channels,
    connection_channels: Channels,
    write_locks: RwLock<HashMap<i64, Arc<Mutex<()>>>>,
    capacity: usize,
}

/// What a subscriber sees.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Event(RelayEvent),
    /// The subscriber lagged and `skipped` events were dropped.
    Resync { skipped: u64 },
}

impl Relay {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            user_channels: RwLock::new(HashMap::new()),
            connection_channels: RwLock::new(HashMap::new()),
            write_locks: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe_user(&self, user_id: i64) -> broadcast::Receiver<RelayEvent> {
        self.subscribe(&self.user_channels, user_id).await
    }

    pub async fn subscribe_connection(&self, connection_id: i64) -> broadcast::Receiver<RelayEvent> {
        self.subscribe(&self.connection_channels, connection_id).await
    }

    /// Deliver `event` to each participant's user stream, and to the connection
    /// stream when it is a message.
    ///
    /// Returns how many receivers got the event.
    pub async fn publish(&self, participants: &[i64], event: RelayEvent) -> usize {
        let mut delivered = 0;

        for user_id in participants {
            delivered += Self::send(&self.user_channels, *user_id, &event).await;
        }

        if matches!(event, RelayEvent::MessageCreated { .. }) {
            delivered += Self::send(&self.connection_channels, event.connection_id(), &event).await;
        }

        debug!("[RELAY] {} on connection {} reached {} receivers", event.kind(), event.connection_id(), delivered);
        delivered
    }

    /// Serialize message writes on one connection. Hold the guard across the store
    /// append and the [`publish`](Self::publish) of the stored record.
    pub async fn lock_connection(&self, connection_id: i64) -> OwnedMutexGuard<()> {
        let existing = self.write_locks.read().await.get(&connection_id).cloned();
        let lock = match existing {
            Some(lock) => lock,
            None => self
                .write_locks
                .write()
                .await
                .entry(connection_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone(),
        };
        lock.lock_owned().await
    }

    pub async fn user_channel_count(&self) -> usize {
        self.user_channels.read().await.len()
    }

    pub async fn connection_channel_count(&self) -> usize {
        self.connection_channels.read().await.len()
    }

    async fn subscribe(&self, channels: &Channels, key: i64) -> broadcast::Receiver<RelayEvent> {
        let mut senders = channels.write().await;

        if let Some(sender) = senders.get(&key) {
            sender.subscribe()
        } else {
            let (tx, rx) = broadcast::channel(self.capacity);
            senders.insert(key, tx);
            rx
        }
    }

    async fn send(channels: &Channels, key: i64, event: &RelayEvent) -> usize {
        let sender = channels.read().await.get(&key).cloned();
        let Some(sender) = sender else {
            return 0;
        };

        match sender.send(event.clone()) {
            Ok(receivers) => receivers,
            Err(_) => {
                let mut senders = channels.write().await;
                // A subscriber may have arrived between the failed send and the lock.
                if senders.get(&key).is_some_and(|tx| tx.receiver_count() == 0) {
                    senders.remove(&key);
                }
                0
            }
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a receiver into a stream of deliveries. Ends when the channel is dropped.
pub fn deliveries(rx: broadcast::Receiver<RelayEvent>) -> impl Stream<Item = Delivery> {
    BroadcastStream::new(rx).map(|item| match item {
        Ok(event) => Delivery::Event(event),
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!("[RELAY] subscriber lagged, {} events dropped", skipped);
            Delivery::Resync { skipped }
        }
    })
}

/// SSE framing: the event kind goes in `event:`, the JSON body in `data:`.
pub fn sse_events(
    rx: broadcast::Receiver<RelayEvent>,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    deliveries(rx).map(|delivery| match delivery {
        Delivery::Event(event) => Event::default().event(event.kind()).json_data(&event),
        Delivery::Resync { skipped } => Ok(Event::default()
            .event("resync")
            .data(format!("{{\"type\":\"resync\",\"skipped\":{}}}", skipped))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::dto::{ConnectionDto, ConnectionStatus, MessageDto};

    fn message(id: i64, connection_id: i64) -> RelayEvent {
        RelayEvent::MessageCreated {
            message: MessageDto {
                id,
                connection_id,
                sender_id: 1,
                content: format!("message {}", id),
                attachment: None,
                created_at: "2025-01-01T00:00:00Z".to_string(),
                read: false,
                client_id: None,
            },
        }
    }

    fn requested(connection_id: i64) -> RelayEvent {
        RelayEvent::ConnectionRequested {
            connection: ConnectionDto {
                id: connection_id,
                requester_id: 1,
                receiver_id: 2,
                status: ConnectionStatus::Pending,
                created_at: "2025-01-01T00:00:00Z".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_connection_events_reach_both_users_only() {
        let relay = Relay::new();
        let mut one = relay.subscribe_user(1).await;
        let mut two = relay.subscribe_user(2).await;
        let mut conn = relay.subscribe_connection(7).await;

        let delivered = relay.publish(&[1, 2], requested(7)).await;
        assert_eq!(delivered, 2);

        assert_eq!(one.recv().await.unwrap(), requested(7));
        assert_eq!(two.recv().await.unwrap(), requested(7));
        assert!(conn.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_messages_reach_connection_stream_in_order() {
        let relay = Relay::new();
        let mut conn = relay.subscribe_connection(7).await;
        let mut other = relay.subscribe_connection(8).await;

        for id in 1..=3 {
            relay.publish(&[1, 2], message(id, 7)).await;
        }

        for id in 1..=3 {
            assert_eq!(conn.recv().await.unwrap(), message(id, 7));
        }
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_channels_pruned_without_receivers() {
        let relay = Relay::new();
        let rx = relay.subscribe_user(1).await;
        assert_eq!(relay.user_channel_count().await, 1);

        drop(rx);
        assert_eq!(relay.publish(&[1], requested(3)).await, 0);
        assert_eq!(relay.user_channel_count().await, 0);

        // Resubscribing recreates the channel.
        let mut rx = relay.subscribe_user(1).await;
        relay.publish(&[1], requested(4)).await;
        assert_eq!(rx.recv().await.unwrap(), requested(4));
    }

    #[tokio::test]
    async fn test_lagging_subscriber_gets_resync() {
        let relay = Relay::with_capacity(2);
        let rx = relay.subscribe_connection(7).await;

        for id in 1..=5 {
            relay.publish(&[], message(id, 7)).await;
        }

        let mut stream = Box::pin(deliveries(rx));
        assert_eq!(stream.next().await, Some(Delivery::Resync { skipped: 3 }));
        assert_eq!(stream.next().await, Some(Delivery::Event(message(4, 7))));
        assert_eq!(stream.next().await, Some(Delivery::Event(message(5, 7))));
    }

    #[tokio::test]
    async fn test_connection_lock_is_per_connection() {
        let relay = Relay::new();
        let held = relay.lock_connection(7).await;

        // Another connection is not blocked.
        let other = tokio::time::timeout(std::time::Duration::from_millis(100), relay.lock_connection(8)).await;
        assert!(other.is_ok());

        // The same connection waits for the holder.
        let same = tokio::time::timeout(std::time::Duration::from_millis(100), relay.lock_connection(7)).await;
        assert!(same.is_err());

        drop(held);
        let same = tokio::time::timeout(std::time::Duration::from_millis(100), relay.lock_connection(7)).await;
        assert!(same.is_ok());
    }
}
