use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use axum::extract::ws::Message;
use futures::{channel::mpsc, select, SinkExt, StreamExt};
use legalaid_api::{FeedMessage, ForumEvent, Uuid};
use tokio::sync::RwLock;

/// Receives change events after the corresponding mutation went through.
///
/// Delivery is best-effort: implementations swallow their own failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: ForumEvent);
}

pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, event: ForumEvent) {
        tracing::debug!(event = event.name(), "feed disabled, dropping event");
    }
}

#[derive(Debug)]
struct Subscriber {
    room: Option<String>,
    sender: mpsc::UnboundedSender<FeedMessage>,
}

/// Websocket subscribers, each optionally listening to one topic room
#[derive(Clone, Debug, Default)]
pub struct TopicFeeds(Arc<RwLock<HashMap<Uuid, Subscriber>>>);

impl TopicFeeds {
    pub fn new() -> TopicFeeds {
        TopicFeeds::default()
    }

    // Note: if this were bounded, a slow socket would block every notification
    pub async fn subscribe(
        &self,
        room: Option<String>,
    ) -> (Uuid, mpsc::UnboundedReceiver<FeedMessage>) {
        let (sender, receiver) = mpsc::unbounded();
        let id = Uuid::new_v4();
        self.0.write().await.insert(id, Subscriber { room, sender });
        (id, receiver)
    }

    pub async fn unsubscribe(&self, id: Uuid) {
        self.0.write().await.remove(&id);
    }

    pub async fn num_subscribers(&self) -> usize {
        self.0.read().await.len()
    }

    /// Relays events to the socket until either side goes away
    pub async fn serve_socket<W, R>(self, room: Option<String>, mut write: W, read: R)
    where
        W: Send + Unpin + futures::Sink<Message>,
        <W as futures::Sink<Message>>::Error: Send,
        R: Send + Unpin + futures::Stream<Item = Result<Message, axum::Error>>,
    {
        let (id, mut receiver) = self.subscribe(room.clone()).await;
        let subscribers = self.num_subscribers().await;
        tracing::debug!(?room, subscribers, "feed websocket connected");
        let mut read = read.fuse();
        macro_rules! send_message {
            ( $msg:expr ) => {{
                let msg: FeedMessage = $msg;
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(err) => {
                        tracing::error!(?err, ?msg, "failed serializing message to json");
                        continue;
                    }
                };
                if write.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }};
        }
        loop {
            select! {
                msg = receiver.next() => match msg {
                    None => break,
                    Some(msg) => send_message!(msg),
                },
                msg = read.next() => match msg {
                    None | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(Message::Text(msg))) if msg == "ping" => send_message!(FeedMessage::Pong),
                    Some(msg) => {
                        tracing::warn!("received unexpected message from client: {msg:?}");
                        break;
                    }
                },
            }
        }
        self.unsubscribe(id).await;
        tracing::debug!("feed websocket disconnected");
    }
}

#[async_trait]
impl Notifier for TopicFeeds {
    async fn notify(&self, event: ForumEvent) {
        let room = event.room();
        tracing::debug!(event = event.name(), ?room, "relaying forum event");
        let mut dead = Vec::new();
        for (id, s) in self.0.read().await.iter() {
            if room.is_some() && s.room != room {
                continue;
            }
            if s
                .sender
                .unbounded_send(FeedMessage::Event(event.clone()))
                .is_err()
            {
                dead.push(*id);
            }
        }
        if !dead.is_empty() {
            let mut subscribers = self.0.write().await;
            for id in dead {
                subscribers.remove(&id);
            }
        }
    }
}
