//! Messenger that records instead of sending.
//!
//! Used for dry runs and tests. Deliveries to users marked as failing are
//! rejected and not recorded. Only the most recent deliveries are kept.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;
use tracing::info;

use super::Messenger;
use super::error::LineError;
use super::types::{Message, Profile};

/// Deliveries kept by default before the oldest are dropped.
const DEFAULT_CAPACITY: usize = 1000;

/// Where a recorded message was sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Reply { token: String, messages: Vec<Message> },
    Push { to: String, messages: Vec<Message> },
}

impl Delivery {
    pub fn messages(&self) -> &[Message] {
        match self {
            Delivery::Reply { messages, .. } | Delivery::Push { messages, .. } => messages,
        }
    }
}

#[derive(Debug)]
struct Recorded {
    deliveries: VecDeque<Delivery>,
    capacity: usize,
    failing: HashSet<String>,
}

/// Dry-run messenger. Cloning shares the recording.
#[derive(Debug, Clone)]
pub struct RecordingMessenger {
    inner: Arc<RwLock<Recorded>>,
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `capacity` deliveries, dropping the oldest first.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Recorded {
                deliveries: VecDeque::new(),
                capacity,
                failing: HashSet::new(),
            })),
        }
    }

    /// Reject pushes to `user` (and replies with token `user`).
    pub async fn fail_for(&self, user: impl Into<String>) {
        self.inner.write().await.failing.insert(user.into());
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.inner.read().await.deliveries.iter().cloned().collect()
    }

    /// Messages pushed to `user`, in order.
    pub async fn pushes_to(&self, user: &str) -> Vec<Vec<Message>> {
        self.inner
            .read()
            .await
            .deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Push { to, messages } if to == user => Some(messages.clone()),
                _ => None,
            })
            .collect()
    }

    /// Messages sent with reply token `token`.
    pub async fn replies_to(&self, token: &str) -> Vec<Message> {
        self.inner
            .read()
            .await
            .deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Reply { token: t, messages } if t == token => Some(messages.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    async fn deliver(&self, key: &str, delivery: Delivery) -> Result<(), LineError> {
        let mut inner = self.inner.write().await;
        if inner.failing.contains(key) {
            return Err(LineError::Rejected {
                user: key.to_string(),
            });
        }
        for message in delivery.messages() {
            info!(to = key, text = message.summary(), "dry run delivery");
        }
        if inner.capacity == 0 {
            return Ok(());
        }
        if inner.deliveries.len() == inner.capacity {
            inner.deliveries.pop_front();
        }
        inner.deliveries.push_back(delivery);
        Ok(())
    }
}

impl Messenger for RecordingMessenger {
    fn reply<'a>(
        &'a self,
        reply_token: &'a str,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), LineError>> {
        Box::pin(async move {
            let delivery = Delivery::Reply {
                token: reply_token.to_string(),
                messages,
            };
            self.deliver(reply_token, delivery).await
        })
    }

    fn push<'a>(
        &'a self,
        to: &'a str,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), LineError>> {
        Box::pin(async move {
            let delivery = Delivery::Push {
                to: to.to_string(),
                messages,
            };
            self.deliver(to, delivery).await
        })
    }

    fn profile<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Profile, LineError>> {
        Box::pin(async move {
            if self.inner.read().await.failing.contains(user_id) {
                return Err(LineError::Rejected {
                    user: user_id.to_string(),
                });
            }
            Ok(Profile {
                user_id: user_id.to_string(),
                display_name: format!("user-{user_id}"),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_pushes_and_replies() {
        let messenger = RecordingMessenger::new();
        messenger.push("U1", vec![Message::text("a")]).await.unwrap();
        messenger.reply("r1", vec![Message::text("b")]).await.unwrap();
        messenger.push("U2", vec![Message::text("c")]).await.unwrap();

        assert_eq!(messenger.deliveries().await.len(), 3);
        assert_eq!(messenger.pushes_to("U1").await, vec![vec![Message::text("a")]]);
        assert_eq!(messenger.replies_to("r1").await, vec![Message::text("b")]);
    }

    #[tokio::test]
    async fn oldest_deliveries_are_dropped() {
        let messenger = RecordingMessenger::with_capacity(2);
        for text in ["a", "b", "c"] {
            messenger.push("U1", vec![Message::text(text)]).await.unwrap();
        }

        assert_eq!(
            messenger.pushes_to("U1").await,
            vec![vec![Message::text("b")], vec![Message::text("c")]]
        );
    }

    #[tokio::test]
    async fn failing_user_is_rejected() {
        let messenger = RecordingMessenger::new();
        messenger.fail_for("U1").await;

        assert!(messenger.push("U1", vec![Message::text("a")]).await.is_err());
        assert!(messenger.profile("U1").await.is_err());
        assert!(messenger.deliveries().await.is_empty());

        let profile = messenger.profile("U2").await.unwrap();
        assert_eq!(profile.display_name, "user-U2");
    }
}
