//! Background processing of webhook events.
//!
//! The webhook route acknowledges immediately; events are queued here and
//! each one is handled on its own task.

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, warn};

use crate::line::WebhookEvent;

use super::handler::Bot;

#[derive(Debug, Error)]
pub enum DispatchError {
    /// The queue is full; the batch was dropped.
    #[error("event queue is full")]
    QueueFull,

    /// The worker has shut down.
    #[error("event worker has stopped")]
    Closed,
}

/// Handle for queueing webhook events.
///
/// The worker exits once every clone has been dropped and the queue drained.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    queue: mpsc::Sender<Vec<WebhookEvent>>,
}

impl EventDispatcher {
    /// Spawn the worker, queueing at most `capacity` batches.
    pub fn spawn(bot: Bot, capacity: usize) -> (Self, JoinHandle<()>) {
        let (queue, batches) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run(bot, batches));
        (Self { queue }, worker)
    }

    pub fn enqueue(&self, events: Vec<WebhookEvent>) -> Result<(), DispatchError> {
        if events.is_empty() {
            return Ok(());
        }
        self.queue.try_send(events).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DispatchError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => DispatchError::Closed,
        })
    }
}

async fn run(bot: Bot, mut batches: mpsc::Receiver<Vec<WebhookEvent>>) {
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            batch = batches.recv() => {
                let Some(events) = batch else { break };
                debug!(count = events.len(), "handling webhook events");
                for event in events {
                    let bot = bot.clone();
                    tasks.spawn(async move {
                        if let Err(e) = bot.handle(&event).await {
                            warn!(kind = event.kind(), user = ?event.user_id(), error = %e, "event handling failed");
                        }
                    });
                }
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => log_join(joined),
        }
    }

    while let Some(joined) = tasks.join_next().await {
        log_join(joined);
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        error!(error = %e, "event task panicked");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::line::{EventSource, IncomingMessage, RecordingMessenger};
    use crate::store::{MemoryStore, UserStore};
    use crate::topology::Topology;
    use crate::tram::MockTramSource;

    fn bot(store: &MemoryStore, messenger: &RecordingMessenger) -> Bot {
        Bot::new(
            Arc::new(Topology::builtin().unwrap()),
            Arc::new(store.clone()),
            Arc::new(messenger.clone()),
            Arc::new(MockTramSource::from_reports(vec![])),
        )
    }

    fn follow(token: &str, user: &str) -> WebhookEvent {
        WebhookEvent::Follow {
            reply_token: token.to_string(),
            source: EventSource {
                kind: "user".to_string(),
                user_id: Some(user.to_string()),
            },
        }
    }

    #[tokio::test]
    async fn handles_every_event_in_a_batch() {
        let store = MemoryStore::new();
        let messenger = RecordingMessenger::new();
        let (dispatcher, worker) = EventDispatcher::spawn(bot(&store, &messenger), 8);

        dispatcher
            .enqueue(vec![follow("r1", "U1"), follow("r2", "U2")])
            .unwrap();
        dispatcher.enqueue(vec![follow("r3", "U3")]).unwrap();
        drop(dispatcher);
        worker.await.unwrap();

        for user in ["U1", "U2", "U3"] {
            assert!(store.find_user(user).await.unwrap().is_some());
        }
        assert_eq!(messenger.deliveries().await.len(), 3);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let store = MemoryStore::new();
        let messenger = RecordingMessenger::new();
        messenger.fail_for("r1").await;
        let (dispatcher, worker) = EventDispatcher::spawn(bot(&store, &messenger), 8);

        let text = WebhookEvent::Message {
            reply_token: "r1".to_string(),
            source: EventSource {
                kind: "user".to_string(),
                user_id: Some("U1".to_string()),
            },
            message: IncomingMessage::Text {
                text: "help".to_string(),
            },
        };
        dispatcher.enqueue(vec![text, follow("r2", "U2")]).unwrap();
        drop(dispatcher);
        worker.await.unwrap();

        assert_eq!(messenger.replies_to("r2").await.len(), 1);
        assert!(messenger.replies_to("r1").await.is_empty());
    }

    #[tokio::test]
    async fn full_queue_rejects() {
        let (queue, _batches) = mpsc::channel(1);
        let dispatcher = EventDispatcher { queue };

        dispatcher.enqueue(vec![follow("r1", "U1")]).unwrap();
        assert!(matches!(
            dispatcher.enqueue(vec![follow("r2", "U2")]),
            Err(DispatchError::QueueFull)
        ));
        // Empty batches never touch the queue
        assert!(dispatcher.enqueue(vec![]).is_ok());
    }

    #[tokio::test]
    async fn stopped_worker_is_reported() {
        let (queue, batches) = mpsc::channel(1);
        drop(batches);
        let dispatcher = EventDispatcher { queue };
        assert!(matches!(
            dispatcher.enqueue(vec![WebhookEvent::Other]),
            Err(DispatchError::Closed)
        ));
    }
}
