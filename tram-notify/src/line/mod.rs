//! LINE messaging transport.
//!
//! Outgoing replies and pushes go through the [`Messenger`] trait so the
//! evaluator and the bot can run against [`RecordingMessenger`] in tests
//! and dry runs.

mod client;
mod error;
mod recording;
mod signature;
mod types;

use futures::future::BoxFuture;

pub use client::{LineClient, LineConfig};
pub use error::LineError;
pub use recording::{Delivery, RecordingMessenger};
pub use signature::{SIGNATURE_HEADER, sign, verify_signature};
pub use types::{
    EventSource, IncomingMessage, Message, PostbackAction, PostbackContent, Profile, QuickReply,
    QuickReplyItem, WebhookBody, WebhookEvent,
};

/// Sends messages to users.
pub trait Messenger: Send + Sync {
    /// Answer a webhook event. Reply tokens are single use.
    fn reply<'a>(
        &'a self,
        reply_token: &'a str,
        messages: Vec<Message>,
    ) -> BoxFuture<'a, Result<(), LineError>>;

    fn push<'a>(&'a self, to: &'a str, messages: Vec<Message>)
    -> BoxFuture<'a, Result<(), LineError>>;

    fn profile<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Profile, LineError>>;
}
