//! Messaging API wire types.
//!
//! Only the subset the bot uses: text and flex messages with postback quick
//! replies going out, and follow, unfollow, text message and postback events
//! coming in. Anything else deserializes to an ignored variant.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Outgoing messages
// ============================================================================

/// A message sent to a user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Text {
        text: String,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none")]
        quick_reply: Option<QuickReply>,
    },
    Flex {
        #[serde(rename = "altText")]
        alt_text: String,
        contents: Value,
    },
}

impl Message {
    pub fn text(text: impl Into<String>) -> Self {
        Message::Text {
            text: text.into(),
            quick_reply: None,
        }
    }

    /// Text with postback buttons underneath.
    pub fn text_with_choices(text: impl Into<String>, items: Vec<QuickReplyItem>) -> Self {
        Message::Text {
            text: text.into(),
            quick_reply: Some(QuickReply { items }),
        }
    }

    pub fn flex(alt_text: impl Into<String>, contents: Value) -> Self {
        Message::Flex {
            alt_text: alt_text.into(),
            contents,
        }
    }

    /// The text body, or the alt text of a flex message.
    pub fn summary(&self) -> &str {
        match self {
            Message::Text { text, .. } => text,
            Message::Flex { alt_text, .. } => alt_text,
        }
    }

    /// Quick reply items, if any.
    pub fn choices(&self) -> &[QuickReplyItem] {
        match self {
            Message::Text {
                quick_reply: Some(reply),
                ..
            } => &reply.items,
            _ => &[],
        }
    }
}

/// Quick reply buttons attached to a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

/// One quick reply button. Always a postback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReplyItem {
    #[serde(rename = "type")]
    kind: &'static str,
    pub action: PostbackAction,
}

impl QuickReplyItem {
    pub fn postback(
        label: impl Into<String>,
        data: impl Into<String>,
        display_text: impl Into<String>,
    ) -> Self {
        Self {
            kind: "action",
            action: PostbackAction {
                kind: "postback",
                label: label.into(),
                data: data.into(),
                display_text: display_text.into(),
            },
        }
    }
}

/// A button that sends `data` back as a postback event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostbackAction {
    #[serde(rename = "type")]
    kind: &'static str,
    pub label: String,
    pub data: String,
    #[serde(rename = "displayText")]
    pub display_text: String,
}

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ReplyRequest<'a> {
    #[serde(rename = "replyToken")]
    pub reply_token: &'a str,
    pub messages: &'a [Message],
}

#[derive(Debug, Serialize)]
pub(super) struct PushRequest<'a> {
    pub to: &'a str,
    pub messages: &'a [Message],
}

// ============================================================================
// Incoming webhook
// ============================================================================

/// Webhook request body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookBody {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

/// A webhook event the bot reacts to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    Follow {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: EventSource,
    },
    Unfollow {
        source: EventSource,
    },
    Message {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: EventSource,
        message: IncomingMessage,
    },
    Postback {
        #[serde(rename = "replyToken")]
        reply_token: String,
        source: EventSource,
        postback: PostbackContent,
    },
    #[serde(other)]
    Other,
}

impl WebhookEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            WebhookEvent::Follow { .. } => "follow",
            WebhookEvent::Unfollow { .. } => "unfollow",
            WebhookEvent::Message { .. } => "message",
            WebhookEvent::Postback { .. } => "postback",
            WebhookEvent::Other => "other",
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            WebhookEvent::Follow { source, .. }
            | WebhookEvent::Unfollow { source }
            | WebhookEvent::Message { source, .. }
            | WebhookEvent::Postback { source, .. } => source.user_id.as_deref(),
            WebhookEvent::Other => None,
        }
    }
}

/// Who sent an event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventSource {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
}

/// Content of a message event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum IncomingMessage {
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Content of a postback event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PostbackContent {
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_message_json() {
        let msg = Message::text("hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, serde_json::json!({"type": "text", "text": "hello"}));
    }

    #[test]
    fn quick_reply_json() {
        let msg = Message::text_with_choices(
            "どちら方面？",
            vec![QuickReplyItem::postback(
                "健軍町方面",
                "action=select_direction&station_id=8&direction=down",
                "健軍町方面",
            )],
        );
        let value = serde_json::to_value(&msg).unwrap();
        let item = &value["quickReply"]["items"][0];
        assert_eq!(item["type"], "action");
        assert_eq!(item["action"]["type"], "postback");
        assert_eq!(item["action"]["displayText"], "健軍町方面");
        assert_eq!(msg.choices().len(), 1);
    }

    #[test]
    fn flex_message_json() {
        let msg = Message::flex("電停を選択", serde_json::json!({"type": "carousel"}));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "flex");
        assert_eq!(value["altText"], "電停を選択");
        assert_eq!(msg.summary(), "電停を選択");
    }

    #[test]
    fn parse_webhook_events() {
        let body = r#"{
            "destination": "Uxxxxxxxx",
            "events": [
                {"type": "follow", "replyToken": "r1", "timestamp": 1,
                 "source": {"type": "user", "userId": "U1"}},
                {"type": "message", "replyToken": "r2",
                 "source": {"type": "user", "userId": "U1"},
                 "message": {"id": "1", "type": "text", "text": "いま"}},
                {"type": "message", "replyToken": "r3",
                 "source": {"type": "user", "userId": "U1"},
                 "message": {"id": "2", "type": "sticker", "packageId": "1"}},
                {"type": "postback", "replyToken": "r4",
                 "source": {"type": "user", "userId": "U1"},
                 "postback": {"data": "action=view_settings"}},
                {"type": "unfollow", "source": {"type": "user", "userId": "U1"}},
                {"type": "beacon", "replyToken": "r5",
                 "source": {"type": "user", "userId": "U1"}}
            ]
        }"#;
        let parsed: WebhookBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.events.len(), 6);

        let kinds: Vec<_> = parsed.events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            ["follow", "message", "message", "postback", "unfollow", "other"]
        );
        assert!(matches!(
            &parsed.events[1],
            WebhookEvent::Message { message: IncomingMessage::Text { text }, .. } if text == "いま"
        ));
        assert!(matches!(
            &parsed.events[2],
            WebhookEvent::Message {
                message: IncomingMessage::Other,
                ..
            }
        ));
        assert_eq!(parsed.events[4].user_id(), Some("U1"));
        assert_eq!(parsed.events[5].user_id(), None);
    }

    #[test]
    fn empty_body_has_no_events() {
        let parsed: WebhookBody = serde_json::from_str("{}").unwrap();
        assert!(parsed.events.is_empty());
    }
}
