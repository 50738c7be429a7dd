//! Conversational bot: commands, postbacks and the event queue.

mod command;
mod dispatch;
mod handler;
mod postback;

pub use command::Command;
pub use dispatch::{DispatchError, EventDispatcher};
pub use handler::{Bot, BotError};
pub use postback::{Postback, PostbackError, TRIGGER_CHOICES};
