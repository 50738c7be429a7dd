//! Webhook event handling.

use std::sync::Arc;

use chrono::NaiveTime;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Direction, StationId};
use crate::line::{IncomingMessage, LineError, Message, Messenger, WebhookEvent};
use crate::messages;
use crate::notify::{NotifyConfig, station_status};
use crate::store::{NewSubscription, Store, StoreError, SubscriptionId, User};
use crate::topology::Topology;
use crate::tram::{PositionSource, TramError};

use super::command::Command;
use super::postback::{Postback, PostbackError};

/// Errors from handling one event.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("messaging error: {0}")]
    Line(#[from] LineError),

    #[error("position fetch failed: {0}")]
    Fetch(#[from] TramError),
}

/// Conversational front end.
#[derive(Clone)]
pub struct Bot {
    topology: Arc<Topology>,
    store: Arc<dyn Store>,
    messenger: Arc<dyn Messenger>,
    positions: Arc<dyn PositionSource>,
    config: NotifyConfig,
    morning_time: NaiveTime,
}

impl Bot {
    pub fn new(
        topology: Arc<Topology>,
        store: Arc<dyn Store>,
        messenger: Arc<dyn Messenger>,
        positions: Arc<dyn PositionSource>,
    ) -> Self {
        Self {
            topology,
            store,
            messenger,
            positions,
            config: NotifyConfig::default(),
            morning_time: NaiveTime::from_hms_opt(7, 25, 0).unwrap_or_default(),
        }
    }

    /// Digest time mentioned in the welcome message.
    pub fn with_morning_time(mut self, time: NaiveTime) -> Self {
        self.morning_time = time;
        self
    }

    /// Handle one webhook event.
    ///
    /// Store and fetch failures during a conversation are answered with a
    /// generic apology; only a failed reply is returned as an error.
    pub async fn handle(&self, event: &WebhookEvent) -> Result<(), BotError> {
        match event {
            WebhookEvent::Follow {
                reply_token,
                source,
            } => match source.user_id.as_deref() {
                Some(user) => self.on_follow(reply_token, user).await,
                None => {
                    warn!("follow event without user id");
                    Ok(())
                }
            },
            WebhookEvent::Unfollow { source } => match source.user_id.as_deref() {
                Some(user) => self.on_unfollow(user).await,
                None => Ok(()),
            },
            WebhookEvent::Message {
                reply_token,
                source,
                message: IncomingMessage::Text { text },
            } => match source.user_id.as_deref() {
                Some(user) => {
                    let replies = self.on_text(user, text).await;
                    self.reply(reply_token, replies).await
                }
                None => Ok(()),
            },
            WebhookEvent::Postback {
                reply_token,
                source,
                postback,
            } => match source.user_id.as_deref() {
                Some(user) => {
                    let replies = self.on_postback(user, &postback.data).await;
                    self.reply(reply_token, replies).await
                }
                None => Ok(()),
            },
            WebhookEvent::Message { .. } | WebhookEvent::Other => Ok(()),
        }
    }

    async fn reply(
        &self,
        reply_token: &str,
        replies: Result<Vec<Message>, BotError>,
    ) -> Result<(), BotError> {
        let messages = replies.unwrap_or_else(|e| {
            warn!(error = %e, "replying with apology");
            vec![Message::text(messages::APOLOGY)]
        });
        self.messenger.reply(reply_token, messages).await?;
        Ok(())
    }

    async fn on_follow(&self, reply_token: &str, line_user: &str) -> Result<(), BotError> {
        let display_name = match self.messenger.profile(line_user).await {
            Ok(profile) => Some(profile.display_name),
            Err(e) => {
                warn!(user = line_user, error = %e, "could not fetch profile");
                None
            }
        };

        let user = self
            .store
            .find_or_create_user(line_user, display_name.as_deref())
            .await?;
        if !user.is_active {
            self.store.set_user_active(user.id, true).await?;
        }
        info!(user = line_user, name = ?display_name, "user followed");

        self.messenger
            .reply(reply_token, vec![messages::welcome(self.morning_time)])
            .await?;
        Ok(())
    }

    async fn on_unfollow(&self, line_user: &str) -> Result<(), BotError> {
        if let Some(user) = self.store.find_user(line_user).await? {
            self.store.set_user_active(user.id, false).await?;
            info!(user = line_user, "user unfollowed");
        }
        Ok(())
    }

    async fn on_text(&self, line_user: &str, text: &str) -> Result<Vec<Message>, BotError> {
        let Some(user) = self.store.find_user(line_user).await? else {
            return Ok(vec![messages::welcome(self.morning_time)]);
        };

        let reply = match Command::parse(text) {
            Command::Setting => messages::station_picker(self.topology.stations()),
            Command::List => self.settings(&user).await?,
            Command::On => self.toggle(&user, true).await?,
            Command::Off => self.toggle(&user, false).await?,
            Command::Delete => {
                let deleted = self.store.delete_all_subscriptions(user.id).await?;
                if deleted == 0 {
                    Message::text(messages::NOTHING_TO_DELETE)
                } else {
                    messages::deleted_count(deleted)
                }
            }
            Command::Help => messages::welcome(self.morning_time),
            Command::Now => self.now(&user).await?,
            Command::Unknown => messages::help(),
        };
        Ok(vec![reply])
    }

    async fn settings(&self, user: &User) -> Result<Message, BotError> {
        let subscriptions = self.store.list_subscriptions(user.id).await?;
        Ok(messages::settings_list(&self.topology, &subscriptions))
    }

    async fn toggle(&self, user: &User, enabled: bool) -> Result<Message, BotError> {
        let changed = self.store.set_all_enabled(user.id, enabled).await?;
        let text = match (changed, enabled) {
            (0, _) => messages::NOTHING_TO_TOGGLE,
            (_, true) => messages::ALL_ENABLED,
            (_, false) => messages::ALL_DISABLED,
        };
        Ok(Message::text(text))
    }

    async fn now(&self, user: &User) -> Result<Message, BotError> {
        let subscriptions = self.store.list_subscriptions(user.id).await?;
        if subscriptions.is_empty() {
            return Ok(Message::text(messages::NO_STATIONS));
        }

        let reports = match self.positions.fetch_positions().await {
            Ok(reports) => reports,
            Err(e) => {
                warn!(error = %e, "position fetch failed for now command");
                return Ok(Message::text(messages::FETCH_FAILED));
            }
        };

        let entries: Vec<_> = subscriptions
            .iter()
            .filter_map(|s| {
                let station = self.topology.station(s.station_id)?;
                Some(station_status(
                    &self.topology,
                    &reports,
                    station,
                    s.direction,
                    self.config.now_horizon.clone(),
                    self.config.now_max_trams,
                ))
            })
            .collect();
        Ok(messages::now_status(&entries))
    }

    async fn on_postback(&self, line_user: &str, data: &str) -> Result<Vec<Message>, BotError> {
        let Some(user) = self.store.find_user(line_user).await? else {
            return Ok(vec![Message::text(messages::UNKNOWN_USER)]);
        };

        let postback = match Postback::parse(data) {
            Ok(postback) => postback,
            Err(e) => {
                warn!(data, error = %e, "rejected postback");
                let text = match e {
                    PostbackError::MissingField("setting_id")
                    | PostbackError::InvalidField {
                        field: "setting_id",
                        ..
                    } => messages::MISSING_SETTING_ID,
                    PostbackError::MissingField("station_id")
                    | PostbackError::InvalidField {
                        field: "station_id",
                        ..
                    } => messages::STATION_NOT_FOUND,
                    _ => messages::UNKNOWN_ACTION,
                };
                return Ok(vec![Message::text(text)]);
            }
        };

        let reply = match postback {
            Postback::NewSetting => messages::station_picker(self.topology.stations()),
            Postback::ViewSettings => self.settings(&user).await?,
            Postback::SelectStation { station } => match self.topology.station(station) {
                Some(station) => messages::direction_choice(&self.topology, station),
                None => Message::text(messages::STATION_NOT_FOUND),
            },
            Postback::SelectDirection { station, direction } => {
                match self.topology.station(station) {
                    Some(station) => messages::trigger_choice(&self.topology, station, direction),
                    None => Message::text(messages::STATION_NOT_FOUND),
                }
            }
            Postback::SelectTrigger {
                station,
                direction,
                trigger,
            } => self.create(&user, station, direction, trigger).await?,
            Postback::DeleteSetting { id } => self.delete(&user, id).await?,
        };
        Ok(vec![reply])
    }

    async fn create(
        &self,
        user: &User,
        station: StationId,
        direction: Direction,
        trigger: u8,
    ) -> Result<Message, BotError> {
        let Some(station) = self.topology.station(station) else {
            return Ok(Message::text(messages::STATION_NOT_FOUND));
        };
        let created = self
            .store
            .create_subscription(
                NewSubscription::new(user.id, station.id, direction).with_trigger(trigger),
            )
            .await?;
        info!(
            subscription = %created.id,
            station = station.name,
            direction = direction.as_str(),
            trigger,
            "subscription created"
        );
        Ok(messages::setting_created(
            &self.topology,
            station,
            direction,
            trigger,
        ))
    }

    async fn delete(&self, user: &User, id: SubscriptionId) -> Result<Message, BotError> {
        let text = if self.store.delete_subscription(user.id, id).await? {
            messages::SETTING_DELETED
        } else {
            messages::SETTING_NOT_FOUND
        };
        Ok(Message::text(text))
    }
}
