//! Application state for the web layer.

use std::sync::Arc;

use crate::bot::EventDispatcher;
use crate::driver::Poller;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Queue for verified webhook events
    pub dispatcher: EventDispatcher,

    /// Poll, cleanup and digest jobs
    pub poller: Poller,

    /// Key for webhook signatures
    pub channel_secret: Arc<str>,

    /// Bearer token for cron routes; open when unset
    pub cron_secret: Option<Arc<str>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        dispatcher: EventDispatcher,
        poller: Poller,
        channel_secret: &str,
        cron_secret: Option<&str>,
    ) -> Self {
        Self {
            dispatcher,
            poller,
            channel_secret: Arc::from(channel_secret),
            cron_secret: cron_secret.map(Arc::from),
        }
    }
}
