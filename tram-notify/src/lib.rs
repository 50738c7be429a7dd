//! Kumamoto tram approach notifications.
//!
//! Polls the city tram position feed, works out how many stops each tram is
//! from the stations users subscribed to, and sends a LINE message when a
//! tram reaches the chosen distance.

pub mod bot;
pub mod cache;
pub mod config;
pub mod domain;
pub mod driver;
pub mod line;
pub mod messages;
pub mod notify;
pub mod resolver;
pub mod store;
pub mod topology;
pub mod tram;
pub mod web;
