//! HTTP surface: LINE webhook, cron triggers and health checks.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
