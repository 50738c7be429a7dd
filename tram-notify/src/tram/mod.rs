//! Tram position feed.
//!
//! The upstream service publishes a snapshot of every running vehicle:
//! its raw interval code, line, direction flag and car type. There is no
//! streaming; callers poll.

mod client;
mod error;
mod mock;
mod types;

use futures::future::BoxFuture;

use crate::domain::PositionReport;

pub use client::{TramClient, TramConfig};
pub use error::TramError;
pub use mock::MockTramSource;
pub use types::{RawPosition, parse_positions};

/// Anything that can produce a position snapshot.
pub trait PositionSource: Send + Sync {
    fn fetch_positions(&self) -> BoxFuture<'_, Result<Vec<PositionReport>, TramError>>;
}
