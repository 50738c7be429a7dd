//! HTTP route handlers.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::driver::DriverError;
use crate::line::{SIGNATURE_HEADER, WebhookBody, verify_signature};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
///
/// Cron routes accept GET as well as POST so hosted schedulers that can
/// only issue GET requests work unchanged.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/webhook", post(webhook))
        .route("/cron/poll", get(cron_poll).post(cron_poll))
        .route("/cron/cleanup", get(cron_cleanup).post(cron_cleanup))
        .route("/cron/morning", get(cron_morning).post(cron_morning))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        polling: state.poller.is_running(),
        operating_hours: state.poller.hours().to_string(),
        timezone: state.poller.timezone().name().to_string(),
    })
}

/// LINE webhook. Events are queued and the request acknowledged at once.
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized {
            message: "Missing signature".to_string(),
        })?;
    if !verify_signature(&state.channel_secret, &body, signature) {
        return Err(AppError::Unauthorized {
            message: "Invalid signature".to_string(),
        });
    }

    let payload: WebhookBody = serde_json::from_slice(&body).map_err(|e| AppError::BadRequest {
        message: format!("Invalid webhook body: {}", e),
    })?;

    // Acknowledge regardless; a dropped batch is only logged
    if let Err(e) = state.dispatcher.enqueue(payload.events) {
        error!(error = %e, "dropped webhook events");
    }
    Ok(StatusCode::OK)
}

/// Check the cron bearer token when one is configured.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let Some(secret) = state.cron_secret.as_deref() else {
        return Ok(());
    };
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    if token == Some(secret) {
        Ok(())
    } else {
        Err(AppError::Unauthorized {
            message: "Unauthorized".to_string(),
        })
    }
}

async fn cron_poll(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CronResponse>, AppError> {
    authorize(&state, &headers)?;
    let outcome = state.poller.smart_poll().await?;
    Ok(Json(CronResponse::from_poll(outcome)))
}

async fn cron_cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CronResponse>, AppError> {
    authorize(&state, &headers)?;
    let report = state.poller.cleanup().await?;
    Ok(Json(CronResponse::from_cleanup(report)))
}

async fn cron_morning(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CronResponse>, AppError> {
    authorize(&state, &headers)?;
    let report = state.poller.morning().await?;
    Ok(Json(CronResponse::from_morning(report)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Unauthorized { message: String },
    Internal { message: String },
}

impl From<DriverError> for AppError {
    fn from(e: DriverError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, error = %message, "request failed");
        } else {
            warn!(%status, reason = %message, "request rejected");
        }

        let body = Json(ErrorResponse {
            status: "error",
            error: message,
        });
        (status, body).into_response()
    }
}
