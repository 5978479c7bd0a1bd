//! Webhooks called by the Polka payment service.
//!
//! Callers authenticate with `Authorization: ApiKey <key>` and never map to a
//! user. Only the `user.upgraded` event changes state.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ApiError, ResultExt, parse_uuid};
use crate::auth::{HasServiceKey, ServiceAuth};
use crate::db::Database;

/// The one event that upgrades a user.
pub const USER_UPGRADED_EVENT: &str = "user.upgraded";

#[derive(Clone)]
pub struct WebhooksState {
    pub db: Database,
    pub polka_key: Arc<str>,
}

impl HasServiceKey for WebhooksState {
    fn service_key(&self) -> &str {
        &self.polka_key
    }
}

pub fn router(state: WebhooksState) -> Router {
    Router::new()
        .route("/webhooks", post(polka_webhook))
        .with_state(state)
}

#[derive(Deserialize)]
struct WebhookRequest {
    event: String,
    #[serde(default)]
    data: WebhookData,
}

#[derive(Deserialize, Default)]
struct WebhookData {
    #[serde(default)]
    user_id: String,
}

async fn polka_webhook(
    State(state): State<WebhooksState>,
    _service: ServiceAuth,
    body: Result<Json<WebhookRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = body?;

    // A malformed payload is rejected whatever the event
    let user_id = parse_uuid(&payload.data.user_id, "user_id")?;

    if payload.event != USER_UPGRADED_EVENT {
        debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(StatusCode::NO_CONTENT);
    }

    let user = state
        .db
        .users()
        .get_by_id(user_id)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if user.is_chirpy_red {
        debug!(user_id = %user_id, "User already upgraded");
        return Ok(StatusCode::NO_CONTENT);
    }

    let upgraded = state
        .db
        .users()
        .upgrade(user_id)
        .await
        .db_err("Failed to upgrade user")?;

    if !upgraded {
        return Err(ApiError::not_found("User not found"));
    }

    info!(user_id = %user_id, "User upgraded to Chirpy Red");

    Ok(StatusCode::NO_CONTENT)
}
