use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, LazyLock};
use tracing::info;

use super::error::{ApiError, ResultExt, parse_uuid};
use crate::auth::{Auth, authorize_owner};
use crate::db::{Chirp, ChirpOrder, Database};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// Maximum chirp length in characters.
pub const MAX_CHIRP_LENGTH: usize = 140;

static PROFANITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)kerfuffle|sharbert|fornax").unwrap());

#[derive(Clone)]
pub struct ChirpsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(ChirpsState);

pub fn router(state: ChirpsState) -> Router {
    Router::new()
        .route("/", get(list_chirps).post(create_chirp))
        .route("/{id}", get(get_chirp).delete(delete_chirp))
        .with_state(state)
}

/// Replace every banned word, in any letter case, with `****`.
pub fn clean_body(body: &str) -> String {
    PROFANITY.replace_all(body, "****").into_owned()
}

#[derive(Deserialize)]
struct CreateChirpRequest {
    #[serde(default)]
    body: String,
}

#[derive(Deserialize)]
struct ListQuery {
    author_id: Option<String>,
    sort: Option<String>,
}

#[derive(Serialize)]
struct ChirpResponse {
    id: String,
    created_at: String,
    updated_at: String,
    body: String,
    user_id: String,
}

impl From<Chirp> for ChirpResponse {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id.to_string(),
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id.to_string(),
        }
    }
}

async fn create_chirp(
    State(state): State<ChirpsState>,
    Auth(user_id): Auth,
    body: Result<Json<CreateChirpRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = body?;

    if payload.body.is_empty() {
        return Err(ApiError::bad_request("Chirp cannot be empty"));
    }
    if payload.body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::bad_request("Chirp is too long"));
    }

    let chirp = state
        .db
        .chirps()
        .create(user_id, &clean_body(&payload.body))
        .await
        .db_err("Failed to create chirp")?;

    Ok((StatusCode::CREATED, Json(ChirpResponse::from(chirp))))
}

async fn list_chirps(
    State(state): State<ChirpsState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    // Anything but "desc" keeps the default order
    let order = match query.sort.as_deref() {
        Some("desc") => ChirpOrder::Desc,
        _ => ChirpOrder::Asc,
    };

    let chirps = match query.author_id.as_deref().filter(|s| !s.is_empty()) {
        Some(author) => {
            let author = parse_uuid(author, "author_id")?;
            state.db.chirps().list_by_author(author, order).await
        }
        None => state.db.chirps().list(order).await,
    }
    .db_err("Failed to list chirps")?;

    let chirps: Vec<ChirpResponse> = chirps.into_iter().map(ChirpResponse::from).collect();
    Ok(Json(chirps))
}

async fn get_chirp(
    State(state): State<ChirpsState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id, "chirp ID")?;

    let chirp = state
        .db
        .chirps()
        .get(id)
        .await
        .db_err("Failed to get chirp")?
        .ok_or_else(|| ApiError::not_found("Chirp not found"))?;

    Ok(Json(ChirpResponse::from(chirp)))
}

/// Delete a chirp: authenticate, then resolve, then check ownership.
async fn delete_chirp(
    State(state): State<ChirpsState>,
    Auth(user_id): Auth,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id, "chirp ID")?;

    let chirp = state
        .db
        .chirps()
        .get(id)
        .await
        .db_err("Failed to get chirp")?
        .ok_or_else(|| ApiError::not_found("Chirp not found"))?;

    authorize_owner(user_id, chirp.user_id)?;

    let deleted = state
        .db
        .chirps()
        .delete(id)
        .await
        .db_err("Failed to delete chirp")?;

    if !deleted {
        return Err(ApiError::not_found("Chirp not found"));
    }

    info!(chirp_id = %id, user_id = %user_id, "Chirp deleted");

    Ok(StatusCode::NO_CONTENT)
}
