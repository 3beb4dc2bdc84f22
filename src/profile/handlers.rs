use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::{
    dto::{LocationUpdate, ProfileUpdate},
    score::refresh_completeness,
};
use crate::{
    auth::guard::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
    store::{User, UserPatch},
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/profile/me", get(get_me).put(update_me))
        .route("/profile/location", put(update_location))
        .route("/profile/:id", get(get_profile))
}

async fn load_user(state: &AppState, id: Uuid) -> AppResult<User> {
    state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Applies `patch`, rescoring when a scored field changed, and returns the fresh row.
pub(crate) async fn apply_user_patch(
    state: &AppState,
    user_id: Uuid,
    patch: &UserPatch,
) -> AppResult<User> {
    let mut user = state
        .store
        .update_user(user_id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if patch.touches_score() {
        user.profile_completeness = refresh_completeness(state.store.as_ref(), user_id).await?;
    }
    Ok(user)
}

/// Public browse list of active professionals.
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    let users = state
        .store
        .list_users()
        .await?
        .into_iter()
        .filter(|u| u.is_active)
        .collect();
    Ok(Json(users))
}

#[instrument(skip(state, user))]
pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<User>> {
    Ok(Json(load_user(&state, user.id()).await?))
}

#[instrument(skip(state, user, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ProfileUpdate>,
) -> AppResult<Json<User>> {
    payload.validate()?;
    let patch = UserPatch::from(payload);
    if patch.is_empty() {
        return Err(AppError::invalid("body", "No fields to update"));
    }

    let updated = apply_user_patch(&state, user.id(), &patch).await?;
    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated))
}

#[instrument(skip(state, user, payload))]
pub async fn update_location(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<LocationUpdate>,
) -> AppResult<Json<User>> {
    payload.validate()?;
    let patch = UserPatch {
        latitude: Some(payload.latitude),
        longitude: Some(payload.longitude),
        ..Default::default()
    };
    let updated = apply_user_patch(&state, user.id(), &patch).await?;
    info!(user_id = %updated.id, "location updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<User>> {
    Ok(Json(load_user(&state, id).await?))
}
