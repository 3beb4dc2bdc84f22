use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::dto::{CategoryCreate, SkillCreate, SkillUpdate};
use crate::{
    admin::activity::{self, Action, Target},
    auth::guard::{AdminUser, AuthUser},
    error::{AppError, AppResult},
    profile::score::refresh_completeness,
    state::AppState,
    store::{NewCategory, NewSkill, Skill, SkillCategory, SkillPatch},
};

pub fn skill_routes() -> Router<AppState> {
    Router::new()
        .route("/skills/categories", get(list_categories).post(create_category))
        .route("/skills/categories/:id", get(get_category))
        .route("/skills", post(create_skill))
        .route("/skills/my-skills", get(my_skills))
        .route("/skills/user/:user_id", get(user_skills))
        .route("/skills/:id", put(update_skill).delete(delete_skill))
}

#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<SkillCategory>>> {
    Ok(Json(state.store.list_categories().await?))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<SkillCategory>> {
    let category = state
        .store
        .find_category(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
    Ok(Json(category))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<(StatusCode, Json<SkillCategory>)> {
    payload.validate()?;
    let new = NewCategory::from(payload);
    if state.store.find_category_by_name(&new.name).await?.is_some() {
        return Err(AppError::Conflict("Category already exists".into()));
    }

    let category = state.store.insert_category(new).await?;
    activity::record(
        state.store.as_ref(),
        admin.0.user_id,
        Action::CreatedCategory,
        Target::Category,
        Some(category.id),
        Some(serde_json::json!({ "name": category.name })),
    )
    .await;
    info!(category_id = %category.id, name = %category.name, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(state, user, payload))]
pub async fn create_skill(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SkillCreate>,
) -> AppResult<(StatusCode, Json<Skill>)> {
    payload.validate()?;
    if state.store.find_user(user.id()).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }
    if state.store.find_category(payload.category_id).await?.is_none() {
        return Err(AppError::NotFound("Category not found".into()));
    }

    let skill = state
        .store
        .insert_skill(NewSkill {
            user_id: user.id(),
            category_id: payload.category_id,
            skill_name: payload.skill_name,
            description: payload.description,
            experience_years: payload.experience_years,
            hourly_rate: payload.hourly_rate,
            currency: payload.currency,
            is_available: payload.is_available,
        })
        .await?;
    refresh_completeness(state.store.as_ref(), user.id()).await?;
    info!(skill_id = %skill.id, user_id = %skill.user_id, "skill created");
    Ok((StatusCode::CREATED, Json(skill)))
}

#[instrument(skip(state, user))]
pub async fn my_skills(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<Vec<Skill>>> {
    Ok(Json(state.store.list_skills_for_user(user.id()).await?))
}

#[instrument(skip(state))]
pub async fn user_skills(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<Skill>>> {
    Ok(Json(state.store.list_skills_for_user(user_id).await?))
}

/// Loads a skill and checks the caller owns it.
async fn owned_skill(state: &AppState, id: Uuid, owner: Uuid, verb: &str) -> AppResult<Skill> {
    let skill = state
        .store
        .find_skill(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Skill not found".into()))?;
    if skill.user_id != owner {
        return Err(AppError::Forbidden(format!("You can only {verb} your own skills")));
    }
    Ok(skill)
}

#[instrument(skip(state, user, payload))]
pub async fn update_skill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SkillUpdate>,
) -> AppResult<Json<Skill>> {
    payload.validate()?;
    let patch = SkillPatch::from(payload);
    if patch.is_empty() {
        return Err(AppError::invalid("body", "No fields to update"));
    }
    owned_skill(&state, id, user.id(), "update").await?;

    let skill = state
        .store
        .update_skill(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Skill not found".into()))?;
    info!(skill_id = %skill.id, "skill updated");
    Ok(Json(skill))
}

#[instrument(skip(state, user))]
pub async fn delete_skill(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    owned_skill(&state, id, user.id(), "delete").await?;
    if !state.store.delete_skill(id).await? {
        return Err(AppError::NotFound("Skill not found".into()));
    }
    refresh_completeness(state.store.as_ref(), user.id()).await?;
    info!(skill_id = %id, "skill deleted");
    Ok(StatusCode::NO_CONTENT)
}
