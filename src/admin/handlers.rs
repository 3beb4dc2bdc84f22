use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use super::{
    activity::{self, Action, Target},
    dto::{
        ActivityQuery, AdminCreate, AdminTokenResponse, AdminUpdate, DashboardStats,
        UserCreateByAdmin, UserUpdateByAdmin,
    },
};
use crate::{
    auth::{
        guard::{ensure_not_self, AdminUser, SuperAdmin},
        jwt::TokenSubject,
        normalize_email,
        password::{hash_password, verify_password},
        LoginRequest, TokenResponse,
    },
    error::{AppError, AppResult},
    profile::{handlers::apply_user_patch, score::refresh_completeness},
    state::AppState,
    store::{ActivityLogEntry, Admin, AdminPatch, NewAdmin, NewUser, User, UserPatch},
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/me", get(me))
        .route("/admin/admins", post(create_admin).get(list_admins))
        .route("/admin/admins/:id", put(update_admin).delete(delete_admin))
        .route("/admin/users", post(create_user).get(list_users))
        .route("/admin/users/:id", put(update_user).delete(delete_user))
        .route("/admin/activity-logs", get(activity_logs))
        .route("/admin/stats", get(stats))
}

/// The fields a partial update actually set, for the audit trail.
fn changed_fields<T: Serialize>(payload: &T) -> Option<Value> {
    match serde_json::to_value(payload).ok()? {
        Value::Object(mut map) => {
            map.retain(|_, v| !v.is_null());
            Some(Value::Object(map))
        }
        _ => None,
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<AdminTokenResponse>> {
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    let Some(mut admin) = state.store.find_admin_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "admin login unknown email");
        return Err(AppError::invalid_credentials());
    };
    if !verify_password(&payload.password, &admin.hashed_password)? {
        warn!(admin_id = %admin.id, "admin login invalid password");
        return Err(AppError::invalid_credentials());
    }
    if !admin.is_active {
        warn!(admin_id = %admin.id, "admin login to deactivated account");
        return Err(AppError::Forbidden("Admin account is deactivated".into()));
    }

    state.store.record_admin_login(admin.id).await?;
    admin.last_login = Some(time::OffsetDateTime::now_utc());

    let token = state
        .keys
        .issue_default(&TokenSubject::admin(admin.id, admin.email.clone(), admin.role))
        .map_err(anyhow::Error::from)?;
    activity::record(state.store.as_ref(), admin.id, Action::Login, Target::Admin, Some(admin.id), None).await;

    info!(admin_id = %admin.id, role = admin.role.as_str(), "admin logged in");
    Ok(Json(AdminTokenResponse {
        token: TokenResponse::bearer(token),
        admin,
    }))
}

#[instrument(skip(state, admin))]
pub async fn me(State(state): State<AppState>, admin: AdminUser) -> AppResult<Json<Admin>> {
    let row = state
        .store
        .find_admin(admin.0.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".into()))?;
    Ok(Json(row))
}

#[instrument(skip(state, caller, payload))]
pub async fn create_admin(
    State(state): State<AppState>,
    caller: SuperAdmin,
    Json(mut payload): Json<AdminCreate>,
) -> AppResult<(StatusCode, Json<Admin>)> {
    payload.email = normalize_email(&payload.email);
    payload.validate()?;
    if state.store.find_admin_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let admin = state
        .store
        .insert_admin(NewAdmin {
            email: payload.email,
            full_name: payload.full_name,
            role: payload.role,
            created_by: Some(caller.0.user_id),
            hashed_password,
        })
        .await?;
    activity::record(
        state.store.as_ref(),
        caller.0.user_id,
        Action::CreatedAdmin,
        Target::Admin,
        Some(admin.id),
        Some(json!({ "email": admin.email, "role": admin.role })),
    )
    .await;

    info!(admin_id = %admin.id, created_by = %caller.0.user_id, "admin created");
    Ok((StatusCode::CREATED, Json(admin)))
}

#[instrument(skip(state, _caller))]
pub async fn list_admins(
    State(state): State<AppState>,
    _caller: SuperAdmin,
) -> AppResult<Json<Vec<Admin>>> {
    Ok(Json(state.store.list_admins().await?))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_admin(
    State(state): State<AppState>,
    caller: SuperAdmin,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdminUpdate>,
) -> AppResult<Json<Admin>> {
    payload.validate()?;
    let details = changed_fields(&payload);
    let patch = AdminPatch::from(payload);
    if patch.is_empty() {
        return Err(AppError::invalid("body", "No fields to update"));
    }

    let admin = state
        .store
        .update_admin(id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".into()))?;
    activity::record(
        state.store.as_ref(),
        caller.0.user_id,
        Action::UpdatedAdmin,
        Target::Admin,
        Some(id),
        details,
    )
    .await;

    info!(admin_id = %id, "admin updated");
    Ok(Json(admin))
}

#[instrument(skip(state, caller))]
pub async fn delete_admin(
    State(state): State<AppState>,
    caller: SuperAdmin,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    ensure_not_self(&caller.0, id)?;
    let admin = state
        .store
        .find_admin(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Admin not found".into()))?;
    if !state.store.delete_admin(id).await? {
        return Err(AppError::NotFound("Admin not found".into()));
    }
    activity::record(
        state.store.as_ref(),
        caller.0.user_id,
        Action::DeletedAdmin,
        Target::Admin,
        Some(id),
        Some(json!({ "email": admin.email })),
    )
    .await;

    info!(admin_id = %id, "admin deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, caller, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    caller: AdminUser,
    Json(mut payload): Json<UserCreateByAdmin>,
) -> AppResult<(StatusCode, Json<User>)> {
    payload.email = normalize_email(&payload.email);
    payload.validate()?;
    if state.store.find_user_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let mut user = state
        .store
        .insert_user(NewUser {
            email: payload.email,
            full_name: payload.full_name,
            phone: payload.phone,
            bio: payload.bio,
            latitude: payload.latitude,
            longitude: payload.longitude,
            is_active: payload.is_active,
            hashed_password,
        })
        .await?;
    user.profile_completeness = refresh_completeness(state.store.as_ref(), user.id).await?;
    activity::record(
        state.store.as_ref(),
        caller.0.user_id,
        Action::CreatedUser,
        Target::User,
        Some(user.id),
        Some(json!({ "email": user.email })),
    )
    .await;

    info!(user_id = %user.id, admin_id = %caller.0.user_id, "user created by admin");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Every account, including deactivated ones.
#[instrument(skip(state, _caller))]
pub async fn list_users(
    State(state): State<AppState>,
    _caller: AdminUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.store.list_users().await?))
}

#[instrument(skip(state, caller, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    caller: AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdateByAdmin>,
) -> AppResult<Json<User>> {
    payload.validate()?;
    let details = changed_fields(&payload);
    let patch = UserPatch::from(payload);
    if patch.is_empty() {
        return Err(AppError::invalid("body", "No fields to update"));
    }

    let user = apply_user_patch(&state, id, &patch).await?;
    activity::record(
        state.store.as_ref(),
        caller.0.user_id,
        Action::UpdatedUser,
        Target::User,
        Some(id),
        details,
    )
    .await;

    info!(user_id = %id, admin_id = %caller.0.user_id, "user updated by admin");
    Ok(Json(user))
}

#[instrument(skip(state, caller))]
pub async fn delete_user(
    State(state): State<AppState>,
    caller: AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let user = state
        .store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if !state.store.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    activity::record(
        state.store.as_ref(),
        caller.0.user_id,
        Action::DeletedUser,
        Target::User,
        Some(id),
        Some(json!({ "email": user.email })),
    )
    .await;

    info!(user_id = %id, admin_id = %caller.0.user_id, "user deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _caller))]
pub async fn activity_logs(
    State(state): State<AppState>,
    _caller: AdminUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityLogEntry>>> {
    query.validate()?;
    Ok(Json(state.store.recent_activity(query.limit).await?))
}

#[instrument(skip(state, _caller))]
pub async fn stats(State(state): State<AppState>, _caller: AdminUser) -> AppResult<Json<DashboardStats>> {
    let users = state.store.list_users().await?;
    let admins = state.store.list_admins().await?;
    let total_skills = state.store.count_skills().await?;
    Ok(Json(DashboardStats {
        total_users: users.len(),
        active_users: users.iter().filter(|u| u.is_active).count(),
        total_admins: admins.len(),
        total_skills,
        platform_status: "operational",
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::{
        auth::password::hash_password,
        store::{AdminRole, NewAdmin},
        test_support::TestApp,
    };

    #[tokio::test]
    async fn admin_login_issues_admin_token_and_logs() {
        let app = TestApp::new();
        let hashed_password = hash_password("admin-pass-1").unwrap();
        let admin = app
            .state
            .store
            .insert_admin(NewAdmin {
                email: "ops@example.com".into(),
                full_name: "Ops".into(),
                role: AdminRole::Admin,
                created_by: None,
                hashed_password,
            })
            .await
            .unwrap();

        let (status, body) = app
            .send(
                Method::POST,
                "/admin/login",
                None,
                Some(json!({"email": " OPS@example.com", "password": "admin-pass-1"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["admin"]["role"], "admin");
        assert!(body["admin"].get("hashed_password").is_none());

        let claims = app.state.keys.validate(body["access_token"].as_str().unwrap()).unwrap();
        assert!(claims.is_admin);
        assert_eq!(claims.role, Some(AdminRole::Admin));

        let stored = app.state.store.find_admin(admin.id).await.unwrap().unwrap();
        assert!(stored.last_login.is_some());
        let logs = app.state.store.recent_activity(10).await.unwrap();
        assert_eq!(logs[0].action, "login");
        assert_eq!(logs[0].target_id, Some(admin.id));

        let (status, _) = app
            .send(
                Method::POST,
                "/admin/login",
                None,
                Some(json!({"email": "ops@example.com", "password": "wrong-pass"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn deactivated_admin_cannot_log_in() {
        let app = TestApp::new();
        let (admin, _) = app.create_admin("ops@example.com", AdminRole::Admin).await;
        app.state
            .store
            .update_admin(
                admin.id,
                &crate::store::AdminPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let (status, body) = app
            .send(
                Method::POST,
                "/admin/login",
                None,
                Some(json!({"email": "ops@example.com", "password": TestApp::PASSWORD})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "Admin account is deactivated");
    }

    #[tokio::test]
    async fn managing_admins_requires_super_admin() {
        let app = TestApp::new();
        let (_, admin_token) = app.create_admin("ops@example.com", AdminRole::Admin).await;
        let (_, user_token) = app.create_user("pro@example.com", "password123").await;

        let (status, _) = app.send(Method::GET, "/admin/admins", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send(Method::GET, "/admin/admins", Some(&user_token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = app.send(Method::GET, "/admin/admins", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // plain admins still reach the user-management side
        let (status, _) = app.send(Method::GET, "/admin/users", Some(&admin_token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn super_admin_creates_updates_and_deletes_admin() {
        let app = TestApp::new();
        let (root, token) = app.create_admin("root@example.com", AdminRole::SuperAdmin).await;

        let (status, created) = app
            .send(
                Method::POST,
                "/admin/admins",
                Some(&token),
                Some(json!({"email": "New@Example.com", "full_name": "New Admin", "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["email"], "new@example.com");
        assert_eq!(created["role"], "admin");
        assert_eq!(created["created_by"], root.id.to_string());

        let (status, _) = app
            .send(
                Method::POST,
                "/admin/admins",
                Some(&token),
                Some(json!({"email": "new@example.com", "full_name": "Dup", "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let path = format!("/admin/admins/{}", created["id"].as_str().unwrap());
        let (status, updated) = app
            .send(Method::PUT, &path, Some(&token), Some(json!({"role": "super_admin"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["role"], "super_admin");

        let (status, _) = app.send(Method::DELETE, &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send(Method::DELETE, &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let actions: Vec<String> = app
            .state
            .store
            .recent_activity(10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, ["deleted_admin", "updated_admin", "created_admin"]);
    }

    #[tokio::test]
    async fn super_admin_cannot_delete_self() {
        let app = TestApp::new();
        let (root, token) = app.create_admin("root@example.com", AdminRole::SuperAdmin).await;

        let (status, body) = app
            .send(Method::DELETE, &format!("/admin/admins/{}", root.id), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CANNOT_DELETE_SELF");
        assert!(app.state.store.find_admin(root.id).await.unwrap().is_some());
        assert!(app.state.store.recent_activity(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_manages_users_with_rescoring() {
        let app = TestApp::new();
        let (_, token) = app.create_admin("ops@example.com", AdminRole::Admin).await;

        let (status, user) = app
            .send(
                Method::POST,
                "/admin/users",
                Some(&token),
                Some(json!({
                    "email": "pro@example.com",
                    "password": "password123",
                    "full_name": "Pro",
                    "bio": "Roofer",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["profile_completeness"], 40);
        assert_eq!(user["is_active"], true);

        let path = format!("/admin/users/{}", user["id"].as_str().unwrap());
        let (status, updated) = app
            .send(
                Method::PUT,
                &path,
                Some(&token),
                Some(json!({"latitude": 1.0, "longitude": 2.0, "is_active": false})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["profile_completeness"], 60);
        assert_eq!(updated["is_active"], false);

        let logs = app.state.store.recent_activity(1).await.unwrap();
        assert_eq!(logs[0].action, "updated_user");
        assert_eq!(
            logs[0].details,
            Some(json!({"latitude": 1.0, "longitude": 2.0, "is_active": false}))
        );

        // deactivated accounts drop out of the public list but stay in the admin one
        let (_, public) = app.send(Method::GET, "/users", None, None).await;
        assert_eq!(public, json!([]));
        let (_, all) = app.send(Method::GET, "/admin/users", Some(&token), None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (status, _) = app.send(Method::DELETE, &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send(Method::DELETE, &path, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn activity_log_limit_is_bounded() {
        let app = TestApp::new();
        let (_, token) = app.create_admin("ops@example.com", AdminRole::Admin).await;
        for _ in 0..3 {
            crate::admin::activity::record(
                app.state.store.as_ref(),
                uuid::Uuid::new_v4(),
                crate::admin::activity::Action::CreatedCategory,
                crate::admin::activity::Target::Category,
                None,
                None,
            )
            .await;
        }

        let (status, logs) = app.send(Method::GET, "/admin/activity-logs", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(logs.as_array().unwrap().len(), 3);

        let (_, logs) = app
            .send(Method::GET, "/admin/activity-logs?limit=2", Some(&token), None)
            .await;
        assert_eq!(logs.as_array().unwrap().len(), 2);

        for bad in ["0", "501"] {
            let (status, _) = app
                .send(Method::GET, &format!("/admin/activity-logs?limit={bad}"), Some(&token), None)
                .await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn stats_count_platform_totals() {
        let app = TestApp::new();
        let (_, token) = app.create_admin("ops@example.com", AdminRole::Admin).await;
        let category = app.create_category("Gardening").await;
        let (_, user_token) = app.create_user("a@example.com", "password123").await;
        let (inactive, _) = app.create_user("b@example.com", "password123").await;
        app.state
            .store
            .update_user(
                inactive.id,
                &crate::store::UserPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        app.send(
            Method::POST,
            "/skills",
            Some(&user_token),
            Some(json!({"category_id": category.id, "skill_name": "Hedges"})),
        )
        .await;

        let (status, stats) = app.send(Method::GET, "/admin/stats", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            stats,
            json!({
                "total_users": 2,
                "active_users": 1,
                "total_admins": 1,
                "total_skills": 1,
                "platform_status": "operational",
            })
        );
    }
}
