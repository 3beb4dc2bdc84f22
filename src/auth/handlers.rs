use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    auth::{
        dto::{normalize_email, LoginRequest, RegisterRequest, TokenResponse},
        jwt::TokenSubject,
        password::{hash_password, verify_password},
    },
    error::{AppError, AppResult},
    profile::score::refresh_completeness,
    state::AppState,
    store::{NewUser, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    if state.store.find_user_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let mut user = state
        .store
        .insert_user(NewUser {
            email: payload.email,
            full_name: payload.full_name,
            phone: payload.phone,
            bio: None,
            latitude: None,
            longitude: None,
            is_active: true,
            hashed_password,
        })
        .await?;
    user.profile_completeness = refresh_completeness(state.store.as_ref(), user.id).await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    let Some(user) = state.store.find_user_by_email(&payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::invalid_credentials());
    };

    if !verify_password(&payload.password, &user.hashed_password)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::invalid_credentials());
    }

    if !user.is_active {
        warn!(user_id = %user.id, "login to deactivated account");
        return Err(AppError::Forbidden("Account is deactivated".into()));
    }

    let token = state
        .keys
        .issue_default(&TokenSubject::user(user.id, user.email.clone()))
        .map_err(anyhow::Error::from)?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(token)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::TestApp;

    #[tokio::test]
    async fn register_then_login_issues_bearer_token() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": " Pro@Example.com ",
                    "password": "hunter2hunter2",
                    "full_name": "Pat Pro",
                    "phone": "+15550100"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "pro@example.com");
        assert_eq!(body["profile_completeness"], 35);
        assert!(body.get("hashed_password").is_none());

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "pro@example.com", "password": "hunter2hunter2"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token_type"], "bearer");
        let claims = app.state.keys.validate(body["access_token"].as_str().unwrap()).unwrap();
        assert_eq!(claims.email, "pro@example.com");
        assert!(!claims.is_admin);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_without_insert() {
        let app = TestApp::new();
        app.create_user("dup@example.com", "password123").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "email": "DUP@example.com",
                    "password": "password456",
                    "full_name": "Second"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(app.state.store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn register_reports_field_level_errors() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({"email": "nope", "password": "short", "full_name": "Al"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["details"]["email"].is_array());
        assert!(body["error"]["details"]["password"].is_array());
        assert!(app.state.store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthenticated() {
        let app = TestApp::new();
        app.create_user("pro@example.com", "password123").await;

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "pro@example.com", "password": "password124"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("access_token").is_none());
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn unknown_email_matches_wrong_password_response() {
        let app = TestApp::new();
        let (status, body) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "ghost@example.com", "password": "password123"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Invalid email or password");
    }

    #[tokio::test]
    async fn legacy_bcrypt_account_gets_401_not_500() {
        let app = TestApp::new();
        app.state
            .store
            .insert_user(crate::store::NewUser {
                email: "legacy@example.com".into(),
                full_name: "Legacy".into(),
                phone: None,
                bio: None,
                latitude: None,
                longitude: None,
                is_active: true,
                hashed_password: "$2b$12$R9h/cIPz0gi.URNNX3kh2OPST9/PgBkqquzi.Ss7KIUgO2t0jWMUW".into(),
            })
            .await
            .unwrap();

        let (status, body) = app
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({"email": "legacy@example.com", "password": "rasmuslerdorf"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["message"], "Invalid email or password");
    }
}
