//! Router-level test harness over a fresh in-memory store.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    auth::{jwt::TokenSubject, password::hash_password},
    state::AppState,
    store::{Admin, AdminRole, NewAdmin, NewCategory, NewUser, SkillCategory, User},
};

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    /// Password given to admins made by [`TestApp::create_admin`].
    pub const PASSWORD: &'static str = "admin-pass-123";

    pub fn new() -> Self {
        let state = AppState::fake();
        let router = build_app(state.clone());
        Self { state, router }
    }

    /// Sends one request and returns the status with the JSON body (`Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(json) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = self.router.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> (User, String) {
        let user = self
            .state
            .store
            .insert_user(NewUser {
                email: email.to_string(),
                full_name: "Test Pro".into(),
                phone: None,
                bio: None,
                latitude: None,
                longitude: None,
                is_active: true,
                hashed_password: hash_password(password).unwrap(),
            })
            .await
            .unwrap();
        let token = self
            .state
            .keys
            .issue_default(&TokenSubject::user(user.id, user.email.clone()))
            .unwrap();
        (user, token)
    }

    pub async fn create_admin(&self, email: &str, role: AdminRole) -> (Admin, String) {
        let admin = self
            .state
            .store
            .insert_admin(NewAdmin {
                email: email.to_string(),
                full_name: "Test Admin".into(),
                role,
                created_by: None,
                hashed_password: hash_password(Self::PASSWORD).unwrap(),
            })
            .await
            .unwrap();
        let token = self
            .state
            .keys
            .issue_default(&TokenSubject::admin(admin.id, admin.email.clone(), role))
            .unwrap();
        (admin, token)
    }

    pub async fn create_category(&self, name: &str) -> SkillCategory {
        self.state
            .store
            .insert_category(NewCategory {
                name: name.to_string(),
                description: None,
                icon: None,
            })
            .await
            .unwrap()
    }
}
