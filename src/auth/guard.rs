use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{Claims, JwtKeys};
use crate::error::{AppError, AppResult};

/// Token part of an `Authorization: Bearer <token>` header.
fn bearer_token(header: Option<&str>) -> AppResult<&str> {
    let token = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthenticated("Missing or invalid authorization header".into()))?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return Err(AppError::Unauthenticated(
            "Missing or invalid authorization header".into(),
        ));
    }
    Ok(token)
}

pub fn authenticate(keys: &JwtKeys, header: Option<&str>) -> AppResult<Claims> {
    let token = bearer_token(header)?;
    keys.validate(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::unauthenticated()
    })
}

pub fn authorize_admin(keys: &JwtKeys, header: Option<&str>) -> AppResult<Claims> {
    let claims = authenticate(keys, header)?;
    if !claims.is_admin {
        warn!(user_id = %claims.user_id, "admin access denied");
        return Err(AppError::Forbidden("Admin access required".into()));
    }
    Ok(claims)
}

pub fn authorize_super_admin(keys: &JwtKeys, header: Option<&str>) -> AppResult<Claims> {
    let claims = authorize_admin(keys, header)?;
    if !claims.is_super_admin() {
        warn!(user_id = %claims.user_id, "super admin access denied");
        return Err(AppError::Forbidden("Super admin access required".into()));
    }
    Ok(claims)
}

/// An admin may not delete the account they are signed in as.
pub fn ensure_not_self(claims: &Claims, target_id: Uuid) -> AppResult<()> {
    if claims.user_id == target_id {
        return Err(AppError::SelfDeletion);
    }
    Ok(())
}

fn authorization_header(parts: &Parts) -> Option<&str> {
    parts.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// Caller holding a plain user token.
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.0.user_id
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let claims = authenticate(&keys, authorization_header(parts))?;
        if claims.is_admin {
            return Err(AppError::Forbidden("User token required".into()));
        }
        Ok(AuthUser(claims))
    }
}

/// Caller holding an admin token of either role.
pub struct AdminUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authorize_admin(&keys, authorization_header(parts)).map(AdminUser)
    }
}

pub struct SuperAdmin(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for SuperAdmin
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authorize_super_admin(&keys, authorization_header(parts)).map(SuperAdmin)
    }
}
