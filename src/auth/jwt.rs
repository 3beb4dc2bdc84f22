use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState, store::AdminRole};

const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT payload. Every field is required on decode and unknown fields are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub role: Option<AdminRole>,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

impl Claims {
    pub fn is_super_admin(&self) -> bool {
        self.is_admin && self.role == Some(AdminRole::SuperAdmin)
    }
}

/// Identity a token is issued for.
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub user_id: Uuid,
    pub email: String,
    pub role: Option<AdminRole>,
    pub is_admin: bool,
}

impl TokenSubject {
    pub fn user(user_id: Uuid, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            role: None,
            is_admin: false,
        }
    }

    pub fn admin(user_id: Uuid, email: impl Into<String>, role: AdminRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            role: Some(role),
            is_admin: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Forged, malformed, expired or wrong-audience tokens are indistinguishable to callers.
    #[error("invalid token")]
    Invalid,
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::minutes(cfg.ttl_minutes),
        }
    }

    pub fn issue_default(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        self.issue(subject, self.ttl)
    }

    pub fn issue(&self, subject: &TokenSubject, ttl: Duration) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            user_id: subject.user_id,
            email: subject.email.clone(),
            role: subject.role,
            is_admin: subject.is_admin,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(user_id = %subject.user_id, is_admin = subject.is_admin, "jwt signed");
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::Invalid
        })?;

        // jsonwebtoken accepts exp == now; expiry is exclusive here.
        if data.claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(TokenError::Invalid);
        }
        debug!(user_id = %data.claims.user_id, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) fn test_keys() -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 30,
    })
}
