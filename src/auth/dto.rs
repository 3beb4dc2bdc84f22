use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request body for user registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 72, message = "password must be 8 to 72 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "full_name must be 2 to 100 characters"))]
    pub full_name: String,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
}

/// Request body for user and admin login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer",
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_enforces_bounds() {
        let ok = RegisterRequest {
            email: "pro@example.com".into(),
            password: "longenough".into(),
            full_name: "Ada".into(),
            phone: None,
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "not-an-email".into(),
            password: "short".into(),
            full_name: "A".into(),
            phone: Some("0".repeat(21)),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        for f in ["email", "password", "full_name", "phone"] {
            assert!(fields.contains_key(f), "missing error for {f}");
        }
    }

    #[test]
    fn token_response_is_bearer() {
        let json = serde_json::to_value(TokenResponse::bearer("abc".into())).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["access_token"], "abc");
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Pro@Example.COM "), "pro@example.com");
    }
}
