use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    auth::TokenResponse,
    store::{Admin, AdminPatch, AdminRole, UserPatch},
};

fn default_role() -> AdminRole {
    AdminRole::Admin
}

fn default_true() -> bool {
    true
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct AdminTokenResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub admin: Admin,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreate {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 2, max = 100, message = "full_name must be 2 to 100 characters"))]
    pub full_name: String,
    #[validate(length(min = 8, max = 72, message = "password must be 8 to 72 characters"))]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: AdminRole,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AdminUpdate {
    #[validate(length(min = 2, max = 100, message = "full_name must be 2 to 100 characters"))]
    pub full_name: Option<String>,
    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
}

impl From<AdminUpdate> for AdminPatch {
    fn from(u: AdminUpdate) -> Self {
        Self {
            full_name: u.full_name,
            role: u.role,
            is_active: u.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserCreateByAdmin {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 72, message = "password must be 8 to 72 characters"))]
    pub password: String,
    #[validate(length(min = 2, max = 100, message = "full_name must be 2 to 100 characters"))]
    pub full_name: String,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be within -90..=90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be within -180..=180"))]
    pub longitude: Option<f64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Admin-side user edit; unlike the self-service form it can toggle `is_active`.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UserUpdateByAdmin {
    #[validate(length(min = 2, max = 100, message = "full_name must be 2 to 100 characters"))]
    pub full_name: Option<String>,
    #[validate(length(max = 20, message = "phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be within -90..=90"))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be within -180..=180"))]
    pub longitude: Option<f64>,
    pub is_available: Option<bool>,
    pub is_active: Option<bool>,
}

impl From<UserUpdateByAdmin> for UserPatch {
    fn from(u: UserUpdateByAdmin) -> Self {
        Self {
            full_name: u.full_name,
            phone: u.phone,
            bio: u.bio,
            latitude: u.latitude,
            longitude: u.longitude,
            is_available: u.is_available,
            is_active: u.is_active,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ActivityQuery {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 500, message = "limit must be within 1..=500"))]
    pub limit: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_users: usize,
    pub total_admins: usize,
    pub total_skills: i64,
    pub platform_status: &'static str,
}
