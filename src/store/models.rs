use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

impl AdminRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl TryFrom<String> for AdminRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(format!("unknown admin role {value:?}")),
        }
    }
}

/// Service-providing account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_available: bool,
    pub is_active: bool,
    pub profile_completeness: i32,
    #[serde(skip_serializing)]
    pub hashed_password: String, // Argon2 PHC string, never exposed in JSON
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub hashed_password: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_available: Option<bool>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether applying this patch can change the completeness score.
    pub fn touches_score(&self) -> bool {
        self.phone.is_some() || self.bio.is_some() || self.latitude.is_some() || self.longitude.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[sqlx(try_from = "String")]
    pub role: AdminRole,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    pub created_by: Option<Uuid>,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub email: String,
    pub full_name: String,
    pub role: AdminRole,
    pub created_by: Option<Uuid>,
    pub hashed_password: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminPatch {
    pub full_name: Option<String>,
    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
}

impl AdminPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// A skill listing; belongs to exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub skill_name: String,
    pub description: Option<String>,
    pub experience_years: i32,
    pub hourly_rate: Option<f64>,
    pub currency: String,
    pub is_available: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSkill {
    pub user_id: Uuid,
    pub category_id: Uuid,
    pub skill_name: String,
    pub description: Option<String>,
    pub experience_years: i32,
    pub hourly_rate: Option<f64>,
    pub currency: String,
    pub is_available: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillPatch {
    pub skill_name: Option<String>,
    pub description: Option<String>,
    pub experience_years: Option<i32>,
    pub hourly_rate: Option<f64>,
    pub currency: Option<String>,
    pub is_available: Option<bool>,
}

impl SkillPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewActivity {
    pub admin_id: Uuid,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
}
