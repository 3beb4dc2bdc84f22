use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{ActivityLogStore, NewActivity};

/// Audited admin action verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    CreatedAdmin,
    UpdatedAdmin,
    DeletedAdmin,
    CreatedUser,
    UpdatedUser,
    DeletedUser,
    CreatedCategory,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::CreatedAdmin => "created_admin",
            Self::UpdatedAdmin => "updated_admin",
            Self::DeletedAdmin => "deleted_admin",
            Self::CreatedUser => "created_user",
            Self::UpdatedUser => "updated_user",
            Self::DeletedUser => "deleted_user",
            Self::CreatedCategory => "created_category",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Admin,
    User,
    Category,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Category => "skill_category",
        }
    }
}

/// Appends an audit entry. Best effort: a failed write is logged and otherwise ignored,
/// so it never fails the action being recorded.
pub async fn record<S>(
    store: &S,
    admin_id: Uuid,
    action: Action,
    target: Target,
    target_id: Option<Uuid>,
    details: Option<serde_json::Value>,
) where
    S: ActivityLogStore + ?Sized,
{
    let entry = NewActivity {
        admin_id,
        action: action.as_str().to_string(),
        target_type: target.as_str().to_string(),
        target_id,
        details,
    };
    match store.insert_activity(entry).await {
        Ok(row) => debug!(log_id = %row.id, %admin_id, action = action.as_str(), "activity recorded"),
        Err(e) => warn!(error = %e, %admin_id, action = action.as_str(), "activity log write failed"),
    }
}
