use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    store::{SkillStore, User, UserStore},
};

const BASE: i32 = 20;
const BIO: i32 = 20;
const PHONE: i32 = 15;
const LOCATION: i32 = 20;
const FIRST_SKILL: i32 = 15;
const THREE_SKILLS: i32 = 10;
const MAX: i32 = 100;

fn filled(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

/// Completeness score in `20..=100` for a profile with `skill_count` listings.
pub fn completeness(user: &User, skill_count: i64) -> i32 {
    let mut score = BASE;
    if filled(&user.bio) {
        score += BIO;
    }
    if filled(&user.phone) {
        score += PHONE;
    }
    if user.latitude.is_some() && user.longitude.is_some() {
        score += LOCATION;
    }
    if skill_count >= 1 {
        score += FIRST_SKILL;
    }
    if skill_count >= 3 {
        score += THREE_SKILLS;
    }
    score.min(MAX)
}

/// Recomputes and stores the user's score. Not atomic with the write that triggered it.
pub async fn refresh_completeness<S>(store: &S, user_id: Uuid) -> AppResult<i32>
where
    S: UserStore + SkillStore + ?Sized,
{
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    let skills = store.count_skills_for_user(user_id).await?;
    let score = completeness(&user, skills);
    store.set_profile_completeness(user_id, score).await?;
    debug!(%user_id, score, skills, "profile completeness refreshed");
    Ok(score)
}
