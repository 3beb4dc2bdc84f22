//! Table store the handlers talk to. Production uses [`PgStore`]; [`MemoryStore`]
//! backs tests and `STORE_BACKEND=memory` runs.

use async_trait::async_trait;
use uuid::Uuid;

mod memory;
mod models;
mod postgres;

pub use memory::MemoryStore;
pub use models::*;
pub use postgres::PgStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<User>;
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Newest first.
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
    async fn update_user(&self, id: Uuid, patch: &UserPatch) -> anyhow::Result<Option<User>>;
    async fn set_profile_completeness(&self, id: Uuid, score: i32) -> anyhow::Result<()>;
    /// Also removes the user's skills and messages.
    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn insert_admin(&self, admin: NewAdmin) -> anyhow::Result<Admin>;
    async fn find_admin(&self, id: Uuid) -> anyhow::Result<Option<Admin>>;
    async fn find_admin_by_email(&self, email: &str) -> anyhow::Result<Option<Admin>>;
    /// Newest first.
    async fn list_admins(&self) -> anyhow::Result<Vec<Admin>>;
    async fn update_admin(&self, id: Uuid, patch: &AdminPatch) -> anyhow::Result<Option<Admin>>;
    async fn record_admin_login(&self, id: Uuid) -> anyhow::Result<()>;
    async fn delete_admin(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Ordered by name.
    async fn list_categories(&self) -> anyhow::Result<Vec<SkillCategory>>;
    async fn find_category(&self, id: Uuid) -> anyhow::Result<Option<SkillCategory>>;
    async fn find_category_by_name(&self, name: &str) -> anyhow::Result<Option<SkillCategory>>;
    async fn insert_category(&self, category: NewCategory) -> anyhow::Result<SkillCategory>;
}

#[async_trait]
pub trait SkillStore: Send + Sync {
    async fn insert_skill(&self, skill: NewSkill) -> anyhow::Result<Skill>;
    async fn find_skill(&self, id: Uuid) -> anyhow::Result<Option<Skill>>;
    /// Oldest first.
    async fn list_skills_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Skill>>;
    async fn count_skills_for_user(&self, user_id: Uuid) -> anyhow::Result<i64>;
    async fn count_skills(&self) -> anyhow::Result<i64>;
    async fn update_skill(&self, id: Uuid, patch: &SkillPatch) -> anyhow::Result<Option<Skill>>;
    async fn delete_skill(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
pub trait ActivityLogStore: Send + Sync {
    async fn insert_activity(&self, entry: NewActivity) -> anyhow::Result<ActivityLogEntry>;
    /// Newest first, at most `limit` rows.
    async fn recent_activity(&self, limit: i64) -> anyhow::Result<Vec<ActivityLogEntry>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message>;
    /// Every message the user sent or received, oldest first.
    async fn messages_for(&self, user_id: Uuid) -> anyhow::Result<Vec<Message>>;
    /// Both directions between `a` and `b`, oldest first.
    async fn messages_between(&self, a: Uuid, b: Uuid) -> anyhow::Result<Vec<Message>>;
    /// Marks unread messages from `sender` to `receiver` as read; returns how many changed.
    async fn mark_read(&self, sender: Uuid, receiver: Uuid) -> anyhow::Result<u64>;
}

pub trait Store:
    UserStore + AdminStore + CategoryStore + SkillStore + ActivityLogStore + MessageStore
{
}

impl<T> Store for T where
    T: UserStore + AdminStore + CategoryStore + SkillStore + ActivityLogStore + MessageStore
{
}
