use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{
    ActivityLogEntry, ActivityLogStore, Admin, AdminPatch, AdminStore, CategoryStore, Message,
    MessageStore, NewActivity, NewAdmin, NewCategory, NewMessage, NewSkill, NewUser, Skill,
    SkillCategory, SkillPatch, SkillStore, User, UserPatch, UserStore,
};

const USER_COLUMNS: &str = "id, email, full_name, phone, bio, latitude, longitude, \
     is_available, is_active, profile_completeness, hashed_password, created_at";
const ADMIN_COLUMNS: &str =
    "id, email, full_name, role, is_active, last_login, created_by, hashed_password, created_at";
const CATEGORY_COLUMNS: &str = "id, name, description, icon, created_at";
const SKILL_COLUMNS: &str = "id, user_id, category_id, skill_name, description, experience_years, \
     hourly_rate, currency, is_available, created_at, updated_at";
const ACTIVITY_COLUMNS: &str = "id, admin_id, action, target_type, target_id, details, created_at";
const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, message, is_read, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (email, full_name, phone, bio, latitude, longitude, is_active, hashed_password)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.full_name)
            .bind(&user.phone)
            .bind(&user.bio)
            .bind(user.latitude)
            .bind(user.longitude)
            .bind(user.is_active)
            .bind(&user.hashed_password)
            .fetch_one(&self.pool)
            .await
            .context("insert user")
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find user by id")
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("find user by email")
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("list users")
    }

    async fn update_user(&self, id: Uuid, patch: &UserPatch) -> anyhow::Result<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET full_name    = COALESCE($2, full_name),
                   phone        = COALESCE($3, phone),
                   bio          = COALESCE($4, bio),
                   latitude     = COALESCE($5, latitude),
                   longitude    = COALESCE($6, longitude),
                   is_available = COALESCE($7, is_available),
                   is_active    = COALESCE($8, is_active),
                   updated_at   = now()
             WHERE id = $1
         RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&patch.full_name)
            .bind(&patch.phone)
            .bind(&patch.bio)
            .bind(patch.latitude)
            .bind(patch.longitude)
            .bind(patch.is_available)
            .bind(patch.is_active)
            .fetch_optional(&self.pool)
            .await
            .context("update user")
    }

    async fn set_profile_completeness(&self, id: Uuid, score: i32) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET profile_completeness = $2 WHERE id = $1")
            .bind(id)
            .bind(score)
            .execute(&self.pool)
            .await
            .context("update profile completeness")?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl AdminStore for PgStore {
    async fn insert_admin(&self, admin: NewAdmin) -> anyhow::Result<Admin> {
        let sql = format!(
            r#"
            INSERT INTO admins (email, full_name, role, created_by, hashed_password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ADMIN_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Admin>(&sql)
            .bind(&admin.email)
            .bind(&admin.full_name)
            .bind(admin.role.as_str())
            .bind(admin.created_by)
            .bind(&admin.hashed_password)
            .fetch_one(&self.pool)
            .await
            .context("insert admin")
    }

    async fn find_admin(&self, id: Uuid) -> anyhow::Result<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find admin by id")
    }

    async fn find_admin_by_email(&self, email: &str) -> anyhow::Result<Option<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1");
        sqlx::query_as::<_, Admin>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .context("find admin by email")
    }

    async fn list_admins(&self) -> anyhow::Result<Vec<Admin>> {
        let sql = format!("SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at DESC");
        sqlx::query_as::<_, Admin>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("list admins")
    }

    async fn update_admin(&self, id: Uuid, patch: &AdminPatch) -> anyhow::Result<Option<Admin>> {
        let sql = format!(
            r#"
            UPDATE admins
               SET full_name = COALESCE($2, full_name),
                   role      = COALESCE($3, role),
                   is_active = COALESCE($4, is_active)
             WHERE id = $1
         RETURNING {ADMIN_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Admin>(&sql)
            .bind(id)
            .bind(&patch.full_name)
            .bind(patch.role.map(|r| r.as_str()))
            .bind(patch.is_active)
            .fetch_optional(&self.pool)
            .await
            .context("update admin")
    }

    async fn record_admin_login(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE admins SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("update admin last_login")?;
        Ok(())
    }

    async fn delete_admin(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete admin")?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_categories(&self) -> anyhow::Result<Vec<SkillCategory>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM skill_categories ORDER BY name");
        sqlx::query_as::<_, SkillCategory>(&sql)
            .fetch_all(&self.pool)
            .await
            .context("list skill categories")
    }

    async fn find_category(&self, id: Uuid) -> anyhow::Result<Option<SkillCategory>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM skill_categories WHERE id = $1");
        sqlx::query_as::<_, SkillCategory>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find skill category")
    }

    async fn find_category_by_name(&self, name: &str) -> anyhow::Result<Option<SkillCategory>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM skill_categories WHERE name = $1");
        sqlx::query_as::<_, SkillCategory>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .context("find skill category by name")
    }

    async fn insert_category(&self, category: NewCategory) -> anyhow::Result<SkillCategory> {
        let sql = format!(
            r#"
            INSERT INTO skill_categories (name, description, icon)
            VALUES ($1, $2, $3)
            RETURNING {CATEGORY_COLUMNS}
            "#
        );
        sqlx::query_as::<_, SkillCategory>(&sql)
            .bind(&category.name)
            .bind(&category.description)
            .bind(&category.icon)
            .fetch_one(&self.pool)
            .await
            .context("insert skill category")
    }
}

#[async_trait]
impl SkillStore for PgStore {
    async fn insert_skill(&self, skill: NewSkill) -> anyhow::Result<Skill> {
        let sql = format!(
            r#"
            INSERT INTO user_skills
                (user_id, category_id, skill_name, description, experience_years,
                 hourly_rate, currency, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SKILL_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Skill>(&sql)
            .bind(skill.user_id)
            .bind(skill.category_id)
            .bind(&skill.skill_name)
            .bind(&skill.description)
            .bind(skill.experience_years)
            .bind(skill.hourly_rate)
            .bind(&skill.currency)
            .bind(skill.is_available)
            .fetch_one(&self.pool)
            .await
            .context("insert skill")
    }

    async fn find_skill(&self, id: Uuid) -> anyhow::Result<Option<Skill>> {
        let sql = format!("SELECT {SKILL_COLUMNS} FROM user_skills WHERE id = $1");
        sqlx::query_as::<_, Skill>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("find skill")
    }

    async fn list_skills_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Skill>> {
        let sql = format!(
            "SELECT {SKILL_COLUMNS} FROM user_skills WHERE user_id = $1 ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, Skill>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("list skills for user")
    }

    async fn count_skills_for_user(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_skills WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .context("count skills for user")?;
        Ok(count)
    }

    async fn count_skills(&self) -> anyhow::Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_skills")
            .fetch_one(&self.pool)
            .await
            .context("count skills")?;
        Ok(count)
    }

    async fn update_skill(&self, id: Uuid, patch: &SkillPatch) -> anyhow::Result<Option<Skill>> {
        let sql = format!(
            r#"
            UPDATE user_skills
               SET skill_name       = COALESCE($2, skill_name),
                   description      = COALESCE($3, description),
                   experience_years = COALESCE($4, experience_years),
                   hourly_rate      = COALESCE($5, hourly_rate),
                   currency         = COALESCE($6, currency),
                   is_available     = COALESCE($7, is_available),
                   updated_at       = now()
             WHERE id = $1
         RETURNING {SKILL_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Skill>(&sql)
            .bind(id)
            .bind(&patch.skill_name)
            .bind(&patch.description)
            .bind(patch.experience_years)
            .bind(patch.hourly_rate)
            .bind(&patch.currency)
            .bind(patch.is_available)
            .fetch_optional(&self.pool)
            .await
            .context("update skill")
    }

    async fn delete_skill(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM user_skills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("delete skill")?;
        Ok(res.rows_affected() > 0)
    }
}

#[async_trait]
impl ActivityLogStore for PgStore {
    async fn insert_activity(&self, entry: NewActivity) -> anyhow::Result<ActivityLogEntry> {
        let sql = format!(
            r#"
            INSERT INTO admin_activity_log (admin_id, action, target_type, target_id, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACTIVITY_COLUMNS}
            "#
        );
        sqlx::query_as::<_, ActivityLogEntry>(&sql)
            .bind(entry.admin_id)
            .bind(&entry.action)
            .bind(&entry.target_type)
            .bind(entry.target_id)
            .bind(&entry.details)
            .fetch_one(&self.pool)
            .await
            .context("insert activity log entry")
    }

    async fn recent_activity(&self, limit: i64) -> anyhow::Result<Vec<ActivityLogEntry>> {
        let sql = format!(
            "SELECT {ACTIVITY_COLUMNS} FROM admin_activity_log ORDER BY created_at DESC LIMIT $1"
        );
        sqlx::query_as::<_, ActivityLogEntry>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("list activity log")
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message> {
        let sql = format!(
            r#"
            INSERT INTO messages (sender_id, receiver_id, message)
            VALUES ($1, $2, $3)
            RETURNING {MESSAGE_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(message.sender_id)
            .bind(message.receiver_id)
            .bind(&message.message)
            .fetch_one(&self.pool)
            .await
            .context("insert message")
    }

    async fn messages_for(&self, user_id: Uuid) -> anyhow::Result<Vec<Message>> {
        let sql = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
              FROM messages
             WHERE sender_id = $1 OR receiver_id = $1
             ORDER BY created_at ASC
            "#
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .context("list messages for user")
    }

    async fn messages_between(&self, a: Uuid, b: Uuid) -> anyhow::Result<Vec<Message>> {
        let sql = format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
              FROM messages
             WHERE (sender_id = $1 AND receiver_id = $2)
                OR (sender_id = $2 AND receiver_id = $1)
             ORDER BY created_at ASC
            "#
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(a)
            .bind(b)
            .fetch_all(&self.pool)
            .await
            .context("list conversation")
    }

    async fn mark_read(&self, sender: Uuid, receiver: Uuid) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE messages
               SET is_read = TRUE
             WHERE sender_id = $1 AND receiver_id = $2 AND is_read = FALSE
            "#,
        )
        .bind(sender)
        .bind(receiver)
        .execute(&self.pool)
        .await
        .context("mark messages read")?;
        Ok(res.rows_affected())
    }
}
