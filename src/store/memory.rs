use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    ActivityLogEntry, ActivityLogStore, Admin, AdminPatch, AdminStore, CategoryStore, Message,
    MessageStore, NewActivity, NewAdmin, NewCategory, NewMessage, NewSkill, NewUser, Skill,
    SkillCategory, SkillPatch, SkillStore, User, UserPatch, UserStore,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    admins: Vec<Admin>,
    categories: Vec<SkillCategory>,
    skills: Vec<Skill>,
    activity: Vec<ActivityLogEntry>,
    messages: Vec<Message>,
    last_ts: Option<OffsetDateTime>,
}

impl Tables {
    /// Strictly increasing so ordering by timestamp matches insertion order.
    fn now(&mut self) -> OffsetDateTime {
        let mut now = OffsetDateTime::now_utc();
        if let Some(last) = self.last_ts {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_ts = Some(now);
        now
    }
}

/// Process-local table store. Mirrors the Postgres schema's unique and cascade rules.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn set<T>(slot: &mut T, value: &Option<T>)
where
    T: Clone,
{
    if let Some(v) = value {
        *slot = v.clone();
    }
}

fn set_opt<T>(slot: &mut Option<T>, value: &Option<T>)
where
    T: Clone,
{
    if value.is_some() {
        *slot = value.clone();
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> anyhow::Result<User> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.email == user.email) {
            anyhow::bail!("duplicate key value violates unique constraint \"users_email_key\"");
        }
        let created_at = t.now();
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            bio: user.bio,
            latitude: user.latitude,
            longitude: user.longitude,
            is_available: true,
            is_active: user.is_active,
            profile_completeness: 20,
            hashed_password: user.hashed_password,
            created_at,
        };
        t.users.push(row.clone());
        Ok(row)
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let t = self.tables.read().await;
        Ok(t.users.iter().rev().cloned().collect())
    }

    async fn update_user(&self, id: Uuid, patch: &UserPatch) -> anyhow::Result<Option<User>> {
        let mut t = self.tables.write().await;
        let Some(u) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        set(&mut u.full_name, &patch.full_name);
        set_opt(&mut u.phone, &patch.phone);
        set_opt(&mut u.bio, &patch.bio);
        set_opt(&mut u.latitude, &patch.latitude);
        set_opt(&mut u.longitude, &patch.longitude);
        set(&mut u.is_available, &patch.is_available);
        set(&mut u.is_active, &patch.is_active);
        Ok(Some(u.clone()))
    }

    async fn set_profile_completeness(&self, id: Uuid, score: i32) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        if let Some(u) = t.users.iter_mut().find(|u| u.id == id) {
            u.profile_completeness = score;
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        let removed = t.users.len() != before;
        if removed {
            t.skills.retain(|s| s.user_id != id);
            t.messages.retain(|m| m.sender_id != id && m.receiver_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn insert_admin(&self, admin: NewAdmin) -> anyhow::Result<Admin> {
        let mut t = self.tables.write().await;
        if t.admins.iter().any(|a| a.email == admin.email) {
            anyhow::bail!("duplicate key value violates unique constraint \"admins_email_key\"");
        }
        let created_at = t.now();
        let row = Admin {
            id: Uuid::new_v4(),
            email: admin.email,
            full_name: admin.full_name,
            role: admin.role,
            is_active: true,
            last_login: None,
            created_by: admin.created_by,
            hashed_password: admin.hashed_password,
            created_at,
        };
        t.admins.push(row.clone());
        Ok(row)
    }

    async fn find_admin(&self, id: Uuid) -> anyhow::Result<Option<Admin>> {
        let t = self.tables.read().await;
        Ok(t.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn find_admin_by_email(&self, email: &str) -> anyhow::Result<Option<Admin>> {
        let t = self.tables.read().await;
        Ok(t.admins.iter().find(|a| a.email == email).cloned())
    }

    async fn list_admins(&self) -> anyhow::Result<Vec<Admin>> {
        let t = self.tables.read().await;
        Ok(t.admins.iter().rev().cloned().collect())
    }

    async fn update_admin(&self, id: Uuid, patch: &AdminPatch) -> anyhow::Result<Option<Admin>> {
        let mut t = self.tables.write().await;
        let Some(a) = t.admins.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        set(&mut a.full_name, &patch.full_name);
        set(&mut a.role, &patch.role);
        set(&mut a.is_active, &patch.is_active);
        Ok(Some(a.clone()))
    }

    async fn record_admin_login(&self, id: Uuid) -> anyhow::Result<()> {
        let mut t = self.tables.write().await;
        let now = t.now();
        if let Some(a) = t.admins.iter_mut().find(|a| a.id == id) {
            a.last_login = Some(now);
        }
        Ok(())
    }

    async fn delete_admin(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        let before = t.admins.len();
        t.admins.retain(|a| a.id != id);
        let removed = t.admins.len() != before;
        if removed {
            for a in t.admins.iter_mut().filter(|a| a.created_by == Some(id)) {
                a.created_by = None;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> anyhow::Result<Vec<SkillCategory>> {
        let t = self.tables.read().await;
        let mut rows = t.categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_category(&self, id: Uuid) -> anyhow::Result<Option<SkillCategory>> {
        let t = self.tables.read().await;
        Ok(t.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> anyhow::Result<Option<SkillCategory>> {
        let t = self.tables.read().await;
        Ok(t.categories.iter().find(|c| c.name == name).cloned())
    }

    async fn insert_category(&self, category: NewCategory) -> anyhow::Result<SkillCategory> {
        let mut t = self.tables.write().await;
        if t.categories.iter().any(|c| c.name == category.name) {
            anyhow::bail!("duplicate key value violates unique constraint \"skill_categories_name_key\"");
        }
        let created_at = t.now();
        let row = SkillCategory {
            id: Uuid::new_v4(),
            name: category.name,
            description: category.description,
            icon: category.icon,
            created_at,
        };
        t.categories.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl SkillStore for MemoryStore {
    async fn insert_skill(&self, skill: NewSkill) -> anyhow::Result<Skill> {
        let mut t = self.tables.write().await;
        if !t.users.iter().any(|u| u.id == skill.user_id) {
            anyhow::bail!("insert on user_skills violates foreign key constraint on user_id");
        }
        if !t.categories.iter().any(|c| c.id == skill.category_id) {
            anyhow::bail!("insert on user_skills violates foreign key constraint on category_id");
        }
        let now = t.now();
        let row = Skill {
            id: Uuid::new_v4(),
            user_id: skill.user_id,
            category_id: skill.category_id,
            skill_name: skill.skill_name,
            description: skill.description,
            experience_years: skill.experience_years,
            hourly_rate: skill.hourly_rate,
            currency: skill.currency,
            is_available: skill.is_available,
            created_at: now,
            updated_at: now,
        };
        t.skills.push(row.clone());
        Ok(row)
    }

    async fn find_skill(&self, id: Uuid) -> anyhow::Result<Option<Skill>> {
        let t = self.tables.read().await;
        Ok(t.skills.iter().find(|s| s.id == id).cloned())
    }

    async fn list_skills_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Skill>> {
        let t = self.tables.read().await;
        Ok(t.skills.iter().filter(|s| s.user_id == user_id).cloned().collect())
    }

    async fn count_skills_for_user(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let t = self.tables.read().await;
        Ok(t.skills.iter().filter(|s| s.user_id == user_id).count() as i64)
    }

    async fn count_skills(&self) -> anyhow::Result<i64> {
        let t = self.tables.read().await;
        Ok(t.skills.len() as i64)
    }

    async fn update_skill(&self, id: Uuid, patch: &SkillPatch) -> anyhow::Result<Option<Skill>> {
        let mut t = self.tables.write().await;
        let now = t.now();
        let Some(s) = t.skills.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        set(&mut s.skill_name, &patch.skill_name);
        set_opt(&mut s.description, &patch.description);
        set(&mut s.experience_years, &patch.experience_years);
        set_opt(&mut s.hourly_rate, &patch.hourly_rate);
        set(&mut s.currency, &patch.currency);
        set(&mut s.is_available, &patch.is_available);
        s.updated_at = now;
        Ok(Some(s.clone()))
    }

    async fn delete_skill(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut t = self.tables.write().await;
        let before = t.skills.len();
        t.skills.retain(|s| s.id != id);
        Ok(t.skills.len() != before)
    }
}

#[async_trait]
impl ActivityLogStore for MemoryStore {
    async fn insert_activity(&self, entry: NewActivity) -> anyhow::Result<ActivityLogEntry> {
        let mut t = self.tables.write().await;
        let created_at = t.now();
        let row = ActivityLogEntry {
            id: Uuid::new_v4(),
            admin_id: entry.admin_id,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            details: entry.details,
            created_at,
        };
        t.activity.push(row.clone());
        Ok(row)
    }

    async fn recent_activity(&self, limit: i64) -> anyhow::Result<Vec<ActivityLogEntry>> {
        let t = self.tables.read().await;
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(t.activity.iter().rev().take(limit).cloned().collect())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message> {
        let mut t = self.tables.write().await;
        if !t.users.iter().any(|u| u.id == message.sender_id) {
            anyhow::bail!("insert on messages violates foreign key constraint on sender_id");
        }
        if !t.users.iter().any(|u| u.id == message.receiver_id) {
            anyhow::bail!("insert on messages violates foreign key constraint on receiver_id");
        }
        let created_at = t.now();
        let row = Message {
            id: Uuid::new_v4(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            message: message.message,
            is_read: false,
            created_at,
        };
        t.messages.push(row.clone());
        Ok(row)
    }

    async fn messages_for(&self, user_id: Uuid) -> anyhow::Result<Vec<Message>> {
        let t = self.tables.read().await;
        Ok(t.messages
            .iter()
            .filter(|m| m.sender_id == user_id || m.receiver_id == user_id)
            .cloned()
            .collect())
    }

    async fn messages_between(&self, a: Uuid, b: Uuid) -> anyhow::Result<Vec<Message>> {
        let t = self.tables.read().await;
        Ok(t.messages
            .iter()
            .filter(|m| {
                (m.sender_id == a && m.receiver_id == b) || (m.sender_id == b && m.receiver_id == a)
            })
            .cloned()
            .collect())
    }

    async fn mark_read(&self, sender: Uuid, receiver: Uuid) -> anyhow::Result<u64> {
        let mut t = self.tables.write().await;
        let mut changed = 0;
        for m in t
            .messages
            .iter_mut()
            .filter(|m| m.sender_id == sender && m.receiver_id == receiver && !m.is_read)
        {
            m.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }
}
