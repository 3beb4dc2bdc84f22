use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::store::{NewCategory, SkillPatch};

fn default_currency() -> String {
    "USD".into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryCreate {
    #[validate(length(min = 2, max = 100, message = "name must be 2 to 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 100, message = "icon must be at most 100 characters"))]
    pub icon: Option<String>,
}

impl From<CategoryCreate> for NewCategory {
    fn from(c: CategoryCreate) -> Self {
        Self {
            name: c.name.trim().to_string(),
            description: c.description,
            icon: c.icon,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SkillCreate {
    pub category_id: Uuid,
    #[validate(length(min = 2, max = 100, message = "skill_name must be 2 to 100 characters"))]
    pub skill_name: String,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 50, message = "experience_years must be within 0..=50"))]
    pub experience_years: i32,
    #[validate(range(min = 0.0, max = 10000.0, message = "hourly_rate must be within 0..=10000"))]
    pub hourly_rate: Option<f64>,
    #[serde(default = "default_currency")]
    #[validate(length(min = 1, max = 3, message = "currency must be 1 to 3 characters"))]
    pub currency: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SkillUpdate {
    #[validate(length(min = 2, max = 100, message = "skill_name must be 2 to 100 characters"))]
    pub skill_name: Option<String>,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 50, message = "experience_years must be within 0..=50"))]
    pub experience_years: Option<i32>,
    #[validate(range(min = 0.0, max = 10000.0, message = "hourly_rate must be within 0..=10000"))]
    pub hourly_rate: Option<f64>,
    #[validate(length(min = 1, max = 3, message = "currency must be 1 to 3 characters"))]
    pub currency: Option<String>,
    pub is_available: Option<bool>,
}

impl From<SkillUpdate> for SkillPatch {
    fn from(u: SkillUpdate) -> Self {
        Self {
            skill_name: u.skill_name,
            description: u.description,
            experience_years: u.experience_years,
            hourly_rate: u.hourly_rate,
            currency: u.currency,
            is_available: u.is_available,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_create_applies_defaults() {
        let body = serde_json::json!({
            "category_id": Uuid::new_v4(),
            "skill_name": "Residential Plumbing",
        });
        let skill: SkillCreate = serde_json::from_value(body).unwrap();
        assert_eq!(skill.currency, "USD");
        assert_eq!(skill.experience_years, 0);
        assert!(skill.is_available);
        assert!(skill.validate().is_ok());
    }

    #[test]
    fn skill_create_rejects_out_of_range_numbers() {
        let body = serde_json::json!({
            "category_id": Uuid::new_v4(),
            "skill_name": "Welding",
            "experience_years": 51,
            "hourly_rate": -1.0,
            "currency": "EURO",
        });
        let skill: SkillCreate = serde_json::from_value(body).unwrap();
        let errors = skill.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("experience_years"));
        assert!(fields.contains_key("hourly_rate"));
        assert!(fields.contains_key("currency"));
    }
}
