use serde::Deserialize;
use validator::Validate;

use crate::store::UserPatch;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
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
}

impl From<ProfileUpdate> for UserPatch {
    fn from(p: ProfileUpdate) -> Self {
        Self {
            full_name: p.full_name,
            phone: p.phone,
            bio: p.bio,
            latitude: p.latitude,
            longitude: p.longitude,
            is_available: p.is_available,
            is_active: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LocationUpdate {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude must be within -90..=90"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude must be within -180..=180"))]
    pub longitude: f64,
}
