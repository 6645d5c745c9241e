use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{Currency, User, UserRole};

/// Raw registration input. Fields are optional so the validator can report
/// every missing field instead of failing at the deserialization layer.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub preferred_currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub preferred_currency: Option<String>,
    pub balance_visibility_default: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// Outward-facing projection of a user: everything except the hash.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub profile_image_url: Option<String>,
    pub preferred_currency: Currency,
    pub role: UserRole,
    #[serde(with = "time::serde::rfc3339")]
    pub date_registered: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login: Option<OffsetDateTime>,
    pub is_active: bool,
    pub balance_visibility_default: bool,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            profile_image_url: user.profile_image_url,
            preferred_currency: user.preferred_currency,
            role: user.role,
            date_registered: user.date_registered,
            last_login: user.last_login,
            is_active: user.is_active,
            balance_visibility_default: user.balance_visibility_default,
        }
    }
}
