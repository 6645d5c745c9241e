use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Supported settlement currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "currency", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Ngn,
    Usd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String, // stored lower-cased
    #[serde(skip_serializing)]
    pub password_hash: String, // never exposed in JSON
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

/// Fields supplied when inserting a new user. Everything else is a column
/// default (role, timestamps, flags).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone_number: String,
    pub profile_image_url: Option<String>,
    pub preferred_currency: Currency,
}

/// Partial update; `None` leaves the column untouched. Id, password hash and
/// registration time are deliberately not updatable through this path.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub preferred_currency: Option<Currency>,
    pub balance_visibility_default: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_user_never_contains_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".into(),
            full_name: "Ada Obi".into(),
            phone_number: "+2348012345678".into(),
            profile_image_url: None,
            preferred_currency: Currency::Ngn,
            role: UserRole::User,
            date_registered: OffsetDateTime::now_utc(),
            last_login: None,
            is_active: true,
            balance_visibility_default: true,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn currency_and_role_serialize_as_wire_strings() {
        assert_eq!(serde_json::to_string(&Currency::Ngn).unwrap(), "\"NGN\"");
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        let role: UserRole = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, UserRole::User);
    }
}
