use sqlx::PgPool;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserUpdate};

const USER_COLUMNS: &str = "id, email, password_hash, full_name, phone_number, profile_image_url, \
     preferred_currency, role, date_registered, last_login, is_active, balance_visibility_default";

/// Returns the violated constraint name when `err` is a Postgres unique
/// violation, letting callers map it onto a field-scoped duplicate error.
pub fn unique_violation(err: &anyhow::Error) -> Option<&str> {
    let sqlx::Error::Database(db) = err.downcast_ref::<sqlx::Error>()? else {
        return None;
    };
    if db.code().as_deref() == Some("23505") {
        db.constraint()
    } else {
        None
    }
}

impl User {
    /// Find a user by email. Lookups are case-insensitive: the column holds
    /// the lower-cased form and the argument is normalized to match.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 LIMIT 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_phone_number(db: &PgPool, phone: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE phone_number = $1 LIMIT 1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(phone)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Insert a new user. Role, timestamps and flags come from column
    /// defaults; a unique violation here means the caller lost the
    /// check-then-create race and should report a duplicate.
    pub async fn create(db: &PgPool, new: &NewUser) -> anyhow::Result<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, full_name, phone_number, \
             profile_image_url, preferred_currency) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.full_name)
            .bind(&new.phone_number)
            .bind(&new.profile_image_url)
            .bind(new.preferred_currency)
            .fetch_one(db)
            .await?;
        Ok(user)
    }

    pub async fn update_last_login(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Partial update with COALESCE semantics: absent fields keep their
    /// current value. Returns the updated row, or `None` when the id does
    /// not exist.
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        changes: &UserUpdate,
    ) -> anyhow::Result<Option<User>> {
        let sql = format!(
            "UPDATE users SET \
             email = COALESCE($2, email), \
             full_name = COALESCE($3, full_name), \
             phone_number = COALESCE($4, phone_number), \
             profile_image_url = COALESCE($5, profile_image_url), \
             preferred_currency = COALESCE($6, preferred_currency), \
             balance_visibility_default = COALESCE($7, balance_visibility_default) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.email.as_ref().map(|e| e.trim().to_lowercase()))
            .bind(&changes.full_name)
            .bind(&changes.phone_number)
            .bind(&changes.profile_image_url)
            .bind(changes.preferred_currency)
            .bind(changes.balance_visibility_default)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Soft delete: the row stays readable but `is_active` goes false, which
    /// login and refresh both reject. Returns whether a row was touched.
    pub async fn soft_delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
