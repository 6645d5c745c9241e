use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

/// A code dies after this many matching verify calls, valid or not.
pub const OTP_MAX_ATTEMPTS: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "otp_purpose", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    PasswordReset,
    EmailVerification,
}

/// One-time-code record scoped to an email + purpose.
#[derive(Debug, Clone, FromRow)]
pub struct OtpCode {
    pub id: Uuid,
    pub email: String,
    pub code: String,
    pub purpose: OtpPurpose,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub attempts: i32,
    pub is_used: bool,
}

/// Outcome of a verify call; `message` is surfaced verbatim to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpOutcome {
    pub valid: bool,
    pub message: &'static str,
}

/// 6-digit code drawn uniformly from [100000, 999999] with the OS CSPRNG.
fn generate_code() -> String {
    OsRng.gen_range(100_000..=999_999u32).to_string()
}

impl OtpCode {
    /// Create a fresh code for (email, purpose), replacing any outstanding
    /// unused one. Delete + insert run in a single transaction so there is
    /// never more than one live code per pair.
    pub async fn issue(
        db: &PgPool,
        email: &str,
        purpose: OtpPurpose,
        ttl_minutes: i64,
    ) -> anyhow::Result<String> {
        let email = email.trim().to_lowercase();
        let code = generate_code();
        let expires_at = OffsetDateTime::now_utc() + Duration::minutes(ttl_minutes);

        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM otp_codes WHERE email = $1 AND purpose = $2 AND is_used = FALSE")
            .bind(&email)
            .bind(purpose)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO otp_codes (email, code, purpose, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&email)
        .bind(&code)
        .bind(purpose)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!(email = %email, purpose = ?purpose, "otp issued");
        Ok(code)
    }

    /// Check a submitted code. The row is locked for the duration so two
    /// concurrent verifies cannot both spend the same attempt.
    pub async fn verify(
        db: &PgPool,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> anyhow::Result<OtpOutcome> {
        let email = email.trim().to_lowercase();

        let mut tx = db.begin().await?;
        let record = sqlx::query_as::<_, OtpCode>(
            "SELECT id, email, code, purpose, created_at, expires_at, attempts, is_used \
             FROM otp_codes \
             WHERE email = $1 AND code = $2 AND purpose = $3 AND is_used = FALSE \
             LIMIT 1 FOR UPDATE",
        )
        .bind(&email)
        .bind(code)
        .bind(purpose)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(record) = record else {
            return Ok(OtpOutcome {
                valid: false,
                message: "Invalid OTP",
            });
        };

        if OffsetDateTime::now_utc() > record.expires_at {
            sqlx::query("DELETE FROM otp_codes WHERE id = $1")
                .bind(record.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(OtpOutcome {
                valid: false,
                message: "OTP has expired",
            });
        }

        if record.attempts >= OTP_MAX_ATTEMPTS {
            sqlx::query("DELETE FROM otp_codes WHERE id = $1")
                .bind(record.id)
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(OtpOutcome {
                valid: false,
                message: "Too many attempts. Please request a new OTP",
            });
        }

        // Every matching verify spends one attempt, successful ones included.
        sqlx::query("UPDATE otp_codes SET attempts = attempts + 1 WHERE id = $1")
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(OtpOutcome {
            valid: true,
            message: "OTP verified successfully",
        })
    }

    /// Flip `is_used` after a completed reset. Silent no-op when the record
    /// is gone or already consumed.
    pub async fn mark_used(
        db: &PgPool,
        email: &str,
        code: &str,
        purpose: OtpPurpose,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE otp_codes SET is_used = TRUE \
             WHERE email = $1 AND code = $2 AND purpose = $3 AND is_used = FALSE",
        )
        .bind(email.trim().to_lowercase())
        .bind(code)
        .bind(purpose)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Reap every record past expiry, used or not, any purpose. Returns the
    /// number deleted; running it twice back-to-back deletes nothing the
    /// second time.
    pub async fn cleanup_expired(db: &PgPool) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at < NOW()")
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digit_numerics() {
        for _ in 0..1000 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().expect("code should be numeric");
            assert!((100_000..=999_999).contains(&n));
        }
    }

    #[test]
    fn purpose_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&OtpPurpose::PasswordReset).unwrap(),
            "\"password_reset\""
        );
        assert_eq!(
            serde_json::to_string(&OtpPurpose::EmailVerification).unwrap(),
            "\"email_verification\""
        );
    }
}
