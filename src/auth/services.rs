use axum::extract::FromRef;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::jwt::{JwtKeys, TokenPair};
use crate::auth::otp::{OtpCode, OtpPurpose};
use crate::auth::password::{hash_password, verify_password};
use crate::email::{send_otp_email, send_password_changed_email};
use crate::response::ServiceResponse;
use crate::state::AppState;
use crate::users::repo_types::User;

use super::dto::LoginData;

// Absent user and wrong password must be indistinguishable to the caller.
const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn invalid_credentials() -> ServiceResponse<LoginData> {
    ServiceResponse::fail(INVALID_CREDENTIALS, "credentials", INVALID_CREDENTIALS)
}

pub async fn login(
    state: &AppState,
    email: &str,
    password: &str,
) -> anyhow::Result<ServiceResponse<LoginData>> {
    let Some(user) = User::find_by_email(&state.db, email).await? else {
        return Ok(invalid_credentials());
    };

    if !user.is_active {
        return Ok(ServiceResponse::fail(
            "Account is deactivated",
            "account",
            "Account is deactivated. Please contact support.",
        ));
    }

    if !verify_password(password, &user.password_hash)? {
        return Ok(invalid_credentials());
    }

    // Best-effort; a failed timestamp write must not block the login.
    if let Err(e) = User::update_last_login(&state.db, user.id).await {
        warn!(error = %e, user_id = %user.id, "failed to update last login");
    }

    let keys = JwtKeys::from_ref(state);
    let tokens = keys.generate(user.id, &user.email, user.role)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(ServiceResponse::ok(
        "Login successful",
        LoginData {
            user: user.into(),
            tokens,
        },
    ))
}

/// Exchange a refresh token for a fresh pair. Account state is re-checked
/// here since tokens carry no revocation; the refresh token itself is not
/// rotated and stays valid until natural expiry.
pub async fn refresh(
    state: &AppState,
    refresh_token: &str,
) -> anyhow::Result<ServiceResponse<TokenPair>> {
    let keys = JwtKeys::from_ref(state);
    let claims = match keys.verify_refresh(refresh_token) {
        Ok(c) => c,
        Err(_) => {
            return Ok(ServiceResponse::fail(
                "Invalid refresh token",
                "token",
                "Invalid or expired refresh token",
            ))
        }
    };

    let Some(user) = User::find_by_id(&state.db, claims.sub).await? else {
        return Ok(ServiceResponse::fail(
            "User not found",
            "user",
            "User not found",
        ));
    };
    if !user.is_active {
        return Ok(ServiceResponse::fail(
            "User account is inactive",
            "user",
            "User account is inactive",
        ));
    }

    let tokens = keys.generate(user.id, &user.email, user.role)?;
    info!(user_id = %user.id, "tokens refreshed");
    Ok(ServiceResponse::ok("Token refreshed successfully", tokens))
}

pub async fn change_password(
    state: &AppState,
    user_id: Uuid,
    old_password: &str,
    new_password: &str,
) -> anyhow::Result<ServiceResponse<()>> {
    if old_password.is_empty() || new_password.is_empty() {
        return Ok(ServiceResponse::fail(
            "Old password and new password are required",
            "password",
            "Old password and new password are required",
        ));
    }
    if new_password.len() < 8 {
        return Ok(ServiceResponse::fail(
            "New password must be at least 8 characters long",
            "newPassword",
            "Password must be at least 8 characters long",
        ));
    }
    if old_password == new_password {
        return Ok(ServiceResponse::fail(
            "New password must be different from old password",
            "newPassword",
            "New password must be different from old password",
        ));
    }

    let Some(user) = User::find_by_id(&state.db, user_id).await? else {
        return Ok(ServiceResponse::fail(
            "User not found",
            "user",
            "User not found",
        ));
    };

    if !verify_password(old_password, &user.password_hash)? {
        return Ok(ServiceResponse::fail(
            "Incorrect old password",
            "oldPassword",
            "The old password you entered is incorrect",
        ));
    }

    let new_hash = hash_password(new_password)?;
    User::update_password(&state.db, user.id, &new_hash).await?;
    info!(user_id = %user.id, "password changed");

    // The password is already changed; a lost confirmation email is not a
    // failure of the operation.
    if !send_password_changed_email(state.mailer.as_ref(), &user.email, &user.full_name).await {
        warn!(user_id = %user.id, "password-changed confirmation email not sent");
    }

    Ok(ServiceResponse::ok_empty("Password changed successfully"))
}

/// Issue a password-reset code. A nonexistent address still reports success
/// so callers cannot probe which accounts exist; a deactivated account is
/// deliberately revealed as such.
pub async fn forgot_password(
    state: &AppState,
    email: &str,
) -> anyhow::Result<ServiceResponse<()>> {
    if email.is_empty() {
        return Ok(ServiceResponse::fail(
            "Email is required",
            "email",
            "Email is required",
        ));
    }

    let Some(user) = User::find_by_email(&state.db, email).await? else {
        return Ok(ServiceResponse::ok_empty(
            "If an account exists with this email, a password reset OTP has been sent",
        ));
    };

    if !user.is_active {
        return Ok(ServiceResponse::fail(
            "Account is deactivated",
            "account",
            "This account is deactivated. Please contact support.",
        ));
    }

    let ttl = state.config.otp_ttl_minutes;
    let otp = OtpCode::issue(&state.db, &user.email, OtpPurpose::PasswordReset, ttl).await?;

    if !send_otp_email(state.mailer.as_ref(), &user.email, &otp, ttl).await {
        return Ok(ServiceResponse::fail(
            "Failed to send OTP email",
            "email",
            "Failed to send OTP. Please try again.",
        ));
    }

    info!(user_id = %user.id, "password reset otp sent");
    Ok(ServiceResponse::ok_empty(
        "Password reset OTP has been sent to your email",
    ))
}

pub async fn reset_password(
    state: &AppState,
    email: &str,
    otp: &str,
    new_password: &str,
) -> anyhow::Result<ServiceResponse<()>> {
    if email.is_empty() || otp.is_empty() || new_password.is_empty() {
        return Ok(ServiceResponse::fail(
            "Email, OTP, and new password are required",
            "input",
            "All fields are required",
        ));
    }
    if new_password.len() < 8 {
        return Ok(ServiceResponse::fail(
            "New password must be at least 8 characters long",
            "newPassword",
            "Password must be at least 8 characters long",
        ));
    }

    let outcome = OtpCode::verify(&state.db, email, otp, OtpPurpose::PasswordReset).await?;
    if !outcome.valid {
        return Ok(ServiceResponse::fail(outcome.message, "otp", outcome.message));
    }

    let Some(user) = User::find_by_email(&state.db, email).await? else {
        return Ok(ServiceResponse::fail(
            "User not found",
            "email",
            "No account found with this email",
        ));
    };

    let new_hash = hash_password(new_password)?;
    User::update_password(&state.db, user.id, &new_hash).await?;

    // Consumed only after the password write; a crash in between leaves the
    // code spendable within its remaining attempt budget.
    if let Err(e) = OtpCode::mark_used(&state.db, email, otp, OtpPurpose::PasswordReset).await {
        warn!(error = %e, user_id = %user.id, "failed to mark otp as used");
    }

    if !send_password_changed_email(state.mailer.as_ref(), &user.email, &user.full_name).await {
        warn!(user_id = %user.id, "password-reset confirmation email not sent");
    }

    info!(user_id = %user.id, "password reset");
    Ok(ServiceResponse::ok_empty("Password reset successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // These paths reject before any query is issued, so the lazily
    // connecting pool in AppState::fake() is never touched.

    #[tokio::test]
    async fn change_password_requires_both_fields() {
        let state = AppState::fake();
        let result = change_password(&state, Uuid::new_v4(), "", "N3wPassword!")
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Old password and new password are required");
    }

    #[tokio::test]
    async fn change_password_rejects_short_new_password() {
        let state = AppState::fake();
        let result = change_password(&state, Uuid::new_v4(), "OldPass123!", "short")
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "New password must be at least 8 characters long");
        let errors = result.errors.unwrap();
        assert_eq!(errors[0].field, "newPassword");
    }

    #[tokio::test]
    async fn change_password_rejects_unchanged_password() {
        let state = AppState::fake();
        let result = change_password(&state, Uuid::new_v4(), "SamePass123!", "SamePass123!")
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(
            result.message,
            "New password must be different from old password"
        );
    }

    #[tokio::test]
    async fn forgot_password_requires_email() {
        let state = AppState::fake();
        let result = forgot_password(&state, "").await.unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Email is required");
    }

    #[tokio::test]
    async fn reset_password_requires_all_fields() {
        let state = AppState::fake();
        let result = reset_password(&state, "user@example.com", "", "N3wPassword!")
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "Email, OTP, and new password are required");
    }

    #[tokio::test]
    async fn reset_password_rejects_short_new_password() {
        let state = AppState::fake();
        let result = reset_password(&state, "user@example.com", "123456", "short")
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.message, "New password must be at least 8 characters long");
    }
}
