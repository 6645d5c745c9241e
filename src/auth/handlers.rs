use axum::{extract::State, http::StatusCode, Json};
use tracing::instrument;

use crate::auth::dto::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginData, LoginRequest, RefreshRequest,
    ResetPasswordRequest, VerifiedData, VerifyOtpRequest,
};
use crate::auth::extractors::AuthUser;
use crate::auth::jwt::TokenPair;
use crate::auth::otp::{OtpCode, OtpPurpose};
use crate::auth::services;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

type Reply<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Reply<LoginData> {
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail(
                "Email and password are required",
                "Email and password are required",
            )),
        ));
    }

    let result = services::login(&state, &email, &password).await?;
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result.into_api())))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Reply<TokenPair> {
    let token = payload.refresh_token.unwrap_or_default();
    if token.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail(
                "Refresh token is required",
                "Please provide a refresh token",
            )),
        ));
    }

    let result = services::refresh(&state, &token).await?;
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    Ok((status, Json(result.into_api())))
}

#[instrument(skip(state, user, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Reply<()> {
    let old_password = payload.old_password.unwrap_or_default();
    let new_password = payload.new_password.unwrap_or_default();

    let result =
        services::change_password(&state, user.0.sub, &old_password, &new_password).await?;
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result.into_api())))
}

/// Always answers 200: whether or not the account exists must look the same
/// from the outside. The envelope's success flag still distinguishes the
/// deliberately revealed cases (deactivated account, send failure).
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Reply<()> {
    let email = payload.email.unwrap_or_default();
    let result = services::forgot_password(&state, &email).await?;
    Ok((StatusCode::OK, Json(result.into_api())))
}

#[instrument(skip(state, payload))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Reply<VerifiedData> {
    let email = payload.email.unwrap_or_default();
    let otp = payload.otp.unwrap_or_default();
    if email.is_empty() || otp.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail(
                "Email and OTP are required",
                "Please provide both email and OTP",
            )),
        ));
    }

    let outcome = OtpCode::verify(&state.db, &email, &otp, OtpPurpose::PasswordReset).await?;
    if !outcome.valid {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail(outcome.message, outcome.message)),
        ));
    }

    Ok((
        StatusCode::OK,
        Json(ApiResponse::ok(
            "OTP verified successfully",
            VerifiedData { verified: true },
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Reply<()> {
    let email = payload.email.unwrap_or_default();
    let otp = payload.otp.unwrap_or_default();
    let new_password = payload.new_password.unwrap_or_default();

    let result = services::reset_password(&state, &email, &otp, &new_password).await?;
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result.into_api())))
}

/// Stateless no-op: tokens stay valid until natural expiry; clients discard
/// them locally.
#[instrument(skip(_user))]
pub async fn logout(_user: AuthUser) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::ok_empty("Logged out successfully")),
    )
}
