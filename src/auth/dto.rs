use serde::{Deserialize, Serialize};

use crate::auth::jwt::TokenPair;
use crate::users::dto::PublicUser;

// Request fields are optional so missing values surface as business
// validation messages instead of deserialization rejections.

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub new_password: Option<String>,
}

/// Login payload: the user (hash stripped) plus the token pair.
#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: PublicUser,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct VerifiedData {
    pub verified: bool,
}
