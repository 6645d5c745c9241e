use axum::{routing::post, Router};

use crate::state::AppState;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod jwt;
pub mod otp;
pub mod password;
pub mod services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::login))
        .route("/auth/refresh", post(handlers::refresh))
        .route("/auth/change-password", post(handlers::change_password))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/verify-otp", post(handlers::verify_otp))
        .route("/auth/reset-password", post(handlers::reset_password))
        .route("/auth/logout", post(handlers::logout))
}
