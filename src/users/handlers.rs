use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::users::dto::{CreateUserRequest, EmailQuery, PublicUser, UpdateUserRequest};
use crate::users::repo_types::UserRole;
use crate::users::services;

type Reply<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Reply<PublicUser> {
    let result = services::create_user(&state, payload).await?;
    let status = if result.success {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result.into_api())))
}

#[instrument(skip(state))]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Reply<PublicUser> {
    match services::get_user_by_id(&state, user_id).await? {
        Some(user) => Ok((
            StatusCode::OK,
            Json(ApiResponse::ok("User retrieved successfully", user)),
        )),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::fail(
                "User not found",
                "No user exists with the provided ID",
            )),
        )),
    }
}

#[instrument(skip(state))]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Reply<PublicUser> {
    let email = query.email.unwrap_or_default();
    if email.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::fail(
                "Email is required",
                "Email query parameter is required",
            )),
        ));
    }

    match services::get_user_by_email(&state, &email).await? {
        Some(user) => Ok((
            StatusCode::OK,
            Json(ApiResponse::ok("User retrieved successfully", user)),
        )),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(ApiResponse::fail(
                "User not found",
                "No user exists with the provided email",
            )),
        )),
    }
}

// Profile mutations are limited to the owner or an admin.
fn authorize_self_or_admin(user: &AuthUser, target: Uuid) -> Result<(), ApiError> {
    if user.0.sub == target || user.0.role == UserRole::Admin {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[instrument(skip(state, user, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Reply<PublicUser> {
    authorize_self_or_admin(&user, user_id)?;

    let result = services::update_user(&state, user_id, payload).await?;
    let status = if result.success {
        StatusCode::OK
    } else if result.message == "User not found" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result.into_api())))
}

#[instrument(skip(state, user))]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(user_id): Path<Uuid>,
) -> Reply<()> {
    authorize_self_or_admin(&user, user_id)?;

    let result = services::soft_delete_user(&state, user_id).await?;
    let status = if result.success {
        StatusCode::OK
    } else if result.message == "User not found" {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result.into_api())))
}
