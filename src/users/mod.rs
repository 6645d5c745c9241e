use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validate;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            post(handlers::create_user).get(handlers::get_user_by_email),
        )
        .route(
            "/users/:user_id",
            get(handlers::get_user_by_id)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
