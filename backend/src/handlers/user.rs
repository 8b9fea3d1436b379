//! User management HTTP handlers (ADMIN only)

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::models::Role;
use crate::services::user::{CreateUserInput, UpdateUserInput};
use crate::services::UserService;
use crate::AppState;
use shared::discovery::normalize_user_filter;

fn service(state: &AppState) -> UserService {
    UserService::new(state.db.clone(), state.config.discovery.query_timeout())
}

/// List users filtered by name and role
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(&[Role::Admin]) {
        return e.into_response();
    }

    let filter = match normalize_user_filter(&params, &state.config.discovery.filter_defaults()) {
        Ok(filter) => filter,
        Err(errors) => return AppError::FailedValidation(errors).into_response(),
    };

    match service(&state).list_users(&filter).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(&[Role::Admin]) {
        return e.into_response();
    }

    match service(&state).get_user(user_id).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(&[Role::Admin]) {
        return e.into_response();
    }

    match service(&state).create_user(input).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
    Json(input): Json<UpdateUserInput>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(&[Role::Admin]) {
        return e.into_response();
    }

    match service(&state).update_user(user_id, input).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(&[Role::Admin]) {
        return e.into_response();
    }

    match service(&state).delete_user(user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
