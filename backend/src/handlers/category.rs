//! Category and category member HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::middleware::{CurrentUser, STAFF_ROLES};
use crate::services::category::CategoryInput;
use crate::services::category_member::{CreateMemberInput, UpdateMemberInput};
use crate::services::{CategoryMemberService, CategoryService};
use crate::AppState;

/// List all categories
pub async fn list_categories(State(state): State<AppState>) -> impl IntoResponse {
    let service = CategoryService::new(state.db.clone());

    match service.list_categories().await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> impl IntoResponse {
    let service = CategoryService::new(state.db.clone());

    match service.get_category(category_id).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CategoryInput>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = CategoryService::new(state.db.clone());

    match service.create_category(input).await {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(category_id): Path<i64>,
    Json(input): Json<CategoryInput>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = CategoryService::new(state.db.clone());

    match service.update_category(category_id, input).await {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(category_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = CategoryService::new(state.db.clone());

    match service.delete_category(category_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// List all category members
pub async fn list_category_members(State(state): State<AppState>) -> impl IntoResponse {
    let service = CategoryMemberService::new(state.db.clone());

    match service.list_members().await {
        Ok(list) => (StatusCode::OK, Json(list)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_category_member(
    State(state): State<AppState>,
    Path(member_id): Path<i64>,
) -> impl IntoResponse {
    let service = CategoryMemberService::new(state.db.clone());

    match service.get_member(member_id).await {
        Ok(member) => (StatusCode::OK, Json(member)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn create_category_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateMemberInput>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = CategoryMemberService::new(state.db.clone());

    match service.create_member(input).await {
        Ok(member) => (StatusCode::CREATED, Json(member)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn update_category_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(member_id): Path<i64>,
    Json(input): Json<UpdateMemberInput>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = CategoryMemberService::new(state.db.clone());

    match service.update_member(member_id, input).await {
        Ok(member) => (StatusCode::OK, Json(member)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn delete_category_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(member_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = CategoryMemberService::new(state.db.clone());

    match service.delete_member(member_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
