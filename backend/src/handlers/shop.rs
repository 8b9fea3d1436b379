//! Shop HTTP handlers, including discovery

use std::collections::HashMap;

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::error::AppError;
use crate::middleware::{CurrentUser, STAFF_ROLES};
use crate::models::Role;
use crate::services::shop::{CreateShopInput, UpdateApprovalInput, UpdateShopInput};
use crate::services::{DiscoveryService, ShopService};
use crate::AppState;
use shared::discovery::normalize;

/// Search shops by name, distance and category members
pub async fn list_shops(
    State(state): State<AppState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let filter = match normalize(&params, &state.config.discovery.filter_defaults()) {
        Ok(filter) => filter,
        Err(errors) => return AppError::FailedValidation(errors).into_response(),
    };

    let service = DiscoveryService::new(state.db.clone(), state.config.discovery.query_timeout());

    match service.search(&filter).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            tracing::error!(%method, path = uri.path(), "Shop discovery failed");
            e.into_response()
        }
    }
}

/// Get a specific shop
pub async fn get_shop(
    State(state): State<AppState>,
    Path(shop_id): Path<i64>,
) -> impl IntoResponse {
    let service = ShopService::new(state.db.clone());

    match service.get_shop(shop_id).await {
        Ok(shop) => (StatusCode::OK, Json(shop)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create a new shop
pub async fn create_shop(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<CreateShopInput>,
) -> impl IntoResponse {
    let service = ShopService::new(state.db.clone());

    match service.create_shop(user.user_id, input).await {
        Ok(shop) => (StatusCode::CREATED, Json(shop)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Update a shop
pub async fn update_shop(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(shop_id): Path<i64>,
    Json(input): Json<UpdateShopInput>,
) -> impl IntoResponse {
    let service = ShopService::new(state.db.clone());

    match service.update_shop(shop_id, input).await {
        Ok(shop) => (StatusCode::OK, Json(shop)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Delete a shop
pub async fn delete_shop(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(shop_id): Path<i64>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = ShopService::new(state.db.clone());

    match service.delete_shop(shop_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Approve or decline a shop
pub async fn update_shop_approval(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(shop_id): Path<i64>,
    Json(input): Json<UpdateApprovalInput>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(&[Role::Admin]) {
        return e.into_response();
    }

    let service = ShopService::new(state.db.clone());

    match service.update_approval(shop_id, input.approval_status).await {
        Ok(shop) => (StatusCode::OK, Json(shop)).into_response(),
        Err(e) => e.into_response(),
    }
}
