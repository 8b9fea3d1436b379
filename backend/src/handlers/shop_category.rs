//! Shop category link handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::middleware::{CurrentUser, STAFF_ROLES};
use crate::models::ShopCategoryLink;
use crate::services::ShopCategoryService;
use crate::AppState;

pub async fn link_shop_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(link): Json<ShopCategoryLink>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = ShopCategoryService::new(state.db.clone());

    match service.link(link).await {
        Ok(link) => (StatusCode::CREATED, Json(link)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn unlink_shop_category(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(link): Json<ShopCategoryLink>,
) -> impl IntoResponse {
    if let Err(e) = user.require_any_role(STAFF_ROLES) {
        return e.into_response();
    }

    let service = ShopCategoryService::new(state.db.clone());

    match service.unlink(link).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}
