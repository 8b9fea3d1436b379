//! Route definitions for the shop directory

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .nest("/auth", auth_routes())
        // Public reads
        .merge(public_routes())
        // Protected writes
        .merge(protected_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
}

/// Discovery and read-only taxonomy routes
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/shops", get(handlers::list_shops))
        .route("/shops/:shop_id", get(handlers::get_shop))
        .route("/categories", get(handlers::list_categories))
        .route("/categories/:category_id", get(handlers::get_category))
        .route("/category-members", get(handlers::list_category_members))
        .route("/category-members/:member_id", get(handlers::get_category_member))
}

/// Routes that need a valid access token; role gates live in the handlers.
/// Everything under `/users` is ADMIN only.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/shops", post(handlers::create_shop))
        .route(
            "/shops/:shop_id",
            patch(handlers::update_shop).delete(handlers::delete_shop),
        )
        .route("/shops/:shop_id/approval", patch(handlers::update_shop_approval))
        .route("/categories", post(handlers::create_category))
        .route(
            "/categories/:category_id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route("/category-members", post(handlers::create_category_member))
        .route(
            "/category-members/:member_id",
            patch(handlers::update_category_member).delete(handlers::delete_category_member),
        )
        .route(
            "/shop-categories",
            post(handlers::link_shop_category).delete(handlers::unlink_shop_category),
        )
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/users/:user_id",
            get(handlers::get_user)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::config::{Config, DatabaseConfig, DiscoveryConfig, JwtConfig, ServerConfig};
    use crate::models::Role;
    use crate::{create_app, AppState};

    fn test_config() -> Config {
        Config {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: "postgres://localhost/shopfinder_test".to_string(),
                max_connections: 1,
                min_connections: 0,
                acquire_timeout_secs: 1,
            },
            jwt: JwtConfig {
                secret: "router-test-secret".to_string(),
                access_token_expiry: 3600,
                refresh_token_expiry: 604800,
            },
            discovery: DiscoveryConfig::default(),
            bootstrap_admin: None,
        }
    }

    /// Router over a pool that never connects unless a handler reaches the store
    fn app() -> (Router, AppState) {
        let config = test_config();
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database.url)
            .unwrap();
        let state = AppState::new(pool, config);
        (create_app(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_sort_is_rejected_before_the_store() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::get("/api/v1/shops?sort=password&page=0")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["fields"]["sort"], "invalid sort value");
        assert_eq!(body["error"]["fields"]["page"], "must be greater than zero");
    }

    #[tokio::test]
    async fn test_oversized_page_size_is_rejected() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::get("/api/v1/shops?page_size=101&coordinate=38.76%209.01")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["fields"]["page_size"], "must be a maximum of 100");
        assert!(body["error"]["fields"].get("coordinate").is_none());
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::post("/api/v1/categories")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"label":"Vehicle Type"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_forged_token_is_rejected() {
        let (app, _) = app();
        let response = app
            .oneshot(
                Request::delete("/api/v1/shops/1")
                    .header(AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_TOKEN");
    }

    #[tokio::test]
    async fn test_role_gate_refuses_sales() {
        let (app, state) = app();
        let token = state.tokens.mint(5, Role::Sales).unwrap();
        let response = app
            .oneshot(
                Request::delete("/api/v1/shops/1")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_operator_cannot_change_approval() {
        let (app, state) = app();
        let token = state.tokens.mint(6, Role::Operator).unwrap();
        let response = app
            .oneshot(
                Request::patch("/api/v1/shops/1/approval")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"approval_status":"APPROVED"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_invalid_shop_body_is_rejected_before_the_store() {
        let (app, state) = app();
        let token = state.tokens.mint(5, Role::Sales).unwrap();
        let response = app
            .oneshot(
                Request::post("/api/v1/shops")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name":"","phone_number":"123","email":"x","location":"Bole"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"]["fields"].get("name").is_some());
        assert!(body["error"]["fields"].get("phone_number").is_some());
        assert!(body["error"]["fields"].get("email").is_some());
    }

    #[tokio::test]
    async fn test_user_management_is_admin_only() {
        let (app, state) = app();
        let token = state.tokens.mint(6, Role::Operator).unwrap();
        let response = app
            .oneshot(
                Request::post("/api/v1/users")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name":"Sara","email":"sara@shops.et","password":"correct horse","phone_number":"0712345678","role":"ADMIN"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "INSUFFICIENT_PERMISSIONS"
        );
    }

    #[tokio::test]
    async fn test_user_listing_requires_token() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::get("/api/v1/users").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_user_listing_validates_before_the_store() {
        let (app, state) = app();
        let token = state.tokens.mint(1, Role::Admin).unwrap();
        let response = app
            .oneshot(
                Request::get("/api/v1/users?role=OWNER&sort=password&page_size=0")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["error"]["fields"]["role"],
            "must be one of ADMIN, OPERATOR or SALES"
        );
        assert_eq!(body["error"]["fields"]["sort"], "invalid sort value");
        assert_eq!(body["error"]["fields"]["page_size"], "must be greater than zero");
    }

    #[tokio::test]
    async fn test_invalid_user_body_is_rejected_before_the_store() {
        let (app, state) = app();
        let token = state.tokens.mint(1, Role::Admin).unwrap();
        let response = app
            .oneshot(
                Request::post("/api/v1/users")
                    .header(AUTHORIZATION, format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name":"Sara","email":"sara","password":"short","phone_number":"0712345678","role":"SALES"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert!(body["error"]["fields"].get("email").is_some());
        assert!(body["error"]["fields"].get("password").is_some());
        assert!(body["error"]["fields"].get("name").is_none());
    }
}
