//! API layer - HTTP handlers and routing
//!
//! Route map:
//! - /api/auth: register, login (public); change-password, me (bearer)
//! - /api/posts, /api/pages, /api/media, /api/users, /api/categories,
//!   /api/tags: GET list and GET by id public; POST, PATCH, DELETE bearer

pub mod auth;
pub mod common;
mod content;
pub mod media;
pub mod middleware;
pub mod pages;
pub mod posts;
pub mod responses;
pub mod terms;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};
pub use responses::Paginated;

/// Build the API router: every resource merges its public routes with its
/// bearer-guarded ones under a single prefix.
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let guard = || {
        axum_middleware::from_fn_with_state(state.clone(), middleware::require_auth)
    };

    Router::new()
        .nest(
            "/auth",
            auth::public_router().merge(auth::protected_router().route_layer(guard())),
        )
        .nest(
            "/posts",
            posts::public_router().merge(posts::protected_router().route_layer(guard())),
        )
        .nest(
            "/pages",
            pages::public_router().merge(pages::protected_router().route_layer(guard())),
        )
        .nest(
            "/media",
            media::public_router().merge(media::protected_router().route_layer(guard())),
        )
        .nest(
            "/users",
            users::public_router().merge(users::protected_router().route_layer(guard())),
        )
        .nest(
            "/categories",
            terms::categories_public_router()
                .merge(terms::categories_protected_router().route_layer(guard())),
        )
        .nest(
            "/tags",
            terms::tags_public_router()
                .merge(terms::tags_protected_router().route_layer(guard())),
        )
}

/// Build the complete router with CORS and request tracing.
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(
            cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", cors_origin, e))?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::UploadConfig;
    use crate::db::repositories::{
        SqlxContentRepository, SqlxTermRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ContentType, Taxonomy};
    use crate::services::{
        AuthService, ContentService, TermService, TokenService, UserAdminService,
    };
    use std::sync::Arc;

    pub const TEST_SECRET: &str = "test-secret";
    pub const TEST_BCRYPT_COST: u32 = 4;

    pub async fn test_state() -> AppState {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::shared(pool.clone());
        let content_repo = SqlxContentRepository::shared(pool.clone());
        let term_repo = SqlxTermRepository::shared(pool.clone());
        let tokens = TokenService::new(TEST_SECRET, 1);

        AppState {
            pool,
            auth_service: Arc::new(AuthService::new(
                user_repo.clone(),
                tokens,
                TEST_BCRYPT_COST,
            )),
            post_service: Arc::new(ContentService::new(content_repo.clone(), ContentType::Post)),
            page_service: Arc::new(ContentService::new(content_repo.clone(), ContentType::Page)),
            media_service: Arc::new(ContentService::new(content_repo, ContentType::Attachment)),
            user_service: Arc::new(UserAdminService::new(user_repo, TEST_BCRYPT_COST)),
            category_service: Arc::new(TermService::new(term_repo.clone(), Taxonomy::Category)),
            tag_service: Arc::new(TermService::new(term_repo, Taxonomy::PostTag)),
            upload_config: Arc::new(UploadConfig::default()),
        }
    }

    pub async fn test_server() -> axum_test::TestServer {
        let state = test_state().await;
        let app = build_router(state, "http://localhost:4200").expect("Failed to build router");
        axum_test::TestServer::new(app).expect("Failed to start test server")
    }

    /// Register an account and return its bearer token.
    pub async fn register_and_token(server: &axum_test::TestServer, username: &str) -> String {
        let response = server
            .post("/api/auth/register")
            .json(&serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "hunter2!",
            }))
            .await;
        assert_eq!(response.status_code(), axum::http::StatusCode::CREATED);
        response.json::<serde_json::Value>()["token"]
            .as_str()
            .expect("token missing")
            .to_string()
    }
}
