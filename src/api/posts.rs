//! Post API endpoints
//!
//! - GET /api/posts, GET /api/posts/{id} (public)
//! - POST /api/posts, PATCH /api/posts/{id}, DELETE /api/posts/{id} (bearer)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};

use crate::api::common::ListQuery;
use crate::api::content;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::Paginated;
use crate::models::Content;
use crate::services::content::{CreateContentInput, UpdateContentInput};

/// Public routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts))
        .route("/{id}", get(get_post))
}

/// Bearer-guarded routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_post))
        .route("/{id}", patch(update_post))
        .route("/{id}", delete(delete_post))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Content>>, ApiError> {
    let filter = content::status_filter(&query)?;
    content::list(&state.post_service, &query, filter).await
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Content>, ApiError> {
    content::get(&state.post_service, id).await
}

async fn create_post(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(input): Json<CreateContentInput>,
) -> Result<(StatusCode, Json<Content>), ApiError> {
    content::create(&state.post_service, auth.user.id, input).await
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateContentInput>,
) -> Result<Json<Content>, ApiError> {
    content::update(&state.post_service, id, input).await
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    content::remove(&state.post_service, id).await
}
