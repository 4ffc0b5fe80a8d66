//! Page API endpoints
//!
//! Same shape as posts; pages may carry a parent id for hierarchy.

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
        .route("/", get(list_pages))
        .route("/{id}", get(get_page))
}

/// Bearer-guarded routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_page))
        .route("/{id}", patch(update_page))
        .route("/{id}", delete(delete_page))
}

async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Content>>, ApiError> {
    let filter = content::status_filter(&query)?;
    content::list(&state.page_service, &query, filter).await
}

async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Content>, ApiError> {
    content::get(&state.page_service, id).await
}

async fn create_page(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(input): Json<CreateContentInput>,
) -> Result<(StatusCode, Json<Content>), ApiError> {
    content::create(&state.page_service, auth.user.id, input).await
}

async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateContentInput>,
) -> Result<Json<Content>, ApiError> {
    content::update(&state.page_service, id, input).await
}

async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    content::remove(&state.page_service, id).await
}
