//! User administration API endpoints
//!
//! Listing and lookup are public like the other resources; mutation is
//! bearer-guarded.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::Paginated;
use crate::models::UserView;
use crate::services::users::{CreateUserInput, UpdateUserInput};

/// Public routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/{id}", get(get_user))
}

/// Bearer-guarded routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route("/{id}", patch(update_user))
        .route("/{id}", delete(delete_user))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<UserView>>, ApiError> {
    let (items, total) = state.user_service.list(query.page, query.limit).await?;
    Ok(Json(Paginated::new(items, total, query.page, query.limit)))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(state.user_service.get(id).await?))
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<CreateUserInput>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let created = state.user_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<UserView>, ApiError> {
    Ok(Json(state.user_service.update(id, input).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
