//! Category and tag API endpoints
//!
//! Both taxonomies share the handler bodies; the routers differ only in
//! which service instance they read from the state.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};

use crate::api::common::ListQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::Paginated;
use crate::models::Term;
use crate::services::term::{CreateTermInput, UpdateTermInput};
use crate::services::TermService;

/// Public category routes
pub fn categories_public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories))
        .route("/{id}", get(get_category))
}

/// Bearer-guarded category routes
pub fn categories_protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_category))
        .route("/{id}", patch(update_category))
        .route("/{id}", delete(delete_category))
}

/// Public tag routes
pub fn tags_public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags))
        .route("/{id}", get(get_tag))
}

/// Bearer-guarded tag routes
pub fn tags_protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_tag))
        .route("/{id}", patch(update_tag))
        .route("/{id}", delete(delete_tag))
}

async fn list_terms(
    service: &TermService,
    query: ListQuery,
) -> Result<Json<Paginated<Term>>, ApiError> {
    let (items, total) = service
        .list(query.slug.as_deref(), query.page, query.limit)
        .await?;
    Ok(Json(Paginated::new(items, total, query.page, query.limit)))
}

async fn create_term(
    service: &TermService,
    input: CreateTermInput,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    let created = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Term>>, ApiError> {
    list_terms(&state.category_service, query).await
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Term>, ApiError> {
    Ok(Json(state.category_service.get(id).await?))
}

async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CreateTermInput>,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    create_term(&state.category_service, input).await
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTermInput>,
) -> Result<Json<Term>, ApiError> {
    Ok(Json(state.category_service.update(id, input).await?))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.category_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Term>>, ApiError> {
    list_terms(&state.tag_service, query).await
}

async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Term>, ApiError> {
    Ok(Json(state.tag_service.get(id).await?))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<CreateTermInput>,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    create_term(&state.tag_service, input).await
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTermInput>,
) -> Result<Json<Term>, ApiError> {
    Ok(Json(state.tag_service.update(id, input).await?))
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
