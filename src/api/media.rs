//! Media API endpoints
//!
//! Attachments are metadata records: the file itself lives wherever `url`
//! points. The payload uses media vocabulary (alt, caption, url, filename)
//! and is mapped onto the shared content record here: alt text into the
//! excerpt, caption into the body, url into the guid, filename into the
//! slug.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::api::common::ListQuery;
use crate::api::content;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::api::responses::Paginated;
use crate::models::Content;
use crate::services::content::{CreateContentInput, UpdateContentInput};

/// Public routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_media))
        .route("/{id}", get(get_media))
}

/// Bearer-guarded routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_media))
        .route("/{id}", patch(update_media))
        .route("/{id}", delete(delete_media))
}

/// Attachment creation payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMediaRequest {
    pub title: String,
    pub url: String,
    pub mime_type: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Attachment update payload
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMediaRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub parent_id: Option<i64>,
}

async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Content>>, ApiError> {
    let filter = content::mime_filter(&query);
    content::list(&state.media_service, &query, filter).await
}

async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Content>, ApiError> {
    content::get(&state.media_service, id).await
}

async fn create_media(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<CreateMediaRequest>,
) -> Result<(StatusCode, Json<Content>), ApiError> {
    if !state.upload_config.is_type_allowed(&request.mime_type) {
        return Err(ApiError::validation_error(format!(
            "MIME type '{}' is not allowed",
            request.mime_type
        )));
    }

    let input = CreateContentInput {
        title: request.title,
        body: request.caption,
        excerpt: request.alt,
        slug: request.filename,
        parent_id: request.parent_id,
        mime_type: Some(request.mime_type),
        guid: Some(request.url),
        ..Default::default()
    };
    content::create(&state.media_service, auth.user.id, input).await
}

async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateMediaRequest>,
) -> Result<Json<Content>, ApiError> {
    if let Some(ref mime_type) = request.mime_type {
        if !state.upload_config.is_type_allowed(mime_type) {
            return Err(ApiError::validation_error(format!(
                "MIME type '{}' is not allowed",
                mime_type
            )));
        }
    }

    let input = UpdateContentInput {
        title: request.title,
        body: request.caption,
        excerpt: request.alt,
        slug: request.filename,
        parent_id: request.parent_id,
        mime_type: request.mime_type,
        guid: request.url,
        ..Default::default()
    };
    content::update(&state.media_service, id, input).await
}

async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    content::remove(&state.media_service, id).await
}
