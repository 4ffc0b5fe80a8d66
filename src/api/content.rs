//! Shared handler logic for the content endpoints
//!
//! Posts, pages and media differ only in which service instance they talk
//! to and which extra list filter they accept, so the handler bodies live
//! here and the per-resource routers stay thin.

use axum::http::StatusCode;
use axum::Json;
use std::str::FromStr;

use crate::api::common::ListQuery;
use crate::api::middleware::ApiError;
use crate::api::responses::Paginated;
use crate::db::repositories::ContentFilter;
use crate::models::{Content, ContentStatus};
use crate::services::content::{CreateContentInput, UpdateContentInput};
use crate::services::ContentService;

/// Status equality filter for posts and pages
pub(super) fn status_filter(query: &ListQuery) -> Result<Option<ContentFilter>, ApiError> {
    match &query.status {
        Some(raw) => {
            let status = ContentStatus::from_str(raw)
                .map_err(|_| ApiError::validation_error(format!("Invalid status: {}", raw)))?;
            Ok(Some(ContentFilter::Status(status)))
        }
        None => Ok(None),
    }
}

/// MIME prefix filter for media
pub(super) fn mime_filter(query: &ListQuery) -> Option<ContentFilter> {
    query
        .mime_type
        .as_ref()
        .filter(|p| !p.is_empty())
        .map(|p| ContentFilter::MimePrefix(p.clone()))
}

pub(super) async fn list(
    service: &ContentService,
    query: &ListQuery,
    filter: Option<ContentFilter>,
) -> Result<Json<Paginated<Content>>, ApiError> {
    let (items, total) = service.list(filter, query.page, query.limit).await?;
    Ok(Json(Paginated::new(items, total, query.page, query.limit)))
}

pub(super) async fn get(service: &ContentService, id: i64) -> Result<Json<Content>, ApiError> {
    Ok(Json(service.get(id).await?))
}

pub(super) async fn create(
    service: &ContentService,
    author_id: i64,
    input: CreateContentInput,
) -> Result<(StatusCode, Json<Content>), ApiError> {
    let created = service.create(author_id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn update(
    service: &ContentService,
    id: i64,
    input: UpdateContentInput,
) -> Result<Json<Content>, ApiError> {
    Ok(Json(service.update(id, input).await?))
}

pub(super) async fn remove(service: &ContentService, id: i64) -> Result<StatusCode, ApiError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
