//! API middleware
//!
//! Bearer token authentication, shared application state and the JSON
//! error envelope. Every guarded request verifies the token signature and
//! expiry, then confirms the user record still exists.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::UserView;
use crate::services::auth::{AuthService, AuthServiceError};
use crate::services::content::ContentServiceError;
use crate::services::term::TermServiceError;
use crate::services::token::Claims;
use crate::services::users::UserAdminError;
use crate::services::{ContentService, TermService, UserAdminService};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub post_service: Arc<ContentService>,
    pub page_service: Arc<ContentService>,
    pub media_service: Arc<ContentService>,
    pub user_service: Arc<UserAdminService>,
    pub category_service: Arc<TermService>,
    pub tag_service: Arc<TermService>,
    pub upload_config: Arc<crate::config::UploadConfig>,
}

/// Authenticated user extracted from the bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: UserView,
    pub claims: Claims,
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::UserExists(msg) => ApiError::conflict(msg),
            AuthServiceError::Unauthorized => ApiError::unauthorized(err.to_string()),
            AuthServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            AuthServiceError::InternalError(e) => {
                tracing::error!(error = %e, "auth service failure");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<ContentServiceError> for ApiError {
    fn from(err: ContentServiceError) -> Self {
        match err {
            ContentServiceError::NotFound => ApiError::not_found("Not found"),
            ContentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ContentServiceError::InternalError(e) => {
                tracing::error!(error = %e, "content service failure");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<TermServiceError> for ApiError {
    fn from(err: TermServiceError) -> Self {
        match err {
            TermServiceError::NotFound => ApiError::not_found("Not found"),
            TermServiceError::TermExists(msg) => ApiError::conflict(msg),
            TermServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            TermServiceError::InternalError(e) => {
                tracing::error!(error = %e, "term service failure");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<UserAdminError> for ApiError {
    fn from(err: UserAdminError) -> Self {
        match err {
            UserAdminError::NotFound => ApiError::not_found("Not found"),
            UserAdminError::UserExists(msg) => ApiError::conflict(msg),
            UserAdminError::ValidationError(msg) => ApiError::validation_error(msg),
            UserAdminError::InternalError(e) => {
                tracing::error!(error = %e, "user admin failure");
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract the bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<String> {
    let auth_header = request.headers().get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str.strip_prefix("Bearer ").map(|t| t.to_string())
}

/// Authentication middleware.
///
/// Verifies the token signature and expiry, then confirms the user record
/// still exists. Any failure is a 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&request)
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let claims = state.auth_service.verify_token(&token)?;
    let user = state.auth_service.validate_user(claims.sub).await?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user, claims });
    Ok(next.run(request).await)
}
