//! Authentication API endpoints
//!
//! - POST /api/auth/register, POST /api/auth/login (public)
//! - POST /api/auth/change-password, GET /api/auth/me (bearer)
//!
//! Register and login answer with `{token, user}`; change-password rotates
//! the token so the claims reflect the cleared forced-change flag.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::UserView;
use crate::services::auth::{AuthOutcome, RegisterInput};

/// Public routes
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

/// Bearer-guarded routes
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthOutcome>), ApiError> {
    let outcome = state.auth_service.register(input).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthOutcome>, ApiError> {
    let outcome = state
        .auth_service
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(outcome))
}

async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<AuthOutcome>, ApiError> {
    let outcome = state
        .auth_service
        .change_password(auth.user.id, &request.new_password)
        .await?;
    Ok(Json(outcome))
}

async fn me(Extension(auth): Extension<AuthenticatedUser>) -> Json<UserView> {
    Json(auth.user)
}
