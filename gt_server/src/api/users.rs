//! User profile handlers.
//!
//! `/users/me` acts on the account whose id is the access token's `sub`, so a
//! token never reaches a later account registered under the same email.
//! Listing and lookup by id are reserved for admins. Profiles never include
//! password or refresh-token hashes.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use gym_tracker::auth::{UpdateUserRequest, UserProfile};
use uuid::Uuid;

use super::{ApiJson, AppState, error::ApiError, middleware::CurrentUser};

pub async fn get_me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.user_service.get_by_id(claims.sub).await?))
}

/// Update name and/or password of the caller
///
/// # Errors
///
/// - `400 Bad Request`: A present field failed validation
/// - `404 Not Found`: The account was deleted after the token was issued
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    ApiJson(request): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.user_service.update(claims.sub, request).await?))
}

pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete(claims.sub).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Admin: any user by id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.user_service.get_by_id(user_id).await?))
}

/// Admin: every user
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    Ok(Json(state.user_service.list().await?))
}
