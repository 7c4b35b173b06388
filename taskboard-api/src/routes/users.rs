/// User endpoints
///
/// # Endpoints
///
/// - `GET /api/users` - List users (`X-Total-Count` header)
/// - `GET /api/users/:id` - Show a user
/// - `POST /api/users` - Register (public)
/// - `PUT /api/users/:id` - Partial update, own account only
/// - `DELETE /api/users/:id` - Delete, own account only; `409` while tasks are assigned
///
/// Passwords are never returned.

use super::with_total_count;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::AuthUser,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Extension, Json,
};
use taskboard_shared::models::user::{CreateUser, UpdateUser, UserDto};
use taskboard_shared::repository::Store;

pub async fn index<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Response> {
    let users = state.services.users.list(&()).await?;
    let total = state.services.users.count().await?;
    Ok(with_total_count(total, users))
}

pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserDto>> {
    Ok(Json(state.services.users.get_by_id(id).await?))
}

/// Registration
///
/// ```text
/// POST /api/users
///
/// {
///   "firstName": "Ada",
///   "lastName": "Lovelace",
///   "email": "ada@example.com",
///   "password": "secret"
/// }
/// ```
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Json(input): Json<CreateUser>,
) -> ApiResult<(StatusCode, Json<UserDto>)> {
    let user = state.services.users.create(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateUser>,
) -> ApiResult<Json<UserDto>> {
    ensure_self(&caller, id)?;
    Ok(Json(state.services.users.update(id, patch).await?))
}

pub async fn destroy<S: Store>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    ensure_self(&caller, id)?;
    state.services.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Only the account owner may change or remove an account
fn ensure_self(caller: &AuthUser, id: i64) -> Result<(), ApiError> {
    if caller.user_id == id {
        Ok(())
    } else {
        tracing::warn!(caller = caller.user_id, target = id, "Refused change to another user's account");
        Err(ApiError::Forbidden("You can only modify your own account".to_string()))
    }
}
