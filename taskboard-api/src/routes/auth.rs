/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/login
/// Content-Type: application/json
///
/// {
///   "username": "user@example.com",
///   "password": "secret"
/// }
/// ```
///
/// # Response
///
/// The signed JWT as `text/plain`:
///
/// ```text
/// eyJhbGciOiJIUzI1NiJ9...
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown email or wrong password
/// - `500 Internal Server Error`: Server error

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use taskboard_shared::auth::jwt;
use taskboard_shared::repository::Store;

/// Login request
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub username: String,

    /// Password
    pub password: String,
}

pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<String> {
    let user = state
        .services
        .auth
        .authenticate(&req.username, &req.password)
        .await?;

    let claims = jwt::Claims::with_expiration(
        user.id,
        &user.email,
        Duration::hours(state.config.jwt.ttl_hours),
    );
    Ok(jwt::create_token(&claims, state.jwt_secret())?)
}
