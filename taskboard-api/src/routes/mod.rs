/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login
/// - `users`, `task_statuses`, `labels`, `tasks`: CRUD endpoints
///
/// Every CRUD resource follows the same shape: list (with `X-Total-Count`),
/// show, create (201), update and delete (204).

use axum::{
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub mod auth;
pub mod health;
pub mod labels;
pub mod task_statuses;
pub mod tasks;
pub mod users;

/// Response header carrying the total number of entities of a kind
pub const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// JSON list response with the `X-Total-Count` header
pub(crate) fn with_total_count<T: Serialize>(total: i64, items: Vec<T>) -> Response {
    let mut response = Json(items).into_response();
    response.headers_mut().insert(
        HeaderName::from_static(TOTAL_COUNT_HEADER),
        HeaderValue::from(total),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_total_count_sets_header() {
        let response = with_total_count(7, vec!["a", "b"]);
        assert_eq!(response.headers().get("X-Total-Count").unwrap(), "7");
    }
}
