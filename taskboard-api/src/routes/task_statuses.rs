/// Task status endpoints
///
/// - `GET /api/task_statuses` - List statuses (`X-Total-Count` header)
/// - `GET /api/task_statuses/:id`
/// - `POST /api/task_statuses` - `{ "name": "To review", "slug": "to_review" }`
/// - `PUT /api/task_statuses/:id`
/// - `DELETE /api/task_statuses/:id` - `409` while any task is in the status

use super::with_total_count;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use taskboard_shared::models::task_status::{CreateTaskStatus, TaskStatusDto, UpdateTaskStatus};
use taskboard_shared::repository::Store;

pub async fn index<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Response> {
    let statuses = state.services.task_statuses.list(&()).await?;
    let total = state.services.task_statuses.count().await?;
    Ok(with_total_count(total, statuses))
}

pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskStatusDto>> {
    Ok(Json(state.services.task_statuses.get_by_id(id).await?))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Json(input): Json<CreateTaskStatus>,
) -> ApiResult<(StatusCode, Json<TaskStatusDto>)> {
    let status = state.services.task_statuses.create(input).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateTaskStatus>,
) -> ApiResult<Json<TaskStatusDto>> {
    Ok(Json(state.services.task_statuses.update(id, patch).await?))
}

pub async fn destroy<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.services.task_statuses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
