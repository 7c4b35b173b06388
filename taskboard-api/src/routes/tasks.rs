/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks?assigneeId=1&status=to_review&labelId=2&titleCont=rev`
///   - every parameter is optional; supplied ones must all match
///   - `X-Total-Count` carries the number of tasks overall
/// - `GET /api/tasks/:id`
/// - `POST /api/tasks`
/// - `PUT /api/tasks/:id`
/// - `DELETE /api/tasks/:id`
///
/// # Create payload
///
/// ```json
/// {
///   "title": "Review PR",
///   "content": "optional",
///   "index": 3,
///   "assignee_id": 1,
///   "status": "to_review",
///   "taskLabelIds": [1, 2]
/// }
/// ```
///
/// An unknown status slug or assignee fails with `404`; unknown label ids
/// are ignored.

use super::with_total_count;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use taskboard_shared::filter::TaskFilter;
use taskboard_shared::models::task::{CreateTask, TaskDto, UpdateTask};
use taskboard_shared::repository::Store;

pub async fn index<S: Store>(
    State(state): State<AppState<S>>,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Response> {
    let tasks = state.services.tasks.list(&filter).await?;
    let total = state.services.tasks.count().await?;
    Ok(with_total_count(total, tasks))
}

pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<TaskDto>> {
    Ok(Json(state.services.tasks.get_by_id(id).await?))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Json(input): Json<CreateTask>,
) -> ApiResult<(StatusCode, Json<TaskDto>)> {
    let task = state.services.tasks.create(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateTask>,
) -> ApiResult<Json<TaskDto>> {
    Ok(Json(state.services.tasks.update(id, patch).await?))
}

pub async fn destroy<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.services.tasks.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
