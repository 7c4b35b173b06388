/// Label endpoints
///
/// Same shape as task statuses; names are unique and 3 to 1000 characters.
/// Deleting a label still attached to a task yields `409`.

use super::with_total_count;
use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Json,
};
use taskboard_shared::models::label::{CreateLabel, LabelDto, UpdateLabel};
use taskboard_shared::repository::Store;

pub async fn index<S: Store>(State(state): State<AppState<S>>) -> ApiResult<Response> {
    let labels = state.services.labels.list(&()).await?;
    let total = state.services.labels.count().await?;
    Ok(with_total_count(total, labels))
}

pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<LabelDto>> {
    Ok(Json(state.services.labels.get_by_id(id).await?))
}

pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    Json(input): Json<CreateLabel>,
) -> ApiResult<(StatusCode, Json<LabelDto>)> {
    let label = state.services.labels.create(input).await?;
    Ok((StatusCode::CREATED, Json(label)))
}

pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
    Json(patch): Json<UpdateLabel>,
) -> ApiResult<Json<LabelDto>> {
    Ok(Json(state.services.labels.update(id, patch).await?))
}

pub async fn destroy<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.services.labels.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
