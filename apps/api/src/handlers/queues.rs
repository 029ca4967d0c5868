use apiconnector_core::NonEmptyString;
use axum::Json;
use axum::extract::{Path, State};

use crate::dto::QueueStatsResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn queue_stats_handler(
    State(state): State<AppState>,
    Path(queue_name): Path<String>,
) -> ApiResult<Json<QueueStatsResponse>> {
    let queue_name = NonEmptyString::new(queue_name)?;
    let pending_tasks = state.task_queue.pending_count(queue_name.as_str()).await?;

    Ok(Json(QueueStatsResponse {
        queue_name: queue_name.into(),
        pending_tasks,
    }))
}
