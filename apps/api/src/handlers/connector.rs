use apiconnector_application::DispatchBody;
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::error::ApiResult;
use crate::state::AppState;

/// Single entry point for warehouse batches and queued executions.
pub async fn dispatch_handler(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    let reply = state.request_router.dispatch(body.as_ref()).await?;

    Ok(match reply.body {
        DispatchBody::Json(document) => (reply.status, Json(document)).into_response(),
        DispatchBody::Text(text) => (reply.status, text).into_response(),
    })
}
