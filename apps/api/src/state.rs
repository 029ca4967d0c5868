use std::sync::Arc;

use apiconnector_application::{RequestRouter, TaskQueue};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub request_router: RequestRouter,
    pub task_queue: Arc<dyn TaskQueue>,
    pub postgres_pool: Option<sqlx::PgPool>,
    pub redis_client: Option<redis::Client>,
}
