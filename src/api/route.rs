use crate::{
    api::{error::ApiError, response::ApiResponse},
    db::{cursor, lease::LeaseQueue, lease::TaskStats},
    models::SyncTask,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

const MAX_LIMIT: i64 = 1000;

#[derive(Deserialize)]
pub struct ExhaustedQuery {
    limit: Option<i64>,
}

#[derive(Serialize)]
pub struct SyncStatus {
    pub blockchain_id: String,
    pub chain_cursor: Option<i64>,
    pub highest_task: Option<i64>,
    pub max_retry: i64,
    pub tasks: TaskStats,
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/tasks/exhausted", get(exhausted_tasks))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn lease_queue(state: &AppState) -> LeaseQueue {
    LeaseQueue::new(state.db_pool.clone(), &state.config.sync_settings())
}

async fn health(State(state): State<Arc<AppState>>) -> Result<ApiResponse<&'static str>, ApiError> {
    sqlx::query("SELECT 1").execute(&state.db_pool).await?;
    Ok(ApiResponse::new("ok"))
}

// GET /status handler
async fn status(State(state): State<Arc<AppState>>) -> Result<ApiResponse<SyncStatus>, ApiError> {
    let queue = lease_queue(&state);
    let blockchain_id = state.config.blockchain_id.clone();

    let status = SyncStatus {
        chain_cursor: cursor::get_cursor(&state.db_pool, &blockchain_id).await?,
        highest_task: queue.max_block().await?,
        max_retry: queue.max_retry(),
        tasks: queue.stats().await?,
        blockchain_id,
    };
    debug!(service = "api", chain_id = %status.blockchain_id, "status requested");

    Ok(ApiResponse::new(status))
}

// GET /tasks/exhausted handler
async fn exhausted_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExhaustedQuery>,
) -> Result<ApiResponse<Vec<SyncTask>>, ApiError> {
    let limit = params.limit.unwrap_or(100);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::InvalidParameter(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let tasks = lease_queue(&state).exhausted(limit).await?;
    Ok(ApiResponse::new(tasks))
}
