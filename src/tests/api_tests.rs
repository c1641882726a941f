//! tests/api_tests.rs - status endpoints served over a real listener

use super::{settings, test_pool, CHAIN_ID};
use crate::{
    api::create_router,
    config::Config,
    db::{cursor, lease::LeaseQueue},
    state::AppState,
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;

async fn serve(pool: SqlitePool) -> String {
    let mut config = Config::from_env();
    config.blockchain_id = CHAIN_ID.to_string();
    config.max_retry = 3;
    config.lease_ttl_secs = 86_400;

    let app = create_router(Arc::new(AppState { config, db_pool: pool }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_status_reports_queue_state() {
    let pool = test_pool().await;
    cursor::advance_cursor(&pool, CHAIN_ID, 4).await.unwrap();
    let queue = LeaseQueue::new(pool.clone(), &settings());
    queue.backfill(4).await.unwrap();
    queue.complete(0).await.unwrap();
    for _ in 0..3 {
        queue.fail(1).await.unwrap();
    }

    let base = serve(pool).await;

    let health: Value = reqwest::get(format!("{}/health", base)).await.unwrap().json().await.unwrap();
    assert_eq!(health["data"], "ok");

    let status: Value = reqwest::get(format!("{}/status", base)).await.unwrap().json().await.unwrap();
    let data = &status["data"];
    assert_eq!(data["blockchain_id"], CHAIN_ID);
    assert_eq!(data["chain_cursor"], 4);
    assert_eq!(data["highest_task"], 4);
    assert_eq!(data["tasks"]["done"], 1);
    assert_eq!(data["tasks"]["exhausted"], 1);
    assert_eq!(data["tasks"]["pending"], 3);

    let exhausted: Value = reqwest::get(format!("{}/tasks/exhausted?limit=10", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exhausted["data"][0]["block_number"], 1);
    assert_eq!(exhausted["data"][0]["retry_count"], 3);
}

#[tokio::test]
async fn test_exhausted_limit_is_validated() {
    let base = serve(test_pool().await).await;

    let response = reqwest::get(format!("{}/tasks/exhausted?limit=0", base)).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("limit"));
}
