use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::db::{check_connection, DbPool};
use crate::infrastructure::queue::JobQueue;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_ready(
    State((pool, queue)): State<(Arc<DbPool>, Arc<dyn JobQueue>)>,
) -> impl IntoResponse {
    let db_ok = check_connection(&pool).await.is_ok();
    let broker_ok = queue.ping(Duration::from_millis(500)).await;

    // Broker health does not gate readiness: standard-language jobs run
    // in process regardless.
    if db_ok {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "database": "connected",
                "broker": if broker_ok { "connected" } else { "disconnected" }
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "database": "disconnected",
                "broker": if broker_ok { "connected" } else { "disconnected" }
            })),
        )
    }
}
