use axum::{middleware, routing::get, routing::post, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use crate::infrastructure::queue::JobQueue;
use crate::{
    controllers::{health, tts::TtsController},
    infrastructure::auth::{identity_middleware, request_id_middleware},
};

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    pool: Arc<DbPool>,
    config: Arc<Config>,
    queue: Arc<dyn JobQueue>,
    tts_controller: Arc<TtsController>,
) -> Result<(), Box<dyn std::error::Error>> {
    // TTS and usage routes (need caller identity)
    let api_routes = Router::new()
        .route("/api/tts/generate", post(TtsController::generate))
        .route("/api/tts/jobs/:jobId", get(TtsController::get_job))
        .route("/api/tts/history", get(TtsController::history))
        .route("/api/usage", get(TtsController::get_usage))
        .with_state(tts_controller.clone())
        .layer(middleware::from_fn(identity_middleware));

    // Voice catalog is static and public: clients browse it before
    // they have anything to submit
    let voice_routes = Router::new().route("/api/tts/voices", get(TtsController::list_voices));

    // Build application routes
    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state((pool.clone(), queue.clone()))
        .merge(api_routes)
        .merge(voice_routes)
        .nest_service("/storage", ServeDir::new(&config.storage_path))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
