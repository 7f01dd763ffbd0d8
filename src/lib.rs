pub mod analysis;
pub mod commands;
pub mod error;
pub mod extract;
pub mod models;
pub mod state;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use commands::{
    feedback::{create_feedback, delete_feedback, get_feedback, list_feedback, preview_score, update_status},
    health::health,
    stats::get_stats,
};
use error::StartupError;
use state::AppState;
use std::time::Instant;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/feedback", post(create_feedback).get(list_feedback))
        .route("/api/feedback/{id}", get(get_feedback).delete(delete_feedback))
        .route("/api/feedback/{id}/status", patch(update_status))
        .route("/api/stats", get(get_stats))
        .route("/api/score", post(preview_score))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    log::info!(
        "{method} {path} -> {} ({} ms)",
        response.status().as_u16(),
        start.elapsed().as_millis()
    );
    response
}

/// Serves until the process is stopped.
pub async fn run_server(host: &str, port: u16, state: AppState) -> Result<(), StartupError> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    log::info!(
        "listening on {} (database: {})",
        listener.local_addr()?,
        state.db_path().display()
    );

    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
