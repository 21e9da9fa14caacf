//! HTTP surface of the PDF chat backend.

use std::sync::Arc;

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub use crate::core::{app_state::AppState, user_id::USER_ID_HEADER};
pub use crate::error_handler::AppError;

use crate::{
    middleware_layer::json_extractor::json_error_mapper,
    routes::{
        ask::ask_question_route::ask_question,
        documents::{chat_history_route::chat_history, register_document_route::register_document},
        health::health_route::health,
    },
};

/// Builds the router over already wired state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/documents", post(register_document))
        .route("/documents/{id}/chat", get(chat_history))
        .route("/documents/{id}/ask", post(ask_question))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Wires state from the environment and serves until Ctrl+C.
///
/// # Errors
/// Configuration, bind or server failures.
pub async fn start() -> Result<(), AppError> {
    let addr = std::env::var("API_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let state = Arc::new(AppState::from_env()?);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(AppError::Bind)?;
    info!(%addr, "listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
