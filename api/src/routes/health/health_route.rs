//! GET /health - document store reachability plus LLM profile probes.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

use crate::{
    core::app_state::AppState,
    routes::health::health_response::{HealthResponse, StoreHealth},
};

/// `503` only when the document store is unreachable; model outages
/// report `degraded` with `200`.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let store = match state.store.ping().await {
        Ok(()) => StoreHealth {
            backend: state.store.backend(),
            ok: true,
            message: None,
        },
        Err(e) => {
            warn!(error = %e, "document store ping failed");
            StoreHealth {
                backend: state.store.backend(),
                ok: false,
                message: Some(e.to_string()),
            }
        }
    };

    let llm = match &state.llm {
        Some(svc) => svc.health_all().await,
        None => Vec::new(),
    };

    let all_ok = store.ok && llm.iter().all(|h| h.ok);
    let status = if store.ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if all_ok { "ok" } else { "degraded" },
            store,
            llm,
        }),
    )
}
