use ai_llm_service::health_service::HealthStatus;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response payload for `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` when every component answered, `degraded` otherwise.
    pub status: &'static str,
    pub store: StoreHealth,
    pub llm: Vec<HealthStatus>,
}
