use std::sync::Arc;

use ai_llm_service::{
    ChatMessage, LanguageModel, LlmModelConfig, LlmProvider, LlmServiceProfiles, Profile,
    ProfileModel,
};
use axum::{Json, Router, http::StatusCode, routing::post};
use serde_json::{Value, json};

async fn spawn_mock() -> String {
    let app = Router::new()
        .route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                let model = body["model"].as_str().unwrap_or_default().to_string();
                let last = body["messages"]
                    .as_array()
                    .and_then(|m| m.last())
                    .and_then(|m| m["content"].as_str())
                    .unwrap_or_default()
                    .to_string();
                assert_eq!(body["stream"], json!(false));
                Json(json!({
                    "model": model,
                    "message": { "role": "assistant", "content": format!("{model}: {last}") },
                    "done": true
                }))
            }),
        )
        .route(
            "/api/embeddings",
            post(|Json(body): Json<Value>| async move {
                if body["prompt"].as_str().unwrap_or_default().is_empty() {
                    return Err((StatusCode::BAD_REQUEST, "empty prompt"));
                }
                Ok(Json(json!({ "embedding": [0.1, 0.2, 0.3] })))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn cfg(endpoint: &str, model: &str) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: model.into(),
        endpoint: endpoint.into(),
        api_key: None,
        max_tokens: Some(64),
        temperature: Some(0.0),
        top_p: None,
        timeout_secs: Some(5),
    }
}

#[tokio::test]
async fn profiles_route_to_their_models() {
    let base = spawn_mock().await;
    let svc = Arc::new(
        LlmServiceProfiles::new(
            cfg(&base, "fast-model"),
            Some(cfg(&base, "slow-model")),
            cfg(&base, "embed-model"),
            Some(2),
        )
        .unwrap(),
    );

    let fast = ProfileModel::new(svc.clone(), Profile::Fast);
    let slow = ProfileModel::new(svc.clone(), Profile::Slow);
    let msgs = [ChatMessage::system("be brief"), ChatMessage::user("hello")];

    assert_eq!(fast.complete(&msgs).await.unwrap(), "fast-model: hello");
    assert_eq!(slow.complete(&msgs).await.unwrap(), "slow-model: hello");
    assert_eq!(svc.embed("chunk").await.unwrap(), vec![0.1, 0.2, 0.3]);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let base = spawn_mock().await;
    let svc = LlmServiceProfiles::new(
        cfg(&base, "m"),
        None,
        cfg(&base, "embed-model"),
        Some(2),
    )
    .unwrap();

    let err = svc.embed("").await.unwrap_err();
    assert!(err.to_string().contains("400"), "unexpected error: {err}");
}
