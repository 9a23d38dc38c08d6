use axum::{
    extract::State,
    routing::{get, post},
    Router,
    Json,
};
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tracing::info;

use crate::gateway;
use crate::state::AppState;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        .route("/api/chat", post(gateway::chat))
        .route("/api/health", get(health_check));

    // Static file serving for the browser UI
    match &state.config.system_config.static_dir {
        Some(dir) => {
            info!("Serving static files from {}", dir);
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "agent_configured": state.config.bedrock_config.agent_target().is_some()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::agent::testing::ScriptedAgent;
    use crate::config::Config;

    fn app(config: Config) -> Router {
        let state = AppState::with_agent(config, Arc::new(ScriptedAgent::with_texts(&[])));
        create_routes(&state).with_state(state)
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_health_reports_unconfigured_agent() {
        let (status, body) = fetch(app(Config::default()), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "status": "ok", "agent_configured": false }));
    }

    #[tokio::test]
    async fn test_health_reports_configured_agent() {
        let mut config = Config::default();
        config.bedrock_config.agent_id = Some("AGENT".to_string());
        config.bedrock_config.agent_alias_id = Some("ALIAS".to_string());

        let (_, body) = fetch(app(config), "/api/health").await;
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["agent_configured"], json!(true));
    }

    #[tokio::test]
    async fn test_chat_route_rejects_get() {
        let (status, _) = fetch(app(Config::default()), "/api/chat").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unknown_path_without_static_dir() {
        let (status, _) = fetch(app(Config::default()), "/index.html").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_dir_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>chat</h1>").unwrap();

        let mut config = Config::default();
        config.system_config.static_dir = Some(dir.path().to_string_lossy().into_owned());

        let (status, body) = fetch(app(config), "/index.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>chat</h1>");
    }
}
