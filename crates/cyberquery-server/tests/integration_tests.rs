//! Integration tests for the HTTP surface

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use cyberquery_assistant::{
    Assistant, AssistantConfig, CodeGenerationResponse, CommandGenerationResponse,
    ExploitSearchResponse,
};
use cyberquery_llm::MockProvider;
use cyberquery_rag::{MockEmbeddingModel, RagConfig, SemanticIndex};
use cyberquery_server::{
    config::ServerConfig,
    handlers::{
        create_router, ApiConfigResponse, AppState, ChatResponse, ErrorResponse,
        GenerationResponse, HealthCheckResponse, RebuildResponse,
    },
};
use serde::de::DeserializeOwned;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt; // for oneshot

/// Helper to create a router over a one-document corpus
fn create_app(llm: MockProvider) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("nmap_help.txt"),
        "nmap -sS performs a SYN scan. nmap -sV probes service versions.",
    )
    .unwrap();

    let rag = RagConfig {
        data_dir: dir.path().to_path_buf(),
        ..RagConfig::default()
    };
    let index = SemanticIndex::from_config(&rag, MockEmbeddingModel::new(32)).unwrap();
    let assistant = Assistant::new(llm, Arc::new(index), AssistantConfig::default()).unwrap();

    let state = AppState {
        assistant,
        config: Arc::new(ServerConfig::default()),
    };
    (create_router(state), dir)
}

async fn post(app: Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn parse<T: DeserializeOwned>(body: &[u8]) -> T {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _dir) = create_app(MockProvider::default());

    let (status, body) = get(app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);

    let health: HealthCheckResponse = parse(&body);
    assert_eq!(health.status, "healthy");
    assert_eq!(health.index, "unbuilt");
    assert_eq!(health.chunks, 0);
}

#[tokio::test]
async fn test_config_endpoint() {
    let (app, _dir) = create_app(MockProvider::default().with_model_name("llama3.2"));

    let (status, body) = get(app, "/api/config").await;
    assert_eq!(status, StatusCode::OK);

    let config: ApiConfigResponse = parse(&body);
    assert_eq!(config.model, "llama3.2");
    assert_eq!(config.embedding_model, "nomic-embed-text");
    assert!(!config.version.is_empty());
}

#[tokio::test]
async fn test_command_generation_ok() {
    let (app, _dir) = create_app(MockProvider::new(
        r#"{"commands": ["nmap -sV 10.0.0.5"], "explanation": "Service versions"}"#,
    ));

    let (status, body) = post(app, "/api/command/generate", r#"{"prompt": "service versions"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let response: GenerationResponse<CommandGenerationResponse> = parse(&body);
    assert_eq!(response.status, "ok");
    assert!(response.missing.is_empty());
    assert_eq!(response.response.commands, vec!["nmap -sV 10.0.0.5"]);
}

#[tokio::test]
async fn test_degraded_answer_is_ok_with_missing_fields() {
    let (app, _dir) = create_app(MockProvider::new(r#"{"code": "id"}"#));

    let (status, body) = post(app, "/api/code/generate", r#"{"prompt": "who am i"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let response: GenerationResponse<CodeGenerationResponse> = parse(&body);
    assert_eq!(response.status, "degraded");
    assert_eq!(response.missing, vec!["explanation", "language"]);
    assert_eq!(response.response.code, "id");
    assert_eq!(
        response.message,
        "Missing required keys in LLM response: explanation, language"
    );
}

#[tokio::test]
async fn test_commands_string_is_coerced_to_list() {
    let (app, _dir) = create_app(MockProvider::new(
        r#"{"commands": "nmap -sS host", "explanation": "SYN scan"}"#,
    ));

    let (status, body) = post(app, "/api/command/generate", r#"{"prompt": "syn scan"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let response: GenerationResponse<CommandGenerationResponse> = parse(&body);
    assert_eq!(response.status, "ok");
    assert_eq!(response.response.commands, vec!["nmap -sS host"]);
}

#[tokio::test]
async fn test_unparseable_answer_returns_error_body() {
    let (app, _dir) = create_app(MockProvider::new("I cannot answer that"));

    let (status, body) = post(app, "/api/code/explain", r#"{"prompt": "ls"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = parse(&body);
    assert_eq!(error.error, "Invalid JSON response from LLM");
    assert_eq!(error.raw, "I cannot answer that");
}

#[tokio::test]
async fn test_generation_failure_returns_error_body() {
    let (app, _dir) = create_app(MockProvider::failing());

    let (status, body) = post(app, "/api/exploit/search", r#"{"prompt": "apache 2.4.49"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let error: ErrorResponse = parse(&body);
    assert_eq!(error.error, "Failed to generate LLM response");
    assert_eq!(error.raw, "No response");
}

#[tokio::test]
async fn test_exploit_search_ok() {
    let (app, _dir) = create_app(MockProvider::new(
        r#"{"exploits": [{"title": "Path traversal", "link": "https://example.org/cve-2021-41773", "severity": "High", "description": "Apache 2.4.49"}], "explanation": "Upgrade"}"#,
    ));

    let (status, body) = post(app, "/api/exploit/search", r#"{"prompt": "apache 2.4.49"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let response: GenerationResponse<ExploitSearchResponse> = parse(&body);
    assert_eq!(response.response.exploits.len(), 1);
    assert_eq!(response.response.exploits[0].severity, "High");
}

#[tokio::test]
async fn test_chat_with_history() {
    let (app, _dir) = create_app(MockProvider::new("Try nmap -sU for UDP."));

    let body = r#"{
        "message": "and UDP?",
        "history": [
            {"role": "user", "content": "scan TCP"},
            {"role": "assistant", "content": "nmap -sS"}
        ]
    }"#;
    let (status, body) = post(app, "/api/model/chat", body).await;
    assert_eq!(status, StatusCode::OK);

    let response: ChatResponse = parse(&body);
    assert_eq!(response.model_message, "Try nmap -sU for UDP.");
}

#[tokio::test]
async fn test_missing_prompt_field_is_rejected() {
    let (app, _dir) = create_app(MockProvider::default());

    let (status, _) = post(app, "/api/command/generate", r#"{"task": "oops"}"#).await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_rebuild_index() {
    let (app, _dir) = create_app(MockProvider::default());

    let (status, body) = post(app.clone(), "/api/index/rebuild", "").await;
    assert_eq!(status, StatusCode::OK);
    let rebuild: RebuildResponse = parse(&body);
    assert_eq!(rebuild.chunks, 1);

    let (_, body) = get(app, "/api/health").await;
    let health: HealthCheckResponse = parse(&body);
    assert_eq!(health.index, "ready");
    assert_eq!(health.chunks, 1);
}
