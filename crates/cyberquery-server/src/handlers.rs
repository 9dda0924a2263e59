//! HTTP request handlers for the assistant service.
//!
//! Every structured endpoint answers with the typed payload plus a `status`
//! of `ok` or `degraded`. Degraded answers are still `200 OK`.

use crate::config::ServerConfig;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use cyberquery_assistant::{Answer, Assistant, AssistantError, ChatMessage, TypedResponse};
use cyberquery_domain::{EmbeddingModel, LlmProvider};
use cyberquery_rag::IndexState;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared application state
pub struct AppState<L, E> {
    /// Answer pipeline
    pub assistant: Assistant<L, E>,
    /// Active configuration, reported by `/api/config`
    pub config: Arc<ServerConfig>,
}

impl<L, E> Clone for AppState<L, E> {
    fn clone(&self) -> Self {
        Self {
            assistant: self.assistant.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

/// Task request for the structured endpoints
#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    /// Task, code or target description
    pub prompt: String,
}

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Latest user message
    pub message: String,
    /// Earlier turns, oldest first
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Structured answer envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse<T> {
    /// `ok` or `degraded`
    pub status: String,
    /// Human-readable status message
    pub message: String,
    /// Required fields the model left out
    pub missing: Vec<String>,
    /// The typed answer
    #[serde(flatten)]
    pub response: T,
}

impl<T: TypedResponse> From<Answer<T>> for GenerationResponse<T> {
    fn from(answer: Answer<T>) -> Self {
        Self {
            status: answer.status().to_string(),
            message: answer.message(),
            missing: answer.missing().into_iter().collect(),
            response: answer.into_response(),
        }
    }
}

/// Chat reply
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Always `ok`; failures use the error body
    pub status: String,
    /// Human-readable status message
    pub message: String,
    /// The assistant's reply
    pub model_message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always `healthy` while the process serves requests
    pub status: String,
    /// `unbuilt`, `empty` or `ready`
    pub index: String,
    /// Indexed chunk count
    pub chunks: usize,
}

/// Configuration summary
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiConfigResponse {
    /// Human-readable status message
    pub message: String,
    /// Generation model
    pub model: String,
    /// Embedding model
    pub embedding_model: String,
    /// Service version
    pub version: String,
}

/// Index rebuild result
#[derive(Debug, Serialize, Deserialize)]
pub struct RebuildResponse {
    /// Always `ok`; failures use the error body
    pub status: String,
    /// Human-readable status message
    pub message: String,
    /// Chunks in the new index
    pub chunks: usize,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short error summary
    pub error: String,
    /// Underlying cause
    pub details: String,
    /// Raw model text, or "No response"
    pub raw: String,
}

/// Application error type
#[derive(Debug)]
pub enum ApiError {
    /// The request was well-formed JSON but unusable
    BadRequest(String),
    /// The answer pipeline failed
    Assistant(AssistantError),
}

impl From<AssistantError> for ApiError {
    fn from(e: AssistantError) -> Self {
        ApiError::Assistant(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(details) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Invalid request".to_string(),
                    details,
                    raw: "No response".to_string(),
                },
            ),
            ApiError::Assistant(e) => {
                let (status, summary) = match &e {
                    AssistantError::Timeout(_) => {
                        (StatusCode::GATEWAY_TIMEOUT, "Model did not answer in time")
                    }
                    AssistantError::InvalidResponse { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "Invalid JSON response from LLM")
                    }
                    AssistantError::Generation { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate LLM response")
                    }
                    _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
                };
                error!(error = %e, "Request failed");
                (
                    status,
                    ErrorResponse {
                        error: summary.to_string(),
                        details: e.to_string(),
                        raw: e.raw().unwrap_or("No response").to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("'{}' must not be empty", field)));
    }
    Ok(())
}

fn respond<T: TypedResponse>(answer: Answer<T>) -> Json<GenerationResponse<T>> {
    if !answer.is_complete() {
        let output_type = T::OUTPUT_TYPE;
        warn!(%output_type, missing = ?answer.missing(), "Returning degraded answer");
    }
    Json(GenerationResponse::from(answer))
}

/// GET /api/health
async fn health_check<L, E>(State(state): State<AppState<L, E>>) -> Json<HealthCheckResponse>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    let (index, chunks) = match state.assistant.index_state() {
        IndexState::Unbuilt => ("unbuilt", 0),
        IndexState::Empty => ("empty", 0),
        IndexState::Ready { chunks } => ("ready", chunks),
    };
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        index: index.to_string(),
        chunks,
    })
}

/// GET /api/config
async fn get_config<L, E>(State(state): State<AppState<L, E>>) -> Json<ApiConfigResponse>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    Json(ApiConfigResponse {
        message: "Successfully retrieved chatbot configuration.".to_string(),
        model: state.assistant.model_name().to_string(),
        embedding_model: state.config.model.embedding_model.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/model/chat
async fn chat<L, E>(
    State(state): State<AppState<L, E>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    require_text("message", &request.message)?;
    info!(turns = request.history.len(), "Received chat request");

    let reply = state.assistant.chat(&request.message, &request.history).await?;
    Ok(Json(ChatResponse {
        status: "ok".to_string(),
        message: "Successfully generated chat response.".to_string(),
        model_message: reply,
    }))
}

/// POST /api/command/generate
async fn generate_command<L, E>(
    State(state): State<AppState<L, E>>,
    Json(request): Json<PromptRequest>,
) -> Result<Response, ApiError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    require_text("prompt", &request.prompt)?;
    info!("Received command generation request");
    let answer = state.assistant.generate_command(&request.prompt).await?;
    Ok(respond(answer).into_response())
}

/// POST /api/code/generate
async fn generate_code<L, E>(
    State(state): State<AppState<L, E>>,
    Json(request): Json<PromptRequest>,
) -> Result<Response, ApiError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    require_text("prompt", &request.prompt)?;
    info!("Received code generation request");
    let answer = state.assistant.generate_code(&request.prompt).await?;
    Ok(respond(answer).into_response())
}

/// POST /api/code/explain
async fn explain_code<L, E>(
    State(state): State<AppState<L, E>>,
    Json(request): Json<PromptRequest>,
) -> Result<Response, ApiError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    require_text("prompt", &request.prompt)?;
    info!("Received code explanation request");
    let answer = state.assistant.explain_code(&request.prompt).await?;
    Ok(respond(answer).into_response())
}

/// POST /api/exploit/search
async fn search_exploits<L, E>(
    State(state): State<AppState<L, E>>,
    Json(request): Json<PromptRequest>,
) -> Result<Response, ApiError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    require_text("prompt", &request.prompt)?;
    info!("Received exploit search request");
    let answer = state.assistant.search_exploits(&request.prompt).await?;
    Ok(respond(answer).into_response())
}

/// POST /api/index/rebuild
async fn rebuild_index<L, E>(
    State(state): State<AppState<L, E>>,
) -> Result<Json<RebuildResponse>, ApiError>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    info!("Received index rebuild request");
    let chunks = state.assistant.rebuild_index().await?;
    Ok(Json(RebuildResponse {
        status: "ok".to_string(),
        message: format!("Indexed {} chunks.", chunks),
        chunks,
    }))
}

/// Create the axum router with all routes
pub fn create_router<L, E>(state: AppState<L, E>) -> AxumRouter
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    AxumRouter::new()
        .route("/api/health", get(health_check::<L, E>))
        .route("/api/config", get(get_config::<L, E>))
        .route("/api/model/chat", post(chat::<L, E>))
        .route("/api/command/generate", post(generate_command::<L, E>))
        .route("/api/code/generate", post(generate_code::<L, E>))
        .route("/api/code/explain", post(explain_code::<L, E>))
        .route("/api/exploit/search", post(search_exploits::<L, E>))
        .route("/api/index/rebuild", post(rebuild_index::<L, E>))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use cyberquery_assistant::AssistantConfig;
    use cyberquery_llm::MockProvider;
    use cyberquery_rag::{MockEmbeddingModel, RagConfig, SemanticIndex};
    use tower::ServiceExt; // for oneshot

    fn create_test_state(response: &str) -> AppState<MockProvider, MockEmbeddingModel> {
        let rag = RagConfig {
            data_dir: "does/not/exist".into(),
            ..RagConfig::default()
        };
        let index = SemanticIndex::from_config(&rag, MockEmbeddingModel::new(32)).unwrap();
        let assistant = Assistant::new(
            MockProvider::new(response),
            Arc::new(index),
            AssistantConfig::default(),
        )
        .unwrap();

        AppState {
            assistant,
            config: Arc::new(ServerConfig::default()),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(create_test_state("{}"));

        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blank_prompt_is_bad_request() {
        let app = create_router(create_test_state("{}"));

        let request = Request::builder()
            .method("POST")
            .uri("/api/code/generate")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"prompt": "   "}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
