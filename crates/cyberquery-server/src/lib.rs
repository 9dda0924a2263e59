//! CyberQuery Server
//!
//! HTTP surface for the assistant: structured command, code, explanation and
//! exploit answers, free-form chat, and an operator-triggered index rebuild.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::ServerConfig;
use cyberquery_assistant::{Assistant, AssistantError};
use cyberquery_llm::{LlmError, OllamaProvider};
use cyberquery_rag::{EmbeddingError, OllamaEmbeddingModel, RagError, SemanticIndex};
use handlers::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Generation backend could not be created
    #[error("Model backend error: {0}")]
    Llm(#[from] LlmError),

    /// Embedding backend could not be created
    #[error("Embedding backend error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Retrieval layer could not be created
    #[error("Retrieval error: {0}")]
    Rag(#[from] RagError),

    /// Assistant could not be created
    #[error("Assistant error: {0}")]
    Assistant(#[from] AssistantError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Start options beyond the config file
#[derive(Debug, Clone, Copy, Default)]
pub struct StartOptions {
    /// Build the index before accepting requests
    pub build_index: bool,
}

/// Start the HTTP server
///
/// Creates the Ollama backends, the semantic index and the assistant, then
/// serves until the process is stopped. Without `build_index` the index is
/// built lazily by the first request that needs context.
pub async fn start_server(config: ServerConfig, options: StartOptions) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting CyberQuery server");
    info!("Bind address: {}", config.bind_addr());
    info!("Model: {} at {}", config.model.model, config.model.endpoint);
    info!("Corpus: {}", config.rag.data_dir.display());

    let llm = OllamaProvider::with_timeout(
        config.model.endpoint.as_str(),
        config.model.model.as_str(),
        config.assistant.generation_timeout(),
    )?
    .with_max_retries(config.model.max_retries)
    .with_budget(config.assistant.generation_timeout());

    let embedder = OllamaEmbeddingModel::new(
        config.model.endpoint.as_str(),
        config.model.embedding_model.as_str(),
        config.rag.embedding_dimension,
    )?;

    let index = Arc::new(SemanticIndex::from_config(&config.rag, embedder)?);
    let assistant = Assistant::new(llm, Arc::clone(&index), config.assistant.clone())?;

    if options.build_index {
        match assistant.rebuild_index().await {
            Ok(chunks) => info!(chunks, "Semantic index ready"),
            Err(e) => warn!(error = %e, "Index build failed, serving without context"),
        }
    }

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", config.bind_addr());

    let state = AppState {
        assistant,
        config: Arc::new(config),
    };
    let app = create_router(state);

    axum::serve(listener, app)
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    Ok(())
}
