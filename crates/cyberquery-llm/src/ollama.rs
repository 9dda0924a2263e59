//! Ollama Provider Implementation
//!
//! Provides integration with Ollama's local LLM API.
//!
//! # Features
//!
//! - Async HTTP communication with the `/api/generate` endpoint
//! - Synchronous `LlmProvider` implementation through [`BlockingBridge`]
//! - Retry logic with capped exponential backoff
//! - Per-request timeout plus an optional whole-call budget that bounds
//!   every attempt and backoff sleep together
//!
//! # Examples
//!
//! ```no_run
//! use cyberquery_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "mistral").unwrap();
//! ```

use crate::bridge::BlockingBridge;
use crate::LlmError;
use cyberquery_domain::LlmProvider;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Largest accepted number of attempts
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Ceiling for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    budget: Option<Duration>,
    bridge: BlockingBridge,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

enum Attempt {
    Done(String),
    Fatal(LlmError),
    Retry(LlmError),
}

/// Sleep before the attempt after `attempt`: 1s, 2s, 4s, ... capped
fn backoff(attempt: u32) -> Duration {
    let secs = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_secs(secs).min(MAX_BACKOFF)
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "mistral", "llama3.2")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a new Ollama provider with an explicit request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        let bridge = BlockingBridge::new()
            .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            budget: None,
            bridge,
        })
    }

    /// Create a new Ollama provider against the default local endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Set the maximum number of attempts, clamped to `1..=MAX_RETRIES_LIMIT`
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.clamp(1, MAX_RETRIES_LIMIT);
        self
    }

    /// Bound a whole `generate` call, retries and backoff included
    ///
    /// Once the budget is spent the call fails instead of starting another
    /// attempt, so a caller that gave up does not leave retries running.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Endpoint this provider talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Generate text using the Ollama API
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ollama is not running
    /// - Model is not available
    /// - Network communication fails
    /// - Response format is invalid
    pub async fn generate_async(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request_body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let started = Instant::now();
        let deadline = self.budget.map(|budget| started + budget);
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            let outcome = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    match tokio::time::timeout(remaining, self.attempt(&url, &request_body)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!(attempt = attempts + 1, "Generation budget exhausted");
                            return Err(LlmError::Communication(format!(
                                "No response within {:?}",
                                self.budget.unwrap_or_default()
                            )));
                        }
                    }
                }
                None => self.attempt(&url, &request_body).await,
            };

            match outcome {
                Attempt::Done(text) => {
                    debug!(
                        model = %self.model,
                        duration_ms = started.elapsed().as_millis() as u64,
                        response_chars = text.len(),
                        "Generation complete"
                    );
                    return Ok(text);
                }
                Attempt::Fatal(e) => return Err(e),
                Attempt::Retry(e) => last_error = Some(e),
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = backoff(attempts);
                if deadline.is_some_and(|deadline| Instant::now() + delay >= deadline) {
                    debug!(attempt = attempts, "No budget left for another attempt");
                    break;
                }
                warn!(attempt = attempts, ?delay, "Generation attempt failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }

    async fn attempt(&self, url: &str, body: &OllamaGenerateRequest<'_>) -> Attempt {
        let response = match self.client.post(url).json(body).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(LlmError::Communication(format!("Request failed: {}", e))),
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Attempt::Fatal(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retry(LlmError::RateLimitExceeded);
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return Attempt::Retry(LlmError::Communication(format!(
                    "Failed to read response: {}",
                    e
                )))
            }
        };
        if !status.is_success() {
            return Attempt::Retry(LlmError::Communication(format!("HTTP {}: {}", status, text)));
        }

        match serde_json::from_str::<OllamaGenerateResponse>(&text) {
            Ok(parsed) => Attempt::Done(parsed.response),
            Err(e) => Attempt::Fatal(LlmError::InvalidResponse(format!(
                "Failed to parse response: {}",
                e
            ))),
        }
    }
}

impl LlmProvider for OllamaProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.bridge.block_on(self.generate_async(prompt))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
