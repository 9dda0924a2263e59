//! Scripted generation backend for tests

use crate::LlmError;
use cyberquery_domain::LlmProvider;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail,
}

impl Reply {
    fn resolve(&self) -> Result<String, LlmError> {
        match self {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(LlmError::Other("Mock error".to_string())),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock LLM provider for deterministic testing
///
/// Answers from a script instead of a model: a per-prompt reply when one is
/// registered, the fallback reply otherwise. Every prompt is recorded, and
/// clones share the script and the recording.
///
/// # Examples
///
/// ```
/// use cyberquery_llm::MockProvider;
/// use cyberquery_domain::LlmProvider;
///
/// let mut provider = MockProvider::new(r#"{"explanation": "fallback"}"#);
/// provider.add_response("list files", r#"{"commands": ["ls -la"], "explanation": "long listing"}"#);
/// provider.add_error("make coffee");
///
/// assert!(provider.generate("list files").unwrap().contains("ls -la"));
/// assert!(provider.generate("anything else").unwrap().contains("fallback"));
/// assert!(provider.generate("make coffee").is_err());
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    fallback: Reply,
    model_name: String,
    script: Arc<Mutex<HashMap<String, Reply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a provider that answers every prompt with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_fallback(Reply::Text(response.into()))
    }

    /// Create a provider that fails on every prompt
    pub fn failing() -> Self {
        Self::with_fallback(Reply::Fail)
    }

    fn with_fallback(fallback: Reply) -> Self {
        Self {
            fallback,
            model_name: "mock".to_string(),
            script: Arc::new(Mutex::new(HashMap::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Override the reported model name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Answer `prompt` with `response`
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        lock(&self.script).insert(prompt.into(), Reply::Text(response.into()));
    }

    /// Fail on `prompt`
    pub fn add_error(&mut self, prompt: impl Into<String>) {
        lock(&self.script).insert(prompt.into(), Reply::Fail);
    }

    /// Number of prompts received
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Forget every recorded prompt
    pub fn reset_call_count(&self) {
        lock(&self.prompts).clear();
    }

    /// The most recent prompt received, if any
    pub fn last_prompt(&self) -> Option<String> {
        lock(&self.prompts).last().cloned()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        lock(&self.prompts).push(prompt.to_string());

        let scripted = lock(&self.script).get(prompt).cloned();
        scripted.unwrap_or_else(|| self.fallback.clone()).resolve()
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
