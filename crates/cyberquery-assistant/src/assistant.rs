//! The retrieval-augmented answer pipeline

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::prompt::PromptLibrary;
use crate::types::{
    Answer, ChatMessage, CodeExplanationResponse, CodeGenerationResponse,
    CommandGenerationResponse, ExploitSearchResponse, TypedResponse,
};
use cyberquery_domain::{EmbeddingModel, LlmProvider, OutputType, CHAT_TOPIC};
use cyberquery_rag::{format_context, IndexState, SemanticIndex};
use cyberquery_recovery::{
    sanitize_text, Payload, RecoveryConfig, ResponseNormalizer, ResponseRecovery,
    ValidationOutcome,
};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

struct Core<L, E> {
    llm: L,
    index: Arc<SemanticIndex<E>>,
    recovery: ResponseRecovery,
    prompts: PromptLibrary,
    config: AssistantConfig,
}

/// Answers security tasks with a generative model grounded in reference docs
///
/// Cloning is cheap; clones share the model, the index and the config.
///
/// # Examples
///
/// ```no_run
/// use cyberquery_assistant::{Assistant, AssistantConfig};
/// use cyberquery_llm::MockProvider;
/// use cyberquery_rag::{MockEmbeddingModel, RagConfig, SemanticIndex};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let llm = MockProvider::new(r#"{"commands": ["nmap -sV target"], "explanation": "version scan"}"#);
/// let index = SemanticIndex::from_config(&RagConfig::default(), MockEmbeddingModel::new(64))?;
/// let assistant = Assistant::new(llm, Arc::new(index), AssistantConfig::default())?;
///
/// let answer = assistant.generate_command("detect service versions").await?;
/// println!("{:?}", answer.response().commands);
/// # Ok(())
/// # }
/// ```
pub struct Assistant<L, E> {
    core: Arc<Core<L, E>>,
}

impl<L, E> Clone for Assistant<L, E> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<L, E> Assistant<L, E>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    /// Create an assistant over a shared index
    pub fn new(
        llm: L,
        index: Arc<SemanticIndex<E>>,
        config: AssistantConfig,
    ) -> Result<Self, AssistantError> {
        config.validate().map_err(AssistantError::Config)?;

        let recovery = ResponseRecovery::new(
            ResponseNormalizer::new(),
            RecoveryConfig {
                sanitize: config.sanitize_output,
                ..RecoveryConfig::default()
            },
        );

        Ok(Self {
            core: Arc::new(Core {
                llm,
                index,
                recovery,
                prompts: PromptLibrary::new(),
                config,
            }),
        })
    }

    /// The shared semantic index
    pub fn index(&self) -> &Arc<SemanticIndex<E>> {
        &self.core.index
    }

    /// Current state of the semantic index
    pub fn index_state(&self) -> IndexState {
        self.core.index.state()
    }

    /// Active configuration
    pub fn config(&self) -> &AssistantConfig {
        &self.core.config
    }

    /// Name of the generation model
    pub fn model_name(&self) -> &str {
        self.core.llm.model_name()
    }

    /// Build the prompt for a task without calling the model
    ///
    /// Runs retrieval, so it may block on the embedding backend.
    pub fn assemble(&self, output_type: OutputType, task: &str) -> Result<String, AssistantError> {
        self.core.assemble(output_type, task)
    }

    /// Generate and recover a structured answer
    ///
    /// Retrieval and the model call run on the blocking pool under the
    /// configured timeout. A degraded answer is still `Ok`.
    pub async fn generate(
        &self,
        output_type: OutputType,
        task: &str,
    ) -> Result<ValidationOutcome, AssistantError> {
        let task = task.to_string();
        self.run_blocking(move |core| core.generate(output_type, &task)).await
    }

    /// Ready-to-run commands for a task
    pub async fn generate_command(
        &self,
        task: &str,
    ) -> Result<Answer<CommandGenerationResponse>, AssistantError> {
        self.typed(task).await
    }

    /// A command or script for a task
    pub async fn generate_code(
        &self,
        task: &str,
    ) -> Result<Answer<CodeGenerationResponse>, AssistantError> {
        self.typed(task).await
    }

    /// Step-by-step explanation of a piece of code
    pub async fn explain_code(
        &self,
        code: &str,
    ) -> Result<Answer<CodeExplanationResponse>, AssistantError> {
        self.typed(code).await
    }

    /// Known exploits for a described target
    pub async fn search_exploits(
        &self,
        target: &str,
    ) -> Result<Answer<ExploitSearchResponse>, AssistantError> {
        self.typed(target).await
    }

    /// Free-form conversational reply
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<String, AssistantError> {
        let message = message.to_string();
        let history = render_history(history);
        self.run_blocking(move |core| core.chat(&message, &history)).await
    }

    /// Rebuild the index from disk and return the number of indexed chunks
    pub async fn rebuild_index(&self) -> Result<usize, AssistantError> {
        let index = Arc::clone(&self.core.index);
        let state = tokio::task::spawn_blocking(move || index.rebuild()).await?;

        match state {
            IndexState::Ready { chunks } => Ok(chunks),
            IndexState::Empty => Ok(0),
            IndexState::Unbuilt => Err(AssistantError::IndexUnavailable),
        }
    }

    async fn typed<T: TypedResponse>(&self, task: &str) -> Result<Answer<T>, AssistantError> {
        match self.generate(T::OUTPUT_TYPE, task).await? {
            ValidationOutcome::Accepted(payload) => Ok(Answer::Complete(into_typed(payload)?)),
            ValidationOutcome::Degraded { payload, missing } => Ok(Answer::Partial {
                response: into_typed(payload)?,
                missing,
            }),
            ValidationOutcome::Rejected { reason, raw_text } => Err(AssistantError::InvalidResponse {
                reason,
                raw: raw_text,
            }),
        }
    }

    async fn run_blocking<T, F>(&self, work: F) -> Result<T, AssistantError>
    where
        T: Send + 'static,
        F: FnOnce(&Core<L, E>) -> Result<T, AssistantError> + Send + 'static,
    {
        let core = Arc::clone(&self.core);
        let limit = self.core.config.generation_timeout();

        let handle = tokio::task::spawn_blocking(move || work(&core));
        match timeout(limit, handle).await {
            Ok(joined) => joined?,
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "Generation timed out");
                Err(AssistantError::Timeout(limit.as_secs()))
            }
        }
    }
}

impl<L, E> Core<L, E>
where
    L: LlmProvider,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    fn assemble(&self, output_type: OutputType, task: &str) -> Result<String, AssistantError> {
        // Code under explanation is rendered inside a fence, verbatim
        let task = if output_type == OutputType::Explanation {
            task.to_string()
        } else {
            self.scrub(task)
        };

        let context = self.context_for(output_type.retrieval_topic(), &task);
        let prompt = self.prompts.render(output_type, &task, &context)?;
        if self.fits(&prompt) || context.is_empty() {
            debug!(output_type = %output_type, chars = prompt.len(), "Prompt assembled");
            return Ok(prompt);
        }

        warn!(
            output_type = %output_type,
            chars = prompt.chars().count(),
            max = self.config.max_prompt_chars,
            "Prompt too long, dropping reference documentation"
        );
        Ok(self.prompts.render(output_type, &task, "")?)
    }

    fn generate(&self, output_type: OutputType, task: &str) -> Result<ValidationOutcome, AssistantError> {
        let prompt = self.assemble(output_type, task)?;
        let raw = self.call_llm(&prompt)?;

        let outcome = self.recovery.recover(&raw, output_type);
        match &outcome {
            ValidationOutcome::Accepted(_) => debug!(output_type = %output_type, "Answer accepted"),
            ValidationOutcome::Degraded { missing, .. } => {
                warn!(output_type = %output_type, ?missing, "Answer degraded")
            }
            ValidationOutcome::Rejected { reason, .. } => {
                warn!(output_type = %output_type, %reason, "Answer rejected")
            }
        }
        Ok(outcome)
    }

    fn chat(&self, message: &str, history: &str) -> Result<String, AssistantError> {
        let message = self.scrub(message);
        let history = if self.config.sanitize_output {
            sanitize_text(history)
        } else {
            history.to_string()
        };

        let context = self.context_for(CHAT_TOPIC, &message);
        let mut prompt = self.prompts.render_chat(&message, &history, &context)?;
        if !self.fits(&prompt) && !context.is_empty() {
            warn!(chars = prompt.chars().count(), "Chat prompt too long, dropping reference documentation");
            prompt = self.prompts.render_chat(&message, &history, "")?;
        }

        let reply = self.call_llm(&prompt)?;
        Ok(self.scrub(&reply))
    }

    fn context_for(&self, topic: &str, task: &str) -> String {
        let query = format!("{} {}", topic, task);
        let results = self.index.query(query.trim(), self.config.context_k);
        if results.is_empty() {
            debug!(topic, "No reference context");
        }
        format_context(&results)
    }

    fn call_llm(&self, prompt: &str) -> Result<String, AssistantError> {
        let started = Instant::now();
        let raw = self
            .llm
            .generate(prompt)
            .map_err(|e| AssistantError::Generation {
                detail: e.to_string(),
                raw: None,
            })?;

        info!(
            model = self.llm.model_name(),
            prompt_chars = prompt.len(),
            response_chars = raw.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(raw)
    }

    fn scrub(&self, text: &str) -> String {
        if self.config.sanitize_output {
            sanitize_text(text)
        } else {
            text.to_string()
        }
    }

    fn fits(&self, prompt: &str) -> bool {
        prompt.chars().count() <= self.config.max_prompt_chars
    }
}

fn into_typed<T: TypedResponse>(payload: Payload) -> Result<T, AssistantError> {
    let raw = serde_json::Value::Object(payload.clone()).to_string();
    T::from_payload(payload).map_err(|e| AssistantError::InvalidResponse {
        reason: format!("Answer does not match the {} shape: {}", T::OUTPUT_TYPE, e),
        raw,
    })
}

/// Render prior turns as `role: content` lines
pub fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|msg| format!("{}: {}\n", msg.role, msg.content))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_history() {
        let history = vec![
            ChatMessage::new("user", "hi"),
            ChatMessage::new("assistant", "hello"),
        ];
        assert_eq!(render_history(&history), "user: hi\nassistant: hello\n");
        assert_eq!(render_history(&[]), "");
    }
}
