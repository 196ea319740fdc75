//! Prompt-in, text-out generation backends.
//!
//! The response generator only needs one capability: given a prompt string,
//! return the completion text. [`TextGenerator`] is that seam; the concrete
//! backend is chosen at startup and injected into the pipeline.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::client::{LlmProvider, OpenAiClient};
use super::types::{GenerationRequest, Message, SamplingParams, TextCompletionRequest};
use crate::error::LlmError;

/// Something that turns a prompt into completion text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Return the text of the first completion for `prompt`.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier used for requests, for logging.
    fn model(&self) -> &str;
}

/// Which server endpoint a run talks to.
///
/// The benchmark prompts end in an open `R:` slot for the model to
/// continue, so raw completion is the default. `Chat` wraps the prompt in
/// the server's chat template instead.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Prompt sent as a single user message to `/chat/completions`.
    Chat,
    /// Prompt sent verbatim to `/completions`.
    #[default]
    Completion,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Chat => "chat",
            Backend::Completion => "completion",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sends each prompt as a one-message chat conversation.
pub struct ChatBackend {
    provider: Arc<dyn LlmProvider>,
    model: String,
    sampling: SamplingParams,
}

impl ChatBackend {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        sampling: SamplingParams,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            sampling,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatBackend {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerationRequest::new(self.model.clone(), vec![Message::user(prompt)])
            .with_sampling(&self.sampling);

        let response = self.provider.generate(request).await?;
        tracing::trace!(
            response_id = %response.id,
            completion_tokens = response.usage.completion_tokens,
            "Chat completion received"
        );
        response
            .first_content()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Sends each prompt verbatim to the text-completion endpoint.
pub struct CompletionBackend {
    client: Arc<OpenAiClient>,
    model: String,
    sampling: SamplingParams,
}

impl CompletionBackend {
    pub fn new(client: Arc<OpenAiClient>, model: impl Into<String>, sampling: SamplingParams) -> Self {
        Self {
            client,
            model: model.into(),
            sampling,
        }
    }
}

#[async_trait]
impl TextGenerator for CompletionBackend {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request =
            TextCompletionRequest::new(self.model.clone(), prompt).with_sampling(&self.sampling);

        let response = self.client.complete_text(request).await?;
        tracing::trace!(
            response_id = %response.id,
            completion_tokens = response.usage.completion_tokens,
            "Text completion received"
        );
        response
            .first_text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyResponse)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
