//! Client for OpenAI-compatible inference servers.
//!
//! Works against anything exposing the OpenAI HTTP surface: a local vLLM
//! server, a LiteLLM proxy, or OpenRouter. Both the chat endpoint
//! (`/chat/completions`) and the raw text-completion endpoint
//! (`/completions`) are supported.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::types::{
    Choice, GenerationRequest, GenerationResponse, Message, TextChoice, TextCompletionRequest,
    TextCompletionResponse, Usage,
};
use crate::error::LlmError;

/// Default API base: a vLLM OpenAI-compatible server on localhost.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/v1";

/// Trait for LLM providers that can answer chat requests.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError>;
}

/// Client for OpenAI-compatible APIs.
pub struct OpenAiClient {
    api_base: String,
    api_key: Option<String>,
    default_model: String,
    http_client: Client,
}

impl OpenAiClient {
    /// Create a client with explicit configuration.
    ///
    /// # Arguments
    ///
    /// * `api_base` - Base URL including the version prefix (e.g. "http://localhost:8000/v1")
    /// * `api_key` - Optional bearer token
    /// * `default_model` - Model used when a request leaves `model` empty
    /// * `timeout` - Per-request timeout; `None` waits indefinitely
    pub fn new(
        api_base: impl Into<String>,
        api_key: Option<String>,
        default_model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| LlmError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            default_model: default_model.into(),
            http_client,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn resolve_model(&self, model: String) -> String {
        if model.is_empty() {
            self.default_model.clone()
        } else {
            model
        }
    }

    /// Request a raw text completion for a prompt.
    pub async fn complete_text(
        &self,
        mut request: TextCompletionRequest,
    ) -> Result<TextCompletionResponse, LlmError> {
        request.model = self.resolve_model(request.model);
        let api_response: ApiTextResponse = self.post_json("completions", &request).await?;

        Ok(TextCompletionResponse {
            id: api_response.id,
            model: api_response.model,
            choices: api_response
                .choices
                .into_iter()
                .map(|choice| TextChoice {
                    index: choice.index,
                    text: choice.text,
                    finish_reason: choice.finish_reason,
                })
                .collect(),
            usage: api_response.usage.map(Usage::from).unwrap_or_default(),
        })
    }

    /// POST a JSON body to `{api_base}/{path}` and decode the JSON reply.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, LlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.api_base, path);

        let mut http_request = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref api_key) = self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let http_response = http_request
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(api_error(status_code, error_text));
        }

        http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))
    }
}

/// Map a non-success HTTP reply to an `LlmError`.
fn api_error(status_code: u16, error_text: String) -> LlmError {
    let message = match serde_json::from_str::<ApiErrorResponse>(&error_text) {
        Ok(error_response) => error_response.error.message,
        Err(_) => error_text,
    };

    if status_code == 429 {
        LlmError::RateLimited(message)
    } else {
        LlmError::ApiError {
            code: status_code,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
struct ApiChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    id: String,
    model: String,
    choices: Vec<ApiChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChatChoice {
    index: u32,
    message: ApiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    role: String,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiTextResponse {
    id: String,
    model: String,
    choices: Vec<ApiTextChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiTextChoice {
    index: u32,
    text: String,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<ApiUsage> for Usage {
    fn from(usage: ApiUsage) -> Self {
        Usage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let api_request = ApiChatRequest {
            model: self.resolve_model(request.model),
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            top_p: request.top_p,
        };

        let api_response: ApiChatResponse =
            self.post_json("chat/completions", &api_request).await?;

        // Only the first choice is ever read; later ones may carry null content.
        let choices = match api_response.choices.into_iter().next() {
            Some(choice) => {
                let content = choice.message.content.ok_or_else(|| {
                    LlmError::ParseError(format!("Choice {} has no message content", choice.index))
                })?;
                vec![Choice {
                    index: choice.index,
                    message: Message {
                        role: choice.message.role,
                        content,
                    },
                    finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
                }]
            }
            None => Vec::new(),
        };

        Ok(GenerationResponse {
            id: api_response.id,
            model: api_response.model,
            choices,
            usage: api_response.usage.map(Usage::from).unwrap_or_default(),
        })
    }
}
