//! LLM integration for multiloko-eval.
//!
//! The harness talks to an OpenAI-compatible inference server (vLLM, a
//! LiteLLM proxy, OpenRouter, ...). Model loading, device placement and
//! tokenization all live on the server side.
//!
//! ```ignore
//! use multiloko_eval::llm::{CompletionBackend, OpenAiClient, SamplingParams, TextGenerator};
//! use std::sync::Arc;
//!
//! let client = OpenAiClient::new("http://localhost:8000/v1", None, "", None)?;
//! let backend = CompletionBackend::new(
//!     Arc::new(client),
//!     "meta-llama/Meta-Llama-3-8B-Instruct",
//!     SamplingParams::default(),
//! );
//! let text = backend.complete("D: Quando si festeggia Ferragosto?\nR:").await?;
//! ```

pub mod client;
pub mod generator;
pub mod types;

#[cfg(test)]
pub(crate) mod test_server;

pub use client::{LlmProvider, OpenAiClient, DEFAULT_API_BASE};
pub use generator::{Backend, ChatBackend, CompletionBackend, TextGenerator};
pub use types::{
    Choice, GenerationRequest, GenerationResponse, Message, SamplingParams, TextChoice,
    TextCompletionRequest, TextCompletionResponse, Usage,
};
