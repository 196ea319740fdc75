//! multiloko-eval: few-shot evaluation harness for LLMs on the multiloko
//! Italian question-answering benchmark.
//!
//! The library loads benchmark records, renders prompts, collects model
//! completions from an OpenAI-compatible server and writes the response and
//! eval files consumed by the downstream scorer.

pub mod cli;
pub mod dataset;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompts;

// Re-export commonly used error types
pub use error::{ConfigError, DatasetError, LlmError, PipelineError};
