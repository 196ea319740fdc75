//! Error types for multiloko-eval operations.
//!
//! Defines error types for each stage of the evaluation run:
//! - Benchmark record loading
//! - LLM backend interactions
//! - Response generation and eval projection
//! - Configuration loading and validation
//!
//! None of these are recovered from inside the pipeline: the first error
//! aborts the run and is reported by the CLI.

use thiserror::Error;

/// Errors that can occur while loading benchmark records.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("LLM returned no completions")]
    EmptyResponse,
}

/// Errors that can occur while generating responses or projecting eval data.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Generation failed for record '{id}': {source}")]
    Record {
        id: String,
        #[source]
        source: LlmError,
    },

    #[error("Invalid output record on line {line}: {source}")]
    OutputRecord {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
