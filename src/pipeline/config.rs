//! Run configuration for the evaluation pipeline.
//!
//! Values are layered, lowest priority first: built-in defaults, an optional
//! YAML file, `MULTILOKO_*` environment variables, then CLI flags (applied by
//! the CLI module).

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::llm::{Backend, SamplingParams, DEFAULT_API_BASE};
use crate::prompts::PromptStyle;

/// Default model evaluated when none is configured.
pub const DEFAULT_MODEL: &str = "meta-llama/Meta-Llama-3-8B-Instruct";

/// Default benchmark file.
pub const DEFAULT_INPUT_PATH: &str = "multiloko_eval/dev.jsonl";

/// Default root for per-model result directories.
pub const DEFAULT_OUTPUT_DIR: &str = "model_output";

/// Default cap on generated tokens per answer.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Configuration for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Model identifier sent to the server; also names the output directory.
    pub model: String,
    /// Benchmark JSONL file.
    pub input_path: PathBuf,
    /// Root directory for results.
    pub output_dir: PathBuf,
    pub prompt_style: PromptStyle,
    pub backend: Backend,
    /// Base URL of the OpenAI-compatible server.
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    /// Number of generation calls in flight; 1 runs strictly sequentially.
    pub concurrency: usize,
    /// Per-request timeout; unset waits indefinitely.
    pub request_timeout_secs: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            prompt_style: PromptStyle::FiveShot,
            backend: Backend::default(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            top_p: None,
            concurrency: 1,
            request_timeout_secs: None,
        }
    }
}

impl EvalConfig {
    /// Load configuration from a YAML file; missing keys keep their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override values from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `MULTILOKO_MODEL`: Model identifier
    /// - `MULTILOKO_INPUT`: Benchmark JSONL path
    /// - `MULTILOKO_OUTPUT_DIR`: Results root directory
    /// - `MULTILOKO_PROMPT_STYLE`: `five-shot` or `zero-shot`
    /// - `MULTILOKO_BACKEND`: `completion` (default) or `chat`
    /// - `MULTILOKO_MAX_TOKENS`: Maximum generated tokens
    /// - `MULTILOKO_TEMPERATURE`: Sampling temperature
    /// - `MULTILOKO_TOP_P`: Nucleus sampling parameter
    /// - `MULTILOKO_CONCURRENCY`: Generation calls in flight
    /// - `MULTILOKO_TIMEOUT_SECS`: Per-request timeout in seconds
    /// - `LITELLM_API_BASE`: Server base URL
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env`](Self::apply_env) with an explicit variable lookup.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("MULTILOKO_MODEL") {
            self.model = val;
        }
        if let Some(val) = lookup("MULTILOKO_INPUT") {
            self.input_path = PathBuf::from(val);
        }
        if let Some(val) = lookup("MULTILOKO_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(val);
        }
        if let Some(val) = lookup("MULTILOKO_PROMPT_STYLE") {
            self.prompt_style = parse_enum(&val, "MULTILOKO_PROMPT_STYLE")?;
        }
        if let Some(val) = lookup("MULTILOKO_BACKEND") {
            self.backend = parse_enum(&val, "MULTILOKO_BACKEND")?;
        }
        if let Some(val) = lookup("MULTILOKO_MAX_TOKENS") {
            self.max_tokens = parse_env_value(&val, "MULTILOKO_MAX_TOKENS")?;
        }
        if let Some(val) = lookup("MULTILOKO_TEMPERATURE") {
            self.temperature = Some(parse_env_value(&val, "MULTILOKO_TEMPERATURE")?);
        }
        if let Some(val) = lookup("MULTILOKO_TOP_P") {
            self.top_p = Some(parse_env_value(&val, "MULTILOKO_TOP_P")?);
        }
        if let Some(val) = lookup("MULTILOKO_CONCURRENCY") {
            self.concurrency = parse_env_value(&val, "MULTILOKO_CONCURRENCY")?;
        }
        if let Some(val) = lookup("MULTILOKO_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(parse_env_value(&val, "MULTILOKO_TIMEOUT_SECS")?);
        }
        if let Some(val) = lookup("LITELLM_API_BASE") {
            self.api_base = val;
        }
        Ok(())
    }

    /// Check that all values are usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model cannot be empty".to_string(),
            ));
        }

        if self.model_segments().is_empty() {
            return Err(ConfigError::ValidationFailed(format!(
                "model '{}' does not name an output directory",
                self.model
            )));
        }

        if self.api_base.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "api_base cannot be empty".to_string(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::ValidationFailed(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::ValidationFailed(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                )));
            }
        }

        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(ConfigError::ValidationFailed(format!(
                    "top_p must be between 0.0 and 1.0, got {}",
                    top_p
                )));
            }
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationFailed(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Path segments of the model id that become directories.
    ///
    /// `meta-llama/Meta-Llama-3-8B-Instruct` gives two segments. Empty,
    /// `.` and `..` segments are dropped so the result stays under
    /// `output_dir`.
    pub fn model_segments(&self) -> Vec<&str> {
        Path::new(&self.model)
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect()
    }

    /// Directory holding this model's results.
    pub fn model_dir(&self) -> PathBuf {
        let mut dir = self.output_dir.clone();
        for segment in self.model_segments() {
            dir.push(segment);
        }
        dir
    }

    /// Response file for this model and prompt style.
    pub fn output_path(&self) -> PathBuf {
        self.model_dir().join(self.prompt_style.output_file_name())
    }

    /// Eval file for this model and prompt style.
    pub fn eval_path(&self) -> PathBuf {
        self.model_dir().join(self.prompt_style.eval_file_name())
    }
}

fn parse_env_value<T: std::str::FromStr>(val: &str, key: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    val.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_enum<T: clap::ValueEnum>(val: &str, key: &str) -> Result<T, ConfigError> {
    T::from_str(val.trim(), true).map_err(|message| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    })
}
