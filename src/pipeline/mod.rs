//! Evaluation pipeline.
//!
//! Stages run strictly in order:
//!
//! 1. load benchmark records ([`crate::dataset`])
//! 2. for each record, build a prompt and ask the backend for a completion,
//!    appending one line to the response file ([`generator`])
//! 3. project the response file into the eval file ([`projector`])
//!
//! [`run_pipeline`] wires the stages together from an [`EvalConfig`].

pub mod config;
pub mod generator;
pub mod projector;
pub mod runner;

pub use config::{
    EvalConfig, DEFAULT_INPUT_PATH, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_OUTPUT_DIR,
};
pub use generator::ResponseGenerator;
pub use projector::project_eval;
pub use runner::{prepare_output_dir, run_pipeline, PipelineSummary};
