//! End-to-end evaluation run: load, generate, project.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::config::EvalConfig;
use super::generator::ResponseGenerator;
use super::projector::project_eval;
use crate::dataset::load_records;
use crate::error::PipelineError;
use crate::llm::TextGenerator;

/// What a completed run produced.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub model: String,
    pub prompt_style: String,
    pub records: usize,
    pub output_path: PathBuf,
    pub eval_path: PathBuf,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

/// Create the model's result directory if it does not exist yet.
pub fn prepare_output_dir(config: &EvalConfig) -> Result<PathBuf, PipelineError> {
    let dir = config.model_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        tracing::debug!(path = %dir.display(), "Created output directory");
    }
    Ok(dir)
}

/// Run the full pipeline described by `config` against `generator`.
///
/// Writes the response file and then the eval file under
/// [`EvalConfig::model_dir`]. Any error aborts the run.
pub async fn run_pipeline(
    config: &EvalConfig,
    generator: Arc<dyn TextGenerator>,
) -> Result<PipelineSummary, PipelineError> {
    let started = Instant::now();
    let output_path = config.output_path();
    let eval_path = config.eval_path();

    tracing::info!(
        model = %config.model,
        input = %config.input_path.display(),
        style = %config.prompt_style,
        "Starting evaluation run"
    );

    let records = load_records(&config.input_path)?;
    prepare_output_dir(config)?;

    let written = ResponseGenerator::new(generator, config.prompt_style)
        .with_concurrency(config.concurrency)
        .generate_to_file(&records, &output_path)
        .await?;

    let projected = project_eval(&output_path, &eval_path)?;
    debug_assert_eq!(written, projected);

    let summary = PipelineSummary {
        model: config.model.clone(),
        prompt_style: config.prompt_style.to_string(),
        records: written,
        output_path,
        eval_path,
        duration_ms: started.elapsed().as_millis() as u64,
        completed_at: Utc::now(),
    };

    tracing::info!(
        records = summary.records,
        duration_ms = summary.duration_ms,
        "Evaluation run complete"
    );
    Ok(summary)
}
