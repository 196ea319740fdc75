//! Response generation: one prompt and one completion per benchmark record.

use futures::{stream, StreamExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::dataset::{OutputRecord, RecordSet};
use crate::error::PipelineError;
use crate::llm::TextGenerator;
use crate::prompts::PromptStyle;

/// Log an info-level progress line every this many records.
const PROGRESS_INTERVAL: usize = 50;

/// Drives a [`TextGenerator`] over every record and writes the response file.
pub struct ResponseGenerator {
    generator: Arc<dyn TextGenerator>,
    style: PromptStyle,
    concurrency: usize,
}

impl ResponseGenerator {
    /// Create a generator that runs strictly sequentially.
    pub fn new(generator: Arc<dyn TextGenerator>, style: PromptStyle) -> Self {
        Self {
            generator,
            style,
            concurrency: 1,
        }
    }

    /// Allow up to `concurrency` generation calls in flight.
    ///
    /// Completions are still written in record order. Values below 1 are
    /// treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Generate a response for every record and write one JSON line each to
    /// `path`, truncating any existing file.
    ///
    /// Each line is flushed as soon as it is written. The first failing
    /// record aborts the run; lines written before it stay in the file.
    ///
    /// Returns the number of lines written.
    pub async fn generate_to_file(
        &self,
        records: &RecordSet,
        path: impl AsRef<Path>,
    ) -> Result<usize, PipelineError> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);

        let style = self.style;
        let generator = &self.generator;
        let total = records.len();

        tracing::info!(
            records = total,
            model = generator.model(),
            style = %style,
            concurrency = self.concurrency,
            path = %path.display(),
            "Generating responses"
        );

        let mut completions = stream::iter(records.iter().map(|record| async move {
            let prompt = style.build(&record.question, &record.output_type);
            let result = generator.complete(&prompt).await;
            (record, prompt, result)
        }))
        .buffered(self.concurrency);

        let mut written = 0;
        while let Some((record, prompt, result)) = completions.next().await {
            let response = result.map_err(|source| PipelineError::Record {
                id: record.id.clone(),
                source,
            })?;

            let output = OutputRecord::new(record, prompt, response);
            serde_json::to_writer(&mut writer, &output)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            written += 1;

            tracing::debug!(id = %record.id, written, total, "Response written");
            if written % PROGRESS_INTERVAL == 0 {
                tracing::info!(written, total, "Generation progress");
            }
        }

        Ok(written)
    }
}
