//! Projection of the response file into the eval file.

use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::dataset::EvalRecord;
use crate::error::PipelineError;

/// The two fields of a response line the eval file needs.
#[derive(Debug, Deserialize)]
struct ResponseLine {
    id: String,
    response: String,
}

/// Read every line of the response file at `output_path` and write the
/// matching eval line to `eval_path`.
///
/// All input lines are read before the eval file is created, so a malformed
/// response file leaves no eval file behind. Returns the number of lines
/// written.
pub fn project_eval(
    output_path: impl AsRef<Path>,
    eval_path: impl AsRef<Path>,
) -> Result<usize, PipelineError> {
    let output_path = output_path.as_ref();
    let eval_path = eval_path.as_ref();

    let reader = BufReader::new(File::open(output_path)?);
    let mut eval_records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let entry: ResponseLine = serde_json::from_str(line.trim()).map_err(|source| {
            PipelineError::OutputRecord {
                line: idx + 1,
                source,
            }
        })?;
        eval_records.push(EvalRecord::new(entry.id, entry.response));
    }

    let mut writer = BufWriter::new(File::create(eval_path)?);
    for record in &eval_records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    tracing::info!(
        records = eval_records.len(),
        path = %eval_path.display(),
        "Eval file written"
    );
    Ok(eval_records.len())
}
