//! JSONL loader for benchmark records.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::types::{Record, RecordSet};
use crate::error::DatasetError;

/// Load every record from a JSONL file.
///
/// Each line must be a JSON object carrying at least `id`, `question`,
/// `targets` and `output_type`. The first malformed line aborts the load.
///
/// # Errors
///
/// Returns `DatasetError::Io` if the file cannot be opened or read, and
/// `DatasetError::Parse` (with a 1-based line number) for a line that is not
/// valid JSON or lacks a required field.
pub fn load_records(path: impl AsRef<Path>) -> Result<RecordSet, DatasetError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let records = parse_records(BufReader::new(file))?;
    tracing::info!(
        path = %path.display(),
        records = records.len(),
        "Loaded benchmark records"
    );
    Ok(records)
}

/// Parse JSONL records from any buffered reader.
///
/// Duplicate ids overwrite the earlier record's fields.
pub fn parse_records<R: BufRead>(reader: R) -> Result<RecordSet, DatasetError> {
    let mut records = RecordSet::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let record: Record = serde_json::from_str(line.trim())
            .map_err(|source| DatasetError::Parse {
                line: idx + 1,
                source,
            })?;

        if let Some(previous) = records.insert(record) {
            tracing::debug!(id = %previous.id, line = idx + 1, "Duplicate record id overwritten");
        }
    }

    Ok(records)
}
