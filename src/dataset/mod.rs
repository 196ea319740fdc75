//! Benchmark data model and loading.
//!
//! Input records come from a JSONL file with one question per line; the
//! harness writes two derived JSONL files, the response file
//! ([`OutputRecord`]) and the eval file ([`EvalRecord`]).

pub mod loader;
pub mod types;

pub use loader::{load_records, parse_records};
pub use types::{EvalRecord, OutputRecord, Record, RecordSet, EVAL_LANGUAGE};
