//! Record types for the multiloko benchmark files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single benchmark question as read from the input JSONL file.
///
/// Only the four fields the harness needs are kept; anything else on the
/// input line (source text, single `target`, ...) is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier, the join key across every file the run writes.
    pub id: String,
    /// The question in Italian.
    pub question: String,
    /// Acceptable answers, in file order.
    pub targets: Vec<String>,
    /// Free-text description of the expected answer kind (e.g. "una data").
    pub output_type: String,
}

/// Insertion-ordered set of records keyed by `id`.
///
/// Inserting an id that is already present replaces the stored record but
/// keeps the position where the id first appeared.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the record it replaced if the id was
    /// already present.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        match self.index.get(&record.id) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index.insert(record.id.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&pos| &self.records[pos])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in first-occurrence order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Ids in first-occurrence order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut set = RecordSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// One line of the response file: the input record plus what the model said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub id: String,
    pub question: String,
    pub response: String,
    pub targets: Vec<String>,
    pub output_type: String,
    /// Exact prompt text sent to the model.
    pub prompt: String,
}

impl OutputRecord {
    pub fn new(record: &Record, prompt: String, response: String) -> Self {
        Self {
            id: record.id.clone(),
            question: record.question.clone(),
            response,
            targets: record.targets.clone(),
            output_type: record.output_type.clone(),
            prompt,
        }
    }
}

/// Language tag written on every eval line.
pub const EVAL_LANGUAGE: &str = "italian";

/// One line of the eval file consumed by the downstream scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalRecord {
    pub language: String,
    pub id: String,
    pub prediction: String,
}

impl EvalRecord {
    pub fn new(id: impl Into<String>, prediction: impl Into<String>) -> Self {
        Self {
            language: EVAL_LANGUAGE.to_string(),
            id: id.into(),
            prediction: prediction.into(),
        }
    }
}
