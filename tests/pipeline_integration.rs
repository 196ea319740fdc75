//! End-to-end pipeline tests with a scripted text generator.
//!
//! No server is needed: the generator answers from a fixed table.

use async_trait::async_trait;
use multiloko_eval::dataset::{load_records, EvalRecord, OutputRecord};
use multiloko_eval::llm::TextGenerator;
use multiloko_eval::pipeline::{run_pipeline, EvalConfig};
use multiloko_eval::prompts::{build_prompt, PromptStyle};
use multiloko_eval::{LlmError, PipelineError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Answers by question text; unknown questions get "non lo so".
struct ScriptedGenerator {
    answers: HashMap<String, String>,
    calls: AtomicUsize,
    jitter: bool,
}

impl ScriptedGenerator {
    fn new(answers: &[(&str, &str)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(q, a)| (q.to_string(), a.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
            jitter: false,
        }
    }

    fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.jitter {
            // Earlier calls finish later so completions arrive out of order
            tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(call as u64 * 10))).await;
        }

        let target = prompt.rsplit("\n\n").next().unwrap_or(prompt);
        for (question, answer) in &self.answers {
            if target.contains(question.as_str()) {
                return Ok(answer.clone());
            }
        }
        Ok("non lo so".to_string())
    }

    fn model(&self) -> &str {
        "scripted/model"
    }
}

/// Always fails.
struct BrokenGenerator;

#[async_trait]
impl TextGenerator for BrokenGenerator {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::ApiError {
            code: 503,
            message: "model not loaded".to_string(),
        })
    }

    fn model(&self) -> &str {
        "broken"
    }
}

const FERRAGOSTO: &str = r#"{"id":"A1","question":"Quando si festeggia Ferragosto?","targets":["15 agosto"],"output_type":"data"}"#;

fn config_for(dir: &Path, input: &str, style: PromptStyle) -> EvalConfig {
    let input_path = dir.join("dev.jsonl");
    std::fs::write(&input_path, input).expect("should write input");
    EvalConfig {
        model: "scripted/model".to_string(),
        input_path,
        output_dir: dir.join("model_output"),
        prompt_style: style,
        ..EvalConfig::default()
    }
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    std::fs::read_to_string(path)
        .expect("should read file")
        .lines()
        .map(|l| serde_json::from_str(l).expect("line should parse"))
        .collect()
}

#[tokio::test]
async fn test_ferragosto_scenario() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = config_for(dir.path(), &format!("{FERRAGOSTO}\n"), PromptStyle::FiveShot);
    let generator = Arc::new(ScriptedGenerator::new(&[(
        "Quando si festeggia Ferragosto?",
        "15 agosto",
    )]));

    let summary = run_pipeline(&config, generator)
        .await
        .expect("pipeline should succeed");

    assert_eq!(summary.records, 1);
    assert_eq!(
        summary.output_path,
        dir.path()
            .join("model_output/scripted/model/dev_5shot.jsonl")
    );

    let outputs: Vec<OutputRecord> = read_jsonl(&summary.output_path);
    assert_eq!(
        outputs,
        vec![OutputRecord {
            id: "A1".to_string(),
            question: "Quando si festeggia Ferragosto?".to_string(),
            response: "15 agosto".to_string(),
            targets: vec!["15 agosto".to_string()],
            output_type: "data".to_string(),
            prompt: build_prompt("Quando si festeggia Ferragosto?", "data"),
        }]
    );

    let eval = std::fs::read_to_string(&summary.eval_path).expect("should read eval");
    assert_eq!(
        eval,
        "{\"language\":\"italian\",\"id\":\"A1\",\"prediction\":\"15 agosto\"}\n"
    );
}

#[tokio::test]
async fn test_eval_matches_output_one_to_one() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let input = [
        r#"{"id":"q1","question":"Quale moneta aveva l'Italia prima dell'euro?","targets":["Lira"],"output_type":"nome"}"#,
        r#"{"id":"q2","question":"Chi ha dipinto la Gioconda?","targets":["Leonardo da Vinci"],"output_type":"un nome"}"#,
        r#"{"id":"q1","question":"Quando è la Festa della Repubblica in Italia?","targets":["2 giugno"],"output_type":"una data"}"#,
        r#"{"id":"q3","question":"Dove si trova il Colosseo?","targets":["Roma"],"output_type":"un luogo","text":"ignored"}"#,
    ]
    .join("\n");
    let config = config_for(dir.path(), &input, PromptStyle::ZeroShot);
    let generator = Arc::new(ScriptedGenerator::new(&[
        ("Gioconda", "Leonardo\n\"da Vinci\""),
        ("Festa della Repubblica", "2 giugno"),
    ]));

    let summary = run_pipeline(&config, generator)
        .await
        .expect("pipeline should succeed");
    assert!(summary.eval_path.ends_with("dev_eval.jsonl"));

    let outputs: Vec<OutputRecord> = read_jsonl(&summary.output_path);
    let evals: Vec<EvalRecord> = read_jsonl(&summary.eval_path);

    // Duplicate id keeps first position, last value
    assert_eq!(
        outputs.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
        vec!["q1", "q2", "q3"]
    );
    assert_eq!(outputs[0].output_type, "una data");
    assert_eq!(outputs[0].response, "2 giugno");

    assert_eq!(outputs.len(), evals.len());
    for (output, eval) in outputs.iter().zip(&evals) {
        assert_eq!(eval.id, output.id);
        assert_eq!(eval.prediction, output.response);
        assert_eq!(eval.language, "italian");
    }
    assert_eq!(evals[1].prediction, "Leonardo\n\"da Vinci\"");
    assert_eq!(evals[2].prediction, "non lo so");
}

#[tokio::test]
async fn test_empty_input_produces_empty_files() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = config_for(dir.path(), "", PromptStyle::FiveShot);

    let summary = run_pipeline(&config, Arc::new(ScriptedGenerator::new(&[])))
        .await
        .expect("empty input is valid");

    assert_eq!(summary.records, 0);
    assert_eq!(std::fs::read_to_string(&summary.output_path).expect("exists"), "");
    assert_eq!(std::fs::read_to_string(&summary.eval_path).expect("exists"), "");
}

#[tokio::test]
async fn test_concurrent_run_matches_sequential_output() {
    let input: String = (0..6)
        .map(|i| {
            format!(
                "{{\"id\":\"r{i}\",\"question\":\"Domanda numero {i}?\",\"targets\":[\"{i}\"],\"output_type\":\"numero\"}}\n"
            )
        })
        .collect();
    let answers: Vec<(String, String)> = (0..6)
        .map(|i| (format!("Domanda numero {i}?"), format!("risposta {i}")))
        .collect();
    let answer_refs: Vec<(&str, &str)> = answers
        .iter()
        .map(|(q, a)| (q.as_str(), a.as_str()))
        .collect();

    let seq_dir = tempfile::tempdir().expect("should create temp dir");
    let seq_config = config_for(seq_dir.path(), &input, PromptStyle::FiveShot);
    let seq = run_pipeline(&seq_config, Arc::new(ScriptedGenerator::new(&answer_refs)))
        .await
        .expect("sequential run should succeed");

    let par_dir = tempfile::tempdir().expect("should create temp dir");
    let par_config = EvalConfig {
        concurrency: 4,
        ..config_for(par_dir.path(), &input, PromptStyle::FiveShot)
    };
    let par = run_pipeline(
        &par_config,
        Arc::new(ScriptedGenerator::new(&answer_refs).with_jitter()),
    )
    .await
    .expect("concurrent run should succeed");

    assert_eq!(
        std::fs::read_to_string(&seq.output_path).expect("exists"),
        std::fs::read_to_string(&par.output_path).expect("exists")
    );
    assert_eq!(
        std::fs::read_to_string(&seq.eval_path).expect("exists"),
        std::fs::read_to_string(&par.eval_path).expect("exists")
    );
}

#[tokio::test]
async fn test_generator_failure_aborts_run() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = config_for(dir.path(), &format!("{FERRAGOSTO}\n"), PromptStyle::FiveShot);

    let err = run_pipeline(&config, Arc::new(BrokenGenerator))
        .await
        .unwrap_err();

    match err {
        PipelineError::Record { id, source } => {
            assert_eq!(id, "A1");
            assert!(matches!(source, LlmError::ApiError { code: 503, .. }));
        }
        other => panic!("Expected record error, got {other:?}"),
    }
    assert!(!config.eval_path().exists());
}

#[tokio::test]
async fn test_malformed_input_aborts_before_generation() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = config_for(
        dir.path(),
        r#"{"id":"A1","question":"?","targets":["x"]}"#,
        PromptStyle::FiveShot,
    );
    let generator = Arc::new(ScriptedGenerator::new(&[]));

    let err = run_pipeline(&config, generator.clone()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Dataset(_)));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    assert!(!config.output_path().exists());
}

#[tokio::test]
async fn test_missing_input_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let config = EvalConfig {
        input_path: dir.path().join("missing.jsonl"),
        output_dir: dir.path().join("out"),
        ..EvalConfig::default()
    };
    let err = run_pipeline(&config, Arc::new(ScriptedGenerator::new(&[])))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Dataset(_)));
}

#[test]
fn test_loader_scenario_from_file() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let path = dir.path().join("dev.jsonl");
    std::fs::write(&path, format!("{FERRAGOSTO}\n")).expect("should write");

    let records = load_records(&path).expect("should load");
    assert_eq!(records.len(), 1);
    let a1 = records.get("A1").expect("A1 present");
    assert_eq!(a1.question, "Quando si festeggia Ferragosto?");
    assert_eq!(a1.targets, vec!["15 agosto".to_string()]);
    assert_eq!(a1.output_type, "data");
}
