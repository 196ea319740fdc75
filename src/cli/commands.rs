//! CLI command definitions for multiloko-eval.
//!
//! `run` performs the whole evaluation; `generate` and `project` run one
//! stage each so a long generation can be re-projected without calling the
//! model again. `prompt` prints the prompt a question would be sent with.

use clap::{Args, Parser};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::dataset::load_records;
use crate::llm::{Backend, ChatBackend, CompletionBackend, OpenAiClient, TextGenerator};
use crate::pipeline::{
    prepare_output_dir, project_eval, run_pipeline, EvalConfig, PipelineSummary,
    ResponseGenerator,
};
use crate::prompts::PromptStyle;

/// Few-shot evaluation harness for the multiloko Italian QA benchmark.
#[derive(Parser)]
#[command(name = "multiloko-eval")]
#[command(about = "Evaluate LLMs on the multiloko Italian question-answering benchmark")]
#[command(version)]
#[command(
    long_about = "multiloko-eval sends every benchmark question to an OpenAI-compatible inference server (vLLM, LiteLLM, OpenRouter), stores the answers, and writes an eval file for the scorer.\n\nExample usage:\n  multiloko-eval run --model meta-llama/Meta-Llama-3-8B-Instruct --input multiloko_eval/dev.jsonl"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate responses for every record, then write the eval file.
    Run(EvalArgs),

    /// Generate responses only.
    #[command(alias = "gen")]
    Generate(EvalArgs),

    /// Turn an existing response file into an eval file.
    Project(ProjectArgs),

    /// Print the prompt for a single question.
    Prompt(PromptArgs),
}

/// Run settings shared by `run` and `generate`. Every flag overrides the
/// config file and environment.
#[derive(Args, Debug, Default)]
pub struct EvalArgs {
    /// YAML configuration file.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Model identifier served by the inference server.
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Benchmark JSONL file.
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// Root directory for results.
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Prompt style.
    #[arg(long, value_enum)]
    pub style: Option<PromptStyle>,

    /// Server endpoint to use.
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,

    /// Base URL of the OpenAI-compatible server.
    #[arg(long)]
    pub api_base: Option<String>,

    /// API key for the server.
    #[arg(long, env = "LITELLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Maximum tokens generated per answer.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Nucleus sampling parameter.
    #[arg(long)]
    pub top_p: Option<f64>,

    /// Generation calls in flight; output order is unaffected.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Print the run summary as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `multiloko-eval project`.
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Response file to read.
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Eval file to write.
    #[arg(short = 'o', long)]
    pub output: PathBuf,
}

/// Arguments for `multiloko-eval prompt`.
#[derive(Args, Debug)]
pub struct PromptArgs {
    /// Question text.
    #[arg(short = 'q', long)]
    pub question: String,

    /// Expected answer kind (e.g. "una data").
    #[arg(short = 't', long)]
    pub output_type: String,

    /// Prompt style.
    #[arg(long, value_enum, default_value_t = PromptStyle::FiveShot)]
    pub style: PromptStyle,
}

/// Parse CLI arguments from the process.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the selected command with already-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_eval_command(args).await,
        Commands::Generate(args) => run_generate_command(args).await,
        Commands::Project(args) => run_project_command(args),
        Commands::Prompt(args) => {
            println!("{}", args.style.build(&args.question, &args.output_type));
            Ok(())
        }
    }
}

async fn run_eval_command(args: EvalArgs) -> anyhow::Result<()> {
    let json = args.json;
    let config = resolve_config(&args)?;
    let generator = build_generator(&config)?;

    let summary = run_pipeline(&config, generator).await?;
    print_summary(&summary, json)
}

async fn run_generate_command(args: EvalArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let generator = build_generator(&config)?;

    let records = load_records(&config.input_path)?;
    prepare_output_dir(&config)?;
    let output_path = config.output_path();

    let written = ResponseGenerator::new(generator, config.prompt_style)
        .with_concurrency(config.concurrency)
        .generate_to_file(&records, &output_path)
        .await?;

    if args.json {
        let summary = serde_json::json!({
            "model": config.model,
            "records": written,
            "output_path": output_path,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Responses saved to {}", output_path.display());
    }
    Ok(())
}

fn run_project_command(args: ProjectArgs) -> anyhow::Result<()> {
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let count = project_eval(&args.input, &args.output)?;
    info!(records = count, "Projection complete");
    println!("Evaluation data saved to {}", args.output.display());
    Ok(())
}

fn print_summary(summary: &PipelineSummary, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("Responses saved to {}", summary.output_path.display());
        println!("Evaluation data saved to {}", summary.eval_path.display());
    }
    Ok(())
}

/// Build the run configuration: defaults, then the config file, then the
/// environment, then CLI flags.
pub fn resolve_config(args: &EvalArgs) -> anyhow::Result<EvalConfig> {
    resolve_config_with(args, |key| std::env::var(key).ok())
}

/// Same as [`resolve_config`] with an explicit environment lookup.
pub fn resolve_config_with<F>(args: &EvalArgs, lookup: F) -> anyhow::Result<EvalConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &args.config {
        Some(path) => EvalConfig::from_yaml_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to load config file {}: {}", path.display(), e)
        })?,
        None => EvalConfig::default(),
    };
    config.apply_env_with(lookup)?;
    apply_cli_overrides(&mut config, args);
    config.validate()?;
    Ok(config)
}

fn apply_cli_overrides(config: &mut EvalConfig, args: &EvalArgs) {
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(input) = &args.input {
        config.input_path = input.clone();
    }
    if let Some(output_dir) = &args.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(style) = args.style {
        config.prompt_style = style;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(api_base) = &args.api_base {
        config.api_base = api_base.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(max_tokens) = args.max_tokens {
        config.max_tokens = max_tokens;
    }
    if let Some(temperature) = args.temperature {
        config.temperature = Some(temperature);
    }
    if let Some(top_p) = args.top_p {
        config.top_p = Some(top_p);
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.request_timeout_secs = Some(timeout_secs);
    }
}

/// Build the text generator selected by `config.backend`.
pub fn build_generator(config: &EvalConfig) -> anyhow::Result<Arc<dyn TextGenerator>> {
    let client = Arc::new(OpenAiClient::new(
        config.api_base.clone(),
        config.api_key.clone(),
        config.model.clone(),
        config.request_timeout(),
    )?);

    info!(
        api_base = %client.api_base(),
        model = %config.model,
        backend = %config.backend,
        "Using OpenAI-compatible server"
    );

    let generator: Arc<dyn TextGenerator> = match config.backend {
        Backend::Chat => Arc::new(ChatBackend::new(
            client,
            config.model.clone(),
            config.sampling(),
        )),
        Backend::Completion => Arc::new(CompletionBackend::new(
            client,
            config.model.clone(),
            config.sampling(),
        )),
    };
    Ok(generator)
}
