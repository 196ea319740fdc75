//! Prompt construction for benchmark questions.
//!
//! Two prompt styles are supported:
//!
//! - [`PromptStyle::FiveShot`] - five fixed Italian worked examples followed
//!   by the target question (see [`fewshot`])
//! - [`PromptStyle::ZeroShot`] - a single instruction sentence wrapping the
//!   target question
//!
//! ```
//! use multiloko_eval::prompts::PromptStyle;
//!
//! let prompt = PromptStyle::FiveShot.build("Quando si festeggia Ferragosto?", "data");
//! assert!(prompt.ends_with("Produci solo risposte del seguente tipo: data.\nR:"));
//! ```

pub mod fewshot;

pub use fewshot::{
    build_prompt, build_zero_shot_prompt, render_example, render_target, FewShotExample,
    FEWSHOT_EXAMPLES,
};

use serde::{Deserialize, Serialize};

/// How the question is rendered into a prompt.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PromptStyle {
    /// Five worked examples, then the question with an empty answer slot.
    #[default]
    FiveShot,
    /// Instruction and question only.
    ZeroShot,
}

impl PromptStyle {
    /// Render the prompt for one question.
    pub fn build(self, question: &str, output_type: &str) -> String {
        match self {
            PromptStyle::FiveShot => build_prompt(question, output_type),
            PromptStyle::ZeroShot => build_zero_shot_prompt(question, output_type),
        }
    }

    /// File name of the response file written for this style.
    pub fn output_file_name(self) -> &'static str {
        match self {
            PromptStyle::FiveShot => "dev_5shot.jsonl",
            PromptStyle::ZeroShot => "dev.jsonl",
        }
    }

    /// File name of the eval file written for this style.
    pub fn eval_file_name(self) -> &'static str {
        match self {
            PromptStyle::FiveShot => "evaluate_5shot.jsonl",
            PromptStyle::ZeroShot => "dev_eval.jsonl",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PromptStyle::FiveShot => "five-shot",
            PromptStyle::ZeroShot => "zero-shot",
        }
    }
}

impl std::fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
