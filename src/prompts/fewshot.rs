//! Few-shot prompt rendering for the Italian QA benchmark.
//!
//! The five-shot prompt is five worked examples followed by the target
//! question with an empty answer slot:
//!
//! ```text
//! Rispondi alla seguente domanda in modo chiaro e conciso.
//! D: Quando si festeggia Ferragosto? Produci solo risposte del seguente tipo: data.
//! R: 15 agosto
//!
//! ... four more examples ...
//!
//! D: <question> Produci solo risposte del seguente tipo: <output_type>.
//! R:
//! ```
//!
//! Question and output type are inserted verbatim.

/// A worked question/answer pair shown to the model before the real question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FewShotExample {
    pub question: &'static str,
    pub answer: &'static str,
    pub output_type: &'static str,
}

/// The fixed demonstrations prepended to every five-shot prompt.
pub const FEWSHOT_EXAMPLES: [FewShotExample; 5] = [
    FewShotExample {
        question: "Quando si festeggia Ferragosto?",
        answer: "15 agosto",
        output_type: "data",
    },
    FewShotExample {
        question: "Quando ha vinto l'Italia per l'ultima volta i mondiali di calcio?",
        answer: "2006",
        output_type: "data",
    },
    FewShotExample {
        question: "Quale moneta aveva l'Italia prima dell'euro?",
        answer: "Lira",
        output_type: "nome",
    },
    FewShotExample {
        question: "Come si chiama il primo Presidente della Repubblica italiana?",
        answer: "Enrico De Nicola",
        output_type: "nome",
    },
    FewShotExample {
        question: "Quando è la Festa della Repubblica in Italia?",
        answer: "2 giugno",
        output_type: "data",
    },
];

/// Instruction line opening every worked example.
pub const INSTRUCTION: &str = "Rispondi alla seguente domanda in modo chiaro e conciso.";

/// Separator between prompt blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Render the `D:` line for a question.
fn question_line(question: &str, output_type: &str) -> String {
    format!("D: {question} Produci solo risposte del seguente tipo: {output_type}.")
}

/// Render one worked example block.
pub fn render_example(example: &FewShotExample) -> String {
    format!(
        "{INSTRUCTION}\n{}\nR: {}",
        question_line(example.question, example.output_type),
        example.answer
    )
}

/// Render the final block the model is asked to complete.
pub fn render_target(question: &str, output_type: &str) -> String {
    format!("{}\nR:", question_line(question, output_type))
}

/// Build the full five-shot prompt for one question.
pub fn build_prompt(question: &str, output_type: &str) -> String {
    let mut blocks: Vec<String> = FEWSHOT_EXAMPLES.iter().map(render_example).collect();
    blocks.push(render_target(question, output_type));
    blocks.join(BLOCK_SEPARATOR)
}

/// Build the single-instruction prompt used for zero-shot runs.
pub fn build_zero_shot_prompt(question: &str, output_type: &str) -> String {
    format!(
        "Rispondi alla seguente domanda in modo chiaro e conciso: {question} Produci solo risposte del seguente tipo: {output_type}."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTION: &str = "Quando si festeggia Ferragosto?";

    #[test]
    fn test_target_block() {
        assert_eq!(
            render_target(QUESTION, "data"),
            "D: Quando si festeggia Ferragosto? Produci solo risposte del seguente tipo: data.\nR:"
        );
    }

    #[test]
    fn test_first_example_block() {
        assert_eq!(
            render_example(&FEWSHOT_EXAMPLES[0]),
            "Rispondi alla seguente domanda in modo chiaro e conciso.\n\
             D: Quando si festeggia Ferragosto? Produci solo risposte del seguente tipo: data.\n\
             R: 15 agosto"
        );
    }

    #[test]
    fn test_prompt_has_six_blocks() {
        let prompt = build_prompt("Chi ha scritto la Divina Commedia?", "nome");
        let blocks: Vec<&str> = prompt.split(BLOCK_SEPARATOR).collect();
        assert_eq!(blocks.len(), 6);

        for (block, example) in blocks.iter().zip(FEWSHOT_EXAMPLES.iter()) {
            let last = block.lines().last().expect("block should not be empty");
            assert_eq!(last, format!("R: {}", example.answer));
            assert!(!example.answer.is_empty());
        }

        let target = blocks[5];
        assert!(target.ends_with("\nR:"));
        assert_eq!(target.lines().last(), Some("R:"));
        assert!(!prompt.ends_with(' '));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_prompt(QUESTION, "data");
        let b = build_prompt(QUESTION, "data");
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_ends_with_target_block() {
        let prompt = build_prompt(QUESTION, "data");
        assert!(prompt.ends_with(&format!("\n\n{}", render_target(QUESTION, "data"))));
        assert!(prompt.starts_with(INSTRUCTION));
    }

    #[test]
    fn test_fields_are_inserted_verbatim() {
        let prompt = build_prompt("Perché?\n\nR: boh", "un \"nome\"");
        assert!(prompt.contains("D: Perché?\n\nR: boh Produci solo risposte del seguente tipo: un \"nome\".\nR:"));
    }

    #[test]
    fn test_zero_shot_prompt() {
        assert_eq!(
            build_zero_shot_prompt(QUESTION, "data"),
            "Rispondi alla seguente domanda in modo chiaro e conciso: Quando si festeggia Ferragosto? Produci solo risposte del seguente tipo: data."
        );
    }
}
