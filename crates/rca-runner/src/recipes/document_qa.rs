use anyhow::{Context, Result};
use async_trait::async_trait;
use rca_agents::SHORT_ANSWER;
use rca_core::Mode;
use serde_json::{Value, json};

use crate::document::Document;
use crate::recipe::{Recipe, RecipeContext, arg_str, arg_units};

pub const NAME: &str = "document-qa";

/// Answers each question line of a document.
///
/// A question line is any line that ends with `?` once trimmed. Args:
/// `agent` (registry name, default `short-answer`), `units`.
#[derive(Debug, Clone, Copy)]
pub struct DocumentQa {
    mode: Mode,
}

impl DocumentQa {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn boxed(mode: Mode) -> Box<dyn Recipe> {
        Box::new(Self::new(mode))
    }
}

pub fn question_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.len() > 1 && line.ends_with('?'))
        .collect()
}

#[async_trait]
impl Recipe for DocumentQa {
    fn name(&self) -> &'static str {
        NAME
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    async fn run(
        &self,
        ctx: &RecipeContext,
        document: Option<&Document>,
        args: &Value,
    ) -> Result<Value> {
        let document = document.context("document-qa needs at least one --input file")?;
        let units = arg_units(args)?;
        let agent = ctx.agent(arg_str(args, "agent").unwrap_or(SHORT_ANSWER))?;

        let mut answers = Vec::new();
        for question in question_lines(&document.text) {
            let answer = agent
                .answer(question, units, ctx.verbose)
                .await
                .with_context(|| format!("Failed to answer '{question}' in {}", document.id))?;
            answers.push(json!({ "question": question, "answer": answer }));
        }
        Ok(Value::Array(answers))
    }

    fn to_json(&self, document_id: &str, result: &Value) -> Vec<Value> {
        result
            .as_array()
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|pair| {
                        json!({
                            "document_id": document_id,
                            "question": pair["question"],
                            "answer": pair["answer"],
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_lines() {
        let text = "Title\n  How tall is Everest?  \nnot a question\n?\nWhat is 2+2?";
        assert_eq!(
            question_lines(text),
            vec!["How tall is Everest?", "What is 2+2?"]
        );
    }

    #[test]
    fn test_to_json_one_row_per_question() {
        let result = json!([
            {"question": "a?", "answer": "1"},
            {"question": "b?", "answer": "2"}
        ]);
        let rows = DocumentQa::new(Mode::Machine).to_json("doc.txt", &result);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], json!({"document_id": "doc.txt", "question": "b?", "answer": "2"}));
    }
}
