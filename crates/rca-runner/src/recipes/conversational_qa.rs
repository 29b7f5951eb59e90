use anyhow::Result;
use async_trait::async_trait;
use rca_agents::CONVERSATIONAL;
use rca_core::Mode;
use serde_json::{Value, json};

use crate::document::Document;
use crate::recipe::{Recipe, RecipeContext, arg_str_list, arg_units};

pub const NAME: &str = "conversational-qa";
const DEFAULT_QUESTIONS: [&str; 2] = [
    "What is the size of New York City?",
    "What is its population density?",
];

/// Follow-up questions asked in order within one conversation.
///
/// Args: `questions` (list of strings), `units`. Result is a list of
/// `{"question", "answer"}` objects in asking order.
#[derive(Debug, Clone, Copy)]
pub struct ConversationalQa {
    mode: Mode,
}

impl ConversationalQa {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn boxed(mode: Mode) -> Box<dyn Recipe> {
        Box::new(Self::new(mode))
    }
}

#[async_trait]
impl Recipe for ConversationalQa {
    fn name(&self) -> &'static str {
        NAME
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    async fn run(
        &self,
        ctx: &RecipeContext,
        _document: Option<&Document>,
        args: &Value,
    ) -> Result<Value> {
        let questions = arg_str_list(args, "questions")?
            .unwrap_or_else(|| DEFAULT_QUESTIONS.iter().map(|q| q.to_string()).collect());
        let units = arg_units(args)?;

        // One agent for the whole run so follow-ups share the conversation.
        let agent = ctx.agent(CONVERSATIONAL)?;
        let mut answers = Vec::with_capacity(questions.len());
        for question in questions {
            let answer = agent.answer(&question, units, ctx.verbose).await?;
            answers.push(json!({ "question": question, "answer": answer }));
        }
        Ok(Value::Array(answers))
    }

    fn to_json(&self, document_id: &str, result: &Value) -> Vec<Value> {
        match result.as_array() {
            Some(pairs) => pairs
                .iter()
                .map(|pair| {
                    json!({
                        "document_id": document_id,
                        "question": pair["question"],
                        "answer": pair["answer"],
                    })
                })
                .collect(),
            None => vec![json!({ "document_id": document_id, "result": result })],
        }
    }
}
