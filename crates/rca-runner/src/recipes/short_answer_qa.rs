use anyhow::Result;
use async_trait::async_trait;
use rca_agents::SHORT_ANSWER;
use rca_core::Mode;
use serde_json::Value;

use crate::document::Document;
use crate::recipe::{Recipe, RecipeContext, arg_str, arg_units};

pub const NAME: &str = "short-answer-qa";
const DEFAULT_QUESTION: &str = "How far is Los Angeles from New York?";

/// One question, one short answer.
///
/// Args: `question` (string), `units` (`metric` | `imperial`).
#[derive(Debug, Clone, Copy)]
pub struct ShortAnswerQa {
    mode: Mode,
}

impl ShortAnswerQa {
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    pub fn boxed(mode: Mode) -> Box<dyn Recipe> {
        Box::new(Self::new(mode))
    }
}

#[async_trait]
impl Recipe for ShortAnswerQa {
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
        let question = arg_str(args, "question").unwrap_or(DEFAULT_QUESTION);
        let units = arg_units(args)?;
        let agent = ctx.agent(SHORT_ANSWER)?;
        let answer = agent.answer(question, units, ctx.verbose).await?;
        Ok(Value::String(answer))
    }
}
