use anyhow::{Context, Result};
use async_trait::async_trait;
use rca_agents::{Agent, AgentRegistry};
use rca_core::{Mode, Units};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::document::Document;

/// What a recipe may use while it runs.
#[derive(Debug, Clone)]
pub struct RecipeContext {
    agents: AgentRegistry,
    /// Render agent questions and answers on the transcript target.
    pub verbose: bool,
}

impl RecipeContext {
    pub fn new(agents: AgentRegistry) -> Self {
        Self {
            agents,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// A fresh agent instance by registry name.
    pub fn agent(&self, name: &str) -> Result<Arc<dyn Agent>> {
        self.agents.agent(name)
    }
}

/// A named async procedure run once standalone or once per document.
#[async_trait]
pub trait Recipe: Send + Sync {
    fn name(&self) -> &'static str;

    fn mode(&self) -> Mode;

    async fn run(&self, ctx: &RecipeContext, document: Option<&Document>, args: &Value)
    -> Result<Value>;

    /// Rows written to `--json-out` for one document's result.
    fn to_json(&self, document_id: &str, result: &Value) -> Vec<Value> {
        vec![json!({ "document_id": document_id, "result": result })]
    }
}

/// `args[key]` as a string, if present.
pub fn arg_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// `args[key]` as a list of strings. Absent means `None`; present but not a
/// list of strings is an error.
pub fn arg_str_list(args: &Value, key: &str) -> Result<Option<Vec<String>>> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    let items = value
        .as_array()
        .with_context(|| format!("Argument '{key}' must be a list of strings"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .with_context(|| format!("Argument '{key}' must be a list of strings"))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

/// Optional `units` argument.
pub fn arg_units(args: &Value) -> Result<Option<Units>> {
    arg_str(args, "units")
        .map(|raw| raw.parse::<Units>().map_err(anyhow::Error::msg))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_helpers() {
        let args = json!({"question": "q", "questions": ["a", "b"], "units": "imperial"});
        assert_eq!(arg_str(&args, "question"), Some("q"));
        assert_eq!(arg_str(&args, "missing"), None);
        assert_eq!(
            arg_str_list(&args, "questions").unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(arg_units(&args).unwrap(), Some(Units::Imperial));
        assert_eq!(arg_units(&json!({})).unwrap(), None);
    }

    #[test]
    fn test_bad_args_are_errors() {
        assert!(arg_str_list(&json!({"questions": "a"}), "questions").is_err());
        assert!(arg_str_list(&json!({"questions": [1]}), "questions").is_err());
        let err = arg_units(&json!({"units": "furlongs"})).unwrap_err();
        assert!(err.to_string().contains("furlongs"));
    }
}
