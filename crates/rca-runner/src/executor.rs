//! Runs a recipe standalone or over a batch of documents.

use anyhow::{Context, Result};
use rca_core::Mode;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};

use crate::document::Document;
use crate::map::{map_async, map_async_settled};
use crate::recipe::{Recipe, RecipeContext};

/// Result key for a run without input documents.
pub const STANDALONE_KEY: &str = "No document";

/// Results keyed by document id, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entries: Vec<(String, Value)>,
    failures: Vec<(String, String)>,
}

impl ResultSet {
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }

    /// Documents that failed in a `keep_going` run, with the error text.
    pub fn failures(&self) -> &[(String, String)] {
        &self.failures
    }

    pub fn push_entry(&mut self, document_id: impl Into<String>, value: Value) {
        self.entries.push((document_id.into(), value));
    }

    pub fn push_failure(&mut self, document_id: impl Into<String>, error: impl Into<String>) {
        self.failures.push((document_id.into(), error.into()));
    }

    pub fn get(&self, document_id: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(id, _)| id == document_id)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct RecipeExecutor {
    recipe: Arc<dyn Recipe>,
    ctx: Arc<RecipeContext>,
    inputs: Vec<PathBuf>,
    machine_concurrency: usize,
    keep_going: bool,
}

impl RecipeExecutor {
    pub fn new(recipe: Arc<dyn Recipe>, ctx: RecipeContext) -> Self {
        Self {
            recipe,
            ctx: Arc::new(ctx),
            inputs: Vec::new(),
            machine_concurrency: 5,
            keep_going: false,
        }
    }

    pub fn with_inputs(mut self, inputs: Vec<PathBuf>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_machine_concurrency(mut self, limit: usize) -> Self {
        self.machine_concurrency = limit;
        self
    }

    /// Keep running after a document fails; failures are reported instead.
    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Human recipes may prompt the operator, so they never run in parallel.
    pub fn concurrency(&self) -> usize {
        match self.recipe.mode() {
            Mode::Machine => self.machine_concurrency.max(1),
            Mode::Human => 1,
        }
    }

    pub async fn load_documents(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::with_capacity(self.inputs.len());
        for path in &self.inputs {
            documents.push(Document::load(path).await?);
        }
        Ok(documents)
    }

    pub async fn run(&self, args: &Value) -> Result<ResultSet> {
        let documents = self.load_documents().await?;
        if documents.is_empty() {
            return self.run_standalone(args).await;
        }
        self.run_batch(documents, args).await
    }

    async fn run_standalone(&self, args: &Value) -> Result<ResultSet> {
        let span = info_span!("recipe", document_id = STANDALONE_KEY, task = self.recipe.name());
        let value = self
            .recipe
            .run(&self.ctx, None, args)
            .instrument(span)
            .await
            .with_context(|| format!("Recipe '{}' failed", self.recipe.name()))?;
        let mut results = ResultSet::default();
        results.push_entry(STANDALONE_KEY, value);
        Ok(results)
    }

    async fn run_batch(&self, documents: Vec<Document>, args: &Value) -> Result<ResultSet> {
        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
        let limit = self.concurrency();
        info!(
            recipe = self.recipe.name(),
            limit,
            "Running recipe {} over documents {}",
            self.recipe.name(),
            ids.join(", ")
        );

        let apply = |document: Document| {
            let recipe = Arc::clone(&self.recipe);
            let ctx = Arc::clone(&self.ctx);
            let span = info_span!("recipe", document_id = %document.id, task = recipe.name());
            async move {
                recipe
                    .run(&ctx, Some(&document), args)
                    .await
                    .with_context(|| {
                        format!("Recipe '{}' failed on {}", recipe.name(), document.id)
                    })
            }
            .instrument(span)
        };

        if !self.keep_going {
            let values = map_async(documents, limit, apply).await?;
            return Ok(ResultSet {
                entries: ids.into_iter().zip(values).collect(),
                failures: Vec::new(),
            });
        }

        let mut results = ResultSet::default();
        for (id, outcome) in ids.into_iter().zip(map_async_settled(documents, limit, apply).await) {
            match outcome {
                Ok(value) => results.push_entry(id, value),
                Err(e) => {
                    warn!(document_id = %id, "{e:#}");
                    results.push_failure(id, format!("{e:#}"));
                }
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
