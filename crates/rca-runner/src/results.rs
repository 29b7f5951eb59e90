//! Printing and persisting a [`ResultSet`].

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;
use std::path::Path;

use crate::executor::ResultSet;
use crate::recipe::Recipe;

pub struct ResultsWriter<'a> {
    recipe: &'a dyn Recipe,
    results: &'a ResultSet,
}

impl<'a> ResultsWriter<'a> {
    pub fn new(recipe: &'a dyn Recipe, results: &'a ResultSet) -> Self {
        Self { recipe, results }
    }

    /// One `## Final result for <id>` section per document.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (document_id, result) in self.results.entries() {
            out.push_str(&format!("## Final result for {document_id}\n\n"));
            out.push_str(&render_value(result));
            out.push_str("\n\n");
        }
        for (document_id, error) in self.results.failures() {
            out.push_str(&format!("## Failed: {document_id}\n\n{error}\n\n"));
        }
        out
    }

    /// Print to stdout, or append to `output_file` when given.
    pub fn print(&self, output_file: Option<&Path>) -> Result<()> {
        let rendered = self.render();
        match output_file {
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(rendered.as_bytes())
                    .context("Failed to write results to stdout")?;
                stdout.flush().context("Failed to flush stdout")?;
            }
            Some(path) => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("Failed to open output file: {}", path.display()))?;
                file.write_all(rendered.as_bytes())
                    .with_context(|| format!("Failed to append to {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Flattened `to_json` rows of every entry.
    pub fn json_rows(&self) -> Vec<Value> {
        self.results
            .entries()
            .iter()
            .flat_map(|(document_id, result)| self.recipe.to_json(document_id, result))
            .collect()
    }

    /// Write [`Self::json_rows`] as a pretty JSON array, replacing `path`
    /// atomically.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_vec_pretty(&Value::Array(self.json_rows()))
            .context("Failed to serialize results")?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
        tmp.write_all(&data).context("Failed to write temp file")?;
        tmp.persist(path)
            .with_context(|| format!("Failed to persist to {}", path.display()))?;
        Ok(())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::ConversationalQa;
    use rca_core::Mode;
    use serde_json::json;

    fn results() -> ResultSet {
        let mut set = ResultSet::default();
        set.push_entry("a.txt", json!([{"question": "q1?", "answer": "x"}]));
        set.push_entry("b.txt", json!([{"question": "q2?", "answer": "y"}]));
        set
    }

    #[test]
    fn test_render_sections_in_order() {
        let recipe = ConversationalQa::new(Mode::Machine);
        let results = results();
        let rendered = ResultsWriter::new(&recipe, &results).render();
        let a = rendered.find("## Final result for a.txt").unwrap();
        let b = rendered.find("## Final result for b.txt").unwrap();
        assert!(a < b);
        assert!(rendered.contains("\"answer\": \"x\""));
    }

    #[test]
    fn test_string_results_render_verbatim() {
        let recipe = ConversationalQa::new(Mode::Machine);
        let mut results = ResultSet::default();
        results.push_entry("No document", json!("2,462 miles"));
        let rendered = ResultsWriter::new(&recipe, &results).render();
        assert_eq!(rendered, "## Final result for No document\n\n2,462 miles\n\n");
    }

    #[test]
    fn test_print_appends_to_file() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("results.md");
        let recipe = ConversationalQa::new(Mode::Machine);
        let results = results();
        let writer = ResultsWriter::new(&recipe, &results);

        writer.print(Some(&out)).unwrap();
        writer.print(Some(&out)).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content.matches("## Final result for a.txt").count(), 2);
    }

    #[test]
    fn test_write_json_flattens_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("results.json");
        let recipe = ConversationalQa::new(Mode::Machine);
        let results = results();

        ResultsWriter::new(&recipe, &results).write_json(&out).unwrap();

        let rows: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(
            rows,
            vec![
                json!({"document_id": "a.txt", "question": "q1?", "answer": "x"}),
                json!({"document_id": "b.txt", "question": "q2?", "answer": "y"}),
            ]
        );
    }
}
