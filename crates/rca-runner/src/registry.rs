use anyhow::{Result, bail};
use rca_core::Mode;

use crate::recipe::Recipe;
use crate::recipes;

pub type RecipeConstructor = fn(Mode) -> Box<dyn Recipe>;

#[derive(Debug, Clone, Copy)]
pub struct RecipeEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub build: RecipeConstructor,
}

/// Static name → constructor table.
#[derive(Debug, Clone, Default)]
pub struct RecipeRegistry {
    entries: Vec<RecipeEntry>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in recipes.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for entry in recipes::BUILTIN {
            registry.register(*entry);
        }
        registry
    }

    /// Add an entry. A later entry with the same name replaces the earlier one.
    pub fn register(&mut self, entry: RecipeEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[RecipeEntry] {
        &self.entries
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }

    /// Exact name first, then the first entry whose name starts with `name`
    /// ignoring case.
    pub fn find(&self, name: &str) -> Result<&RecipeEntry> {
        if name.trim().is_empty() {
            bail!("Recipe name is empty. Available: {}", self.names().join(", "));
        }
        if let Some(entry) = self.entries.iter().find(|e| e.name == name) {
            return Ok(entry);
        }
        let wanted = name.to_lowercase();
        match self
            .entries
            .iter()
            .find(|e| e.name.to_lowercase().starts_with(&wanted))
        {
            Some(entry) => Ok(entry),
            None => bail!(
                "Recipe '{}' not found. Available: {}",
                name,
                self.names().join(", ")
            ),
        }
    }

    pub fn build(&self, name: &str, mode: Mode) -> Result<Box<dyn Recipe>> {
        let entry = self.find(name)?;
        Ok((entry.build)(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::RecipeContext;
    use crate::document::Document;
    use async_trait::async_trait;
    use serde_json::Value;

    struct Named(&'static str, Mode);

    #[async_trait]
    impl Recipe for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn mode(&self) -> Mode {
            self.1
        }

        async fn run(
            &self,
            _ctx: &RecipeContext,
            _document: Option<&Document>,
            _args: &Value,
        ) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    fn alpha(mode: Mode) -> Box<dyn Recipe> {
        Box::new(Named("alpha-summary", mode))
    }

    fn alpha_two(mode: Mode) -> Box<dyn Recipe> {
        Box::new(Named("alpha", mode))
    }

    fn registry() -> RecipeRegistry {
        let mut registry = RecipeRegistry::new();
        registry.register(RecipeEntry {
            name: "alpha-summary",
            description: "",
            build: alpha,
        });
        registry.register(RecipeEntry {
            name: "alpha",
            description: "",
            build: alpha_two,
        });
        registry
    }

    #[test]
    fn test_exact_match_beats_prefix() {
        assert_eq!(registry().find("alpha").unwrap().name, "alpha");
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        assert_eq!(registry().find("ALPHA-S").unwrap().name, "alpha-summary");
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let err = registry().find("beta").unwrap_err().to_string();
        assert!(err.contains("beta"));
        assert!(err.contains("alpha-summary, alpha"));
        assert!(registry().find("  ").is_err());
    }

    #[test]
    fn test_build_passes_mode() {
        let recipe = registry().build("alpha", Mode::Human).unwrap();
        assert_eq!(recipe.mode(), Mode::Human);
    }

    #[test]
    fn test_builtin_names() {
        let registry = RecipeRegistry::builtin();
        assert_eq!(
            registry.names(),
            vec!["short-answer-qa", "conversational-qa", "document-qa"]
        );
        assert_eq!(registry.find("conv").unwrap().name, "conversational-qa");
    }
}
