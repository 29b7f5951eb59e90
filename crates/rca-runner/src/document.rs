use anyhow::{Context, Result};
use std::path::Path;

/// A text input a recipe runs over. `id` is the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("Input path has no file name: {}", path.display()))?;
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        Ok(Self { id, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_uses_file_name_as_id() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("paper-1.txt");
        std::fs::write(&path, "Is this a question?\n").unwrap();

        let doc = Document::load(&path).await.unwrap();
        assert_eq!(doc.id, "paper-1.txt");
        assert_eq!(doc.text, "Is this a question?\n");
    }

    #[tokio::test]
    async fn test_load_missing_file_names_path() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Document::load(&tmp.path().join("absent.txt"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("absent.txt"));
    }
}
