use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use crate::key::{CacheKey, KeyMaterial};

/// One persisted response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub function: String,
    pub args: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
    pub response: Value,
}

impl CacheEntry {
    pub fn new(material: &KeyMaterial, response: Value) -> Self {
        Self {
            function: material.function.clone(),
            args: material.args.clone(),
            created_at: Utc::now(),
            response,
        }
    }
}

/// Storage backend for memoized responses.
///
/// Stores are append-only: there is no delete or expiry. A `put` for a key
/// that already exists replaces the value (last write wins).
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;
    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()>;
}

/// File-per-entry cache under a directory: `{dir}/{shard}/{key}.json`.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open (and create if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        debug!(dir = %dir.display(), "opened response cache");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir
            .join(key.shard())
            .join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read cache entry: {}", path.display()));
            }
        };
        let entry: CacheEntry = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache entry: {}", path.display()))?;
        Ok(Some(entry))
    }

    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(key);
        let data = serde_json::to_vec_pretty(entry).context("Failed to serialize cache entry")?;
        tokio::task::spawn_blocking(move || atomic_write(&path, &data))
            .await
            .context("Cache write task panicked")?
    }
}

/// Write data to a file atomically using temp-file + rename.
fn atomic_write(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target.parent().context("Target path has no parent")?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create cache shard: {}", parent.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;

    std::io::Write::write_all(&mut tmp, data).context("Failed to write temp file")?;

    tmp.persist(target)
        .with_context(|| format!("Failed to persist to {}", target.display()))?;

    Ok(())
}

/// In-process cache for `--no-cache` runs and tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.clone(), entry.clone());
        Ok(())
    }
}
