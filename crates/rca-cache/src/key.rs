use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Everything that identifies one memoized call.
///
/// `args` is a `BTreeMap`, so serialization is sorted by name and the key
/// does not depend on the order callers supplied parameters in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyMaterial {
    pub function: String,
    pub args: BTreeMap<String, Value>,
}

impl KeyMaterial {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.args.insert(name.into(), value.into());
    }

    /// Canonical JSON used as hash input.
    pub fn canonical_json(&self) -> String {
        // BTreeMap<String, Value> with scalar values cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn key(&self) -> CacheKey {
        let digest = Sha256::digest(self.canonical_json().as_bytes());
        CacheKey(format!("{digest:x}"))
    }
}

/// Hex SHA-256 of a [`KeyMaterial`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-character shard prefix used for on-disk fan-out.
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
