//! In-memory document store.
//!
//! Backs offline runs (`--seed`) and the test suites. Index names and
//! document ids are kept sorted, so search order is deterministic.

use super::{matches_pattern, DocumentStore, StoreResult};
use crate::error::StoreError;
use crate::models::{Document, Fields};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

type Indices = BTreeMap<String, BTreeMap<String, Fields>>;

/// Document store held entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    indices: RwLock<Indices>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a seed file shaped `{ index: { id: { fields } } }`.
    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read seed file: {}", path.display()))?;

        let indices: Indices = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse seed file: {}", path.display()))?;

        debug!(
            "Seeded memory store with {} indices from {}",
            indices.len(),
            path.display()
        );

        Ok(Self {
            indices: RwLock::new(indices),
        })
    }

    /// Insert (or replace) a document, creating the index if needed.
    pub fn insert(&self, index: &str, id: &str, fields: Fields) {
        self.write()
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Builder-style [`MemoryStore::insert`].
    pub fn with_document(self, index: &str, id: &str, fields: Fields) -> Self {
        self.insert(index, id, fields);
        self
    }

    /// Create an empty index.
    pub fn with_index(self, index: &str) -> Self {
        self.write().entry(index.to_string()).or_default();
        self
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Indices> {
        // Writers never leave the map half-updated
        self.indices.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Indices> {
        self.indices.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_indices(&self, pattern: &str) -> StoreResult<BTreeSet<String>> {
        Ok(self
            .read()
            .keys()
            .filter(|name| matches_pattern(pattern, name))
            .cloned()
            .collect())
    }

    async fn count(&self, index: &str) -> StoreResult<u64> {
        self.read()
            .get(index)
            .map(|docs| docs.len() as u64)
            .ok_or_else(|| StoreError::IndexNotFound(index.to_string()))
    }

    async fn search(&self, index: &str, limit: u64) -> StoreResult<Vec<Document>> {
        let indices = self.read();
        let docs = indices
            .get(index)
            .ok_or_else(|| StoreError::IndexNotFound(index.to_string()))?;

        Ok(docs
            .iter()
            .take(limit as usize)
            .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
            .collect())
    }

    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Fields> {
        self.read()
            .get(index)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(index, id))
    }

    async fn update_document(&self, index: &str, id: &str, fields: Fields) -> StoreResult<()> {
        let mut indices = self.write();
        let doc = indices
            .get_mut(index)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(index, id))?;

        for (key, value) in fields {
            doc.insert(key, value);
        }
        Ok(())
    }

    async fn index_document(&self, index: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.insert(index, id, fields);
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> StoreResult<()> {
        self.write()
            .get_mut(index)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(index, id))
    }
}
