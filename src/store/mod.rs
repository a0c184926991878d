//! Document store access.
//!
//! Services talk to the store only through [`DocumentStore`]. Two backends
//! exist: the Elasticsearch REST client used in production and an in-memory
//! store used for offline runs and tests.

pub mod elasticsearch;
pub mod memory;
#[cfg(test)]
pub mod failing;

pub use elasticsearch::{ElasticsearchConfig, ElasticsearchStore};
pub use memory::MemoryStore;

use crate::error::StoreError;
use crate::models::{Document, Fields};
use async_trait::async_trait;
use std::collections::BTreeSet;

pub type StoreResult<T> = Result<T, StoreError>;

/// Capabilities required from the backing document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Names of open indices matching a wildcard pattern (`*` matches any run).
    async fn list_indices(&self, pattern: &str) -> StoreResult<BTreeSet<String>>;

    /// Number of documents in an index.
    async fn count(&self, index: &str) -> StoreResult<u64>;

    /// Up to `limit` documents from an index, in store order.
    async fn search(&self, index: &str, limit: u64) -> StoreResult<Vec<Document>>;

    /// Fields of a single document. Fails with `NotFound` when absent.
    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Fields>;

    /// Overwrite only the given fields of an existing document.
    async fn update_document(&self, index: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Create or replace a whole document.
    async fn index_document(&self, index: &str, id: &str, fields: Fields) -> StoreResult<()>;

    /// Delete a document. Fails with `NotFound` when absent.
    async fn delete_document(&self, index: &str, id: &str) -> StoreResult<()>;
}

/// Match `name` against a pattern where `*` stands for any (possibly empty) run.
pub fn matches_pattern(pattern: &str, name: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == name;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !name.starts_with(first) || name.len() < first.len() + last.len() {
        return false;
    }
    if !name[first.len()..].ends_with(last) {
        return false;
    }

    // Middle segments must appear in order between the anchored ends
    let mut rest = &name[first.len()..name.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }

    true
}
