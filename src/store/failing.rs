//! Store wrapper that fails one operation, for error-path tests.

use super::{DocumentStore, MemoryStore, StoreResult};
use crate::error::StoreError;
use crate::models::{Document, Fields};
use async_trait::async_trait;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    ListIndices,
    Count,
    Search,
    GetDocument,
    UpdateDocument,
}

/// Delegates to a `MemoryStore` except for the operation named by `fail_on`,
/// which returns `make_error()`.
pub struct FailingStore {
    inner: MemoryStore,
    fail_on: FailOn,
    make_error: fn() -> StoreError,
}

impl FailingStore {
    pub fn new(inner: MemoryStore, fail_on: FailOn, make_error: fn() -> StoreError) -> Self {
        Self {
            inner,
            fail_on,
            make_error,
        }
    }

    fn check(&self, op: FailOn) -> StoreResult<()> {
        if self.fail_on == op {
            Err((self.make_error)())
        } else {
            Ok(())
        }
    }
}

pub fn shard_failure() -> StoreError {
    StoreError::Api {
        status: 500,
        body: "shard failure".to_string(),
    }
}

pub fn unreachable() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn list_indices(&self, pattern: &str) -> StoreResult<BTreeSet<String>> {
        self.check(FailOn::ListIndices)?;
        self.inner.list_indices(pattern).await
    }

    async fn count(&self, index: &str) -> StoreResult<u64> {
        self.check(FailOn::Count)?;
        self.inner.count(index).await
    }

    async fn search(&self, index: &str, limit: u64) -> StoreResult<Vec<Document>> {
        self.check(FailOn::Search)?;
        self.inner.search(index, limit).await
    }

    async fn get_document(&self, index: &str, id: &str) -> StoreResult<Fields> {
        self.check(FailOn::GetDocument)?;
        self.inner.get_document(index, id).await
    }

    async fn update_document(&self, index: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.check(FailOn::UpdateDocument)?;
        self.inner.update_document(index, id, fields).await
    }

    async fn index_document(&self, index: &str, id: &str, fields: Fields) -> StoreResult<()> {
        self.inner.index_document(index, id, fields).await
    }

    async fn delete_document(&self, index: &str, id: &str) -> StoreResult<()> {
        self.inner.delete_document(index, id).await
    }
}
