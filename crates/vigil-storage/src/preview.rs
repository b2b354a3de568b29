//! Registry of live preview handles

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use vigil_core::PreviewHandle;

use crate::traits::{FileSource, SourceError, SourceResult};

/// Registry for allocating, resolving and revoking preview handles.
///
/// Thread-safe and async-compatible using tokio's RwLock. Each handle maps to exactly
/// one entry; revoking it releases the registry's reference to the file source.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    entries: Arc<RwLock<HashMap<Uuid, Arc<dyn FileSource>>>>,
}

impl PreviewRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a preview handle for `source`
    pub async fn create(&self, source: Arc<dyn FileSource>) -> PreviewHandle {
        let handle = PreviewHandle::new();
        let description = source.describe();
        self.entries.write().await.insert(handle.key, source);
        tracing::debug!(preview = %handle, source = %description, "Preview handle allocated");
        handle
    }

    /// Revoke a handle. Returns false if it was not live.
    pub async fn revoke(&self, handle: &PreviewHandle) -> bool {
        let removed = self.entries.write().await.remove(&handle.key).is_some();
        if removed {
            tracing::debug!(preview = %handle, "Preview handle revoked");
        }
        removed
    }

    pub async fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.entries.read().await.contains_key(&handle.key)
    }

    pub async fn live_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Read the bytes behind a live handle for rendering
    pub async fn read(&self, handle: &PreviewHandle) -> SourceResult<Bytes> {
        let source = self
            .entries
            .read()
            .await
            .get(&handle.key)
            .cloned()
            .ok_or_else(|| SourceError::Revoked(handle.url()))?;
        source.read_all().await
    }
}
