//! File source abstraction trait
//!
//! This module defines the FileSource trait that every upload payload implements.

use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// File source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source revoked: {0}")]
    Revoked(String),

    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Boxed async reader over a source's bytes
pub type SourceReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Readable payload of an uploaded file.
///
/// Sources can become unreadable after acquisition (revoked by the browser/host,
/// deleted on disk). Every read goes through [`FileSource::open`] so that the
/// failure surfaces at the moment the bytes are needed.
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Human-readable location used in logs
    fn describe(&self) -> String;

    /// Open a fresh reader positioned at the start of the payload
    async fn open(&self) -> SourceResult<SourceReader>;

    /// Read the whole payload into memory
    async fn read_all(&self) -> SourceResult<Bytes> {
        let mut reader = self.open().await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(Bytes::from(buf))
    }
}
