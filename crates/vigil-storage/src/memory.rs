use crate::traits::{FileSource, SourceError, SourceReader, SourceResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory file payload, e.g. bytes handed over by a drop event.
///
/// The host may revoke access out-of-band; after [`MemorySource::revoke`] every read
/// fails with [`SourceError::Revoked`].
pub struct MemorySource {
    name: String,
    data: Bytes,
    revoked: AtomicBool,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
            revoked: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSource for MemorySource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    async fn open(&self) -> SourceResult<SourceReader> {
        if self.is_revoked() {
            return Err(SourceError::Revoked(self.describe()));
        }
        let reader: SourceReader = Box::pin(Cursor::new(self.data.clone()));
        Ok(reader)
    }
}
