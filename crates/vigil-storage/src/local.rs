use crate::traits::{FileSource, SourceError, SourceReader, SourceResult};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File payload that stays on the local filesystem until it is read.
///
/// Nothing is copied at acquisition time, so a file that is moved or deleted
/// before synthesis becomes unreadable.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the file on disk
    pub async fn size(&self) -> SourceResult<u64> {
        let metadata = fs::metadata(&self.path)
            .await
            .map_err(|e| self.map_io_error(e))?;
        Ok(metadata.len())
    }

    fn map_io_error(&self, err: std::io::Error) -> SourceError {
        if err.kind() == ErrorKind::NotFound {
            SourceError::NotFound(self.path.display().to_string())
        } else {
            SourceError::Io(err)
        }
    }
}

#[async_trait]
impl FileSource for LocalFileSource {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    async fn open(&self) -> SourceResult<SourceReader> {
        let file = fs::File::open(&self.path)
            .await
            .map_err(|e| self.map_io_error(e))?;
        tracing::debug!(path = %self.path.display(), "Opened local file source");
        let reader: SourceReader = Box::pin(file);
        Ok(reader)
    }
}
