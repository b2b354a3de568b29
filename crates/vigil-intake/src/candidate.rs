//! Files offered for acquisition

use crate::error::IntakeError;
use bytes::Bytes;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;
use vigil_processing::file_extension;
use vigil_storage::{FileSource, LocalFileSource, MemorySource};

/// A file selected or dropped by the user, not yet validated.
#[derive(Clone)]
pub struct CandidateFile {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source: Arc<dyn FileSource>,
}

impl Debug for CandidateFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CandidateFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

impl CandidateFile {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
        source: Arc<dyn FileSource>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
            source,
        }
    }

    /// Candidate backed by in-memory bytes
    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let file_name = file_name.into();
        let source = MemorySource::new(file_name.clone(), data);
        let size_bytes = source.len() as u64;
        Self::new(file_name, mime_type, size_bytes, Arc::new(source))
    }

    /// Candidate backed by a file on disk. Without an explicit media type one is
    /// guessed from the extension, falling back to `application/octet-stream`.
    pub async fn from_path(
        path: impl AsRef<Path>,
        mime_type: Option<&str>,
    ) -> Result<Self, IntakeError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| IntakeError::NotFound(path.display().to_string()))?
            .to_string();

        let source = LocalFileSource::new(path);
        let size_bytes = source
            .size()
            .await
            .map_err(|e| IntakeError::from_source(&file_name, e))?;

        let mime_type = mime_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_mime_type(&file_name).to_string());

        Ok(Self::new(file_name, mime_type, size_bytes, Arc::new(source)))
    }
}

pub fn guess_mime_type(file_name: &str) -> &'static str {
    match file_extension(file_name).as_deref() {
        Some("jpg" | "jpeg" | "jfif") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("tif" | "tiff") => "image/tiff",
        Some("heic") => "image/heic",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_bytes_records_size() {
        let candidate = CandidateFile::from_bytes("photo.jpg", "image/jpeg", vec![0u8; 42]);
        assert_eq!(candidate.size_bytes, 42);
        assert_eq!(candidate.source.describe(), "memory:photo.jpg");
    }

    #[tokio::test]
    async fn test_from_path_guesses_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.PNG");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[1, 2, 3, 4, 5]).unwrap();

        let candidate = CandidateFile::from_path(&path, None).await.unwrap();
        assert_eq!(candidate.file_name, "scene.PNG");
        assert_eq!(candidate.mime_type, "image/png");
        assert_eq!(candidate.size_bytes, 5);
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CandidateFile::from_path(dir.path().join("gone.jpg"), Some("image/jpeg"))
            .await
            .unwrap_err();
        assert!(matches!(err, IntakeError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_guess_mime_type() {
        assert_eq!(guess_mime_type("a.jpeg"), "image/jpeg");
        assert_eq!(guess_mime_type("notes.txt"), "text/plain");
        assert_eq!(guess_mime_type("blob"), "application/octet-stream");
    }
}
