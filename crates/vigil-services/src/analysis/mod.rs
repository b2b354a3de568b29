//! Authenticity analysis collaborator
//!
//! Scores how likely an evidence file is to be genuine. The analysis runs
//! outside the process, so every call is async and fallible.

mod http;

pub use http::HttpAuthenticityAnalyzer;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use vigil_core::{AuthenticityScore, IntegrityHash};
use vigil_storage::{FileSource, SourceError};

/// File handed to an analyzer. The source is read on demand.
#[derive(Clone)]
pub struct AnalysisRequest {
    pub integrity_hash: IntegrityHash,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source: Arc<dyn FileSource>,
}

impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("integrity_hash", &self.integrity_hash)
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.size_bytes)
            .field("source", &self.source.describe())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticityAssessment {
    pub score: AuthenticityScore,
    /// Name of the service or model that produced the score
    pub analyzer: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The file could not be read for analysis
    #[error("Source unavailable: {0}")]
    Source(#[from] SourceError),

    #[error("Analysis service request failed: {0}")]
    Transport(String),

    #[error("Analysis service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid analysis response: {0}")]
    InvalidResponse(String),
}

impl AnalysisError {
    /// Transport failures, throttling and server errors may succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Transport(_) => true,
            AnalysisError::Status { status, .. } => *status >= 500 || *status == 429,
            AnalysisError::Source(_) | AnalysisError::InvalidResponse(_) => false,
        }
    }
}

#[async_trait]
pub trait AuthenticityAnalyzer: Send + Sync {
    /// Name recorded on verifications this analyzer produces
    fn name(&self) -> &str;

    async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AuthenticityAssessment, AnalysisError>;
}
