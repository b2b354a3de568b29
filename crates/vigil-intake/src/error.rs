//! Intake error taxonomy
//!
//! Every failure of the intake workflow is reported to the caller as an
//! [`IntakeError`]. None of them is fatal; the metadata tells a presentation
//! layer how to surface each one.

use vigil_core::error::{ErrorMetadata, LogLevel};
use vigil_core::PendingId;
use vigil_processing::{DigestError, ValidationError};
use vigil_services::{AnalysisError, AuthError};
use vigil_storage::SourceError;

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Sign in required")]
    Unauthenticated,

    #[error("{file_name}: unsupported file type {mime_type}")]
    UnsupportedFileType { file_name: String, mime_type: String },

    #[error("{file_name}: file is empty")]
    EmptyFile { file_name: String },

    #[error("{file_name}: {size} bytes exceeds the {max} byte limit")]
    FileTooLarge {
        file_name: String,
        size: u64,
        max: usize,
    },

    #[error("{file_name}: extension '{extension}' does not match {mime_type}")]
    ExtensionMismatch {
        file_name: String,
        extension: String,
        mime_type: String,
    },

    #[error("{file_name}: source unavailable: {reason}")]
    SourceUnavailable { file_name: String, reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0} is being synthesized")]
    SynthesisInProgress(PendingId),

    #[error("Authenticity analysis failed: {message}")]
    Analysis { message: String, retryable: bool },

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntakeError {
    pub fn from_validation(file_name: &str, mime_type: &str, size: u64, err: ValidationError) -> Self {
        let file_name = file_name.to_string();
        match err {
            ValidationError::UnsupportedContentType { .. } => IntakeError::UnsupportedFileType {
                file_name,
                mime_type: mime_type.to_string(),
            },
            ValidationError::EmptyFile => IntakeError::EmptyFile { file_name },
            ValidationError::FileTooLarge { max, .. } => IntakeError::FileTooLarge {
                file_name,
                size,
                max,
            },
            ValidationError::ExtensionMismatch { extension, .. } => {
                IntakeError::ExtensionMismatch {
                    file_name,
                    extension,
                    mime_type: mime_type.to_string(),
                }
            }
        }
    }

    pub fn from_source(file_name: &str, err: SourceError) -> Self {
        IntakeError::SourceUnavailable {
            file_name: file_name.to_string(),
            reason: err.to_string(),
        }
    }

    pub fn from_digest(file_name: &str, err: DigestError) -> Self {
        match err {
            DigestError::Source(e) => Self::from_source(file_name, e),
            DigestError::Read { .. } => IntakeError::SourceUnavailable {
                file_name: file_name.to_string(),
                reason: err.to_string(),
            },
        }
    }

    pub fn from_analysis(file_name: &str, err: AnalysisError) -> Self {
        match err {
            AnalysisError::Source(e) => Self::from_source(file_name, e),
            other => IntakeError::Analysis {
                retryable: other.is_retryable(),
                message: other.to_string(),
            },
        }
    }
}

fn intake_error_static_metadata(
    err: &IntakeError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        IntakeError::Unauthenticated => (
            "UNAUTHENTICATED",
            true,
            Some("Sign in to continue; the request will resume automatically"),
            LogLevel::Debug,
        ),
        IntakeError::UnsupportedFileType { .. } => (
            "UNSUPPORTED_FILE_TYPE",
            false,
            Some("Upload image files only"),
            LogLevel::Warn,
        ),
        IntakeError::EmptyFile { .. } => (
            "EMPTY_FILE",
            false,
            Some("Choose a file that contains data"),
            LogLevel::Warn,
        ),
        IntakeError::FileTooLarge { .. } => (
            "FILE_TOO_LARGE",
            false,
            Some("Reduce the file size or upload a smaller file"),
            LogLevel::Warn,
        ),
        IntakeError::ExtensionMismatch { .. } => (
            "EXTENSION_MISMATCH",
            false,
            Some("Rename the file with the extension matching its type"),
            LogLevel::Warn,
        ),
        IntakeError::SourceUnavailable { .. } => (
            "SOURCE_UNAVAILABLE",
            false,
            Some("Upload the file again"),
            LogLevel::Warn,
        ),
        IntakeError::NotFound(_) => ("NOT_FOUND", false, None, LogLevel::Debug),
        IntakeError::SynthesisInProgress(_) => (
            "SYNTHESIS_IN_PROGRESS",
            true,
            Some("Wait for metadata generation to finish"),
            LogLevel::Debug,
        ),
        IntakeError::Analysis { .. } => (
            "ANALYSIS_FAILED",
            true,
            Some("Retry metadata generation"),
            LogLevel::Error,
        ),
        IntakeError::Auth(_) => (
            "AUTH_FAILED",
            true,
            Some("Check your email and password"),
            LogLevel::Warn,
        ),
        IntakeError::Internal(_) => ("INTERNAL_ERROR", true, None, LogLevel::Error),
    }
}

impl ErrorMetadata for IntakeError {
    fn error_code(&self) -> &'static str {
        intake_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        match self {
            IntakeError::Analysis { retryable, .. } => *retryable,
            _ => intake_error_static_metadata(self).1,
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        intake_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            IntakeError::Analysis { .. } => {
                "Authenticity analysis is unavailable right now".to_string()
            }
            IntakeError::Auth(AuthError::Hashing(_)) | IntakeError::Internal(_) => {
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        intake_error_static_metadata(self).3
    }
}
