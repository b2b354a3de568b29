//! Vigil Core Library
//!
//! This crate provides the evidence domain models, error metadata, configuration
//! and clock abstraction shared across all Vigil components.

pub mod clock;
pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use config::{AnalysisConfig, VigilConfig};
pub use error::{ErrorMetadata, LogLevel};
pub use models::{
    Actor, AuthenticityScore, CustodyAction, CustodyEntry, CustodyLog, Dimensions,
    EvidenceId, EvidenceKind, EvidencePatch, EvidenceRecord, EvidenceTimestamps, Identity,
    IntegrityHash, LegalPolicy, LegalStatus, PendingId, PendingState, PreviewHandle, Session,
    Verification,
};
