//! Vigil Intake Library
//!
//! The evidence intake workflow: files are acquired into a pending queue,
//! promoted through metadata synthesis, and appended to the evidence store.

pub mod candidate;
pub mod error;
pub mod queue;
pub mod service;
pub mod store;
pub mod synthesis;

pub use candidate::CandidateFile;
pub use error::IntakeError;
pub use queue::{PendingFile, PendingFileView, PendingQueue, SynthesisJob};
pub use service::{
    AcquisitionOutcome, AcquisitionReport, BatchOutcome, BatchReport, DeferredOperation,
    DeferredOutcome, IntakeService, IntakeState, SignInOutcome,
};
pub use store::{EvidenceQuery, EvidenceStore, SortKey, StoreEvent};
pub use synthesis::{StageTracker, SynthesisStage, Synthesizer};
