//! Domain models for the evidence intake workflow.

pub mod custody;
pub mod evidence;
pub mod identity;
pub mod pending;
pub mod preview;
pub mod verification;

pub use custody::{Actor, CustodyAction, CustodyEntry, CustodyLog, CustodyLogError};
pub use evidence::{
    EvidenceId, EvidenceKind, EvidencePatch, EvidenceRecord, EvidenceTimestamps, IntegrityHash,
    InvalidIntegrityHash,
};
pub use identity::{Identity, Session};
pub use pending::{Dimensions, PendingId, PendingState};
pub use preview::PreviewHandle;
pub use verification::{AuthenticityScore, LegalPolicy, LegalStatus, ScoreOutOfRange, Verification};
