use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

/// Identifier of a file waiting in the pending queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingId(pub Uuid);

impl PendingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PendingId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PendingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "pending-{}", self.0)
    }
}

/// Intrinsic pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// "1920x1080"
    pub fn label(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Lifecycle state of a pending file.
///
/// A file can only be removed while `Queued`; once synthesis has claimed it the
/// removal is rejected until synthesis either commits (`Promoted`) or hands the file
/// back to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingState {
    Queued,
    Synthesizing,
    Promoted,
}

impl Display for PendingState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PendingState::Queued => write!(f, "queued"),
            PendingState::Synthesizing => write!(f, "synthesizing"),
            PendingState::Promoted => write!(f, "promoted"),
        }
    }
}
