use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FmtResult};
use uuid::Uuid;

use super::custody::CustodyLog;
use super::pending::{Dimensions, PendingId};
use super::preview::PreviewHandle;
use super::verification::Verification;

/// Stable identifier of an evidence record, never shared with a pending file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvidenceId(pub Uuid);

impl EvidenceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EvidenceId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for EvidenceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "evidence-{}", self.0)
    }
}

/// Evidence kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceKind {
    Image,
    Video,
    File,
}

impl EvidenceKind {
    pub fn from_mime(mime_type: &str) -> Self {
        let mime = mime_type.to_ascii_lowercase();
        if mime.starts_with("video/") {
            EvidenceKind::Video
        } else if mime.starts_with("image/") {
            EvidenceKind::Image
        } else {
            EvidenceKind::File
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceKind::Image => "image",
            EvidenceKind::Video => "video",
            EvidenceKind::File => "file",
        }
    }
}

impl Display for EvidenceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid integrity hash: {0}")]
pub struct InvalidIntegrityHash(pub String);

/// Content digest in the form `sha256:<64 lowercase hex chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IntegrityHash(String);

impl IntegrityHash {
    pub const PREFIX: &'static str = "sha256:";

    /// Build from a raw 32-byte SHA-256 digest.
    pub fn from_sha256(digest: &[u8; 32]) -> Self {
        Self(format!("{}{}", Self::PREFIX, hex::encode(digest)))
    }

    pub fn parse(value: &str) -> Result<Self, InvalidIntegrityHash> {
        let hex = value
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| InvalidIntegrityHash(value.to_string()))?;
        if hex.len() != 64
            || !hex
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(InvalidIntegrityHash(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex digest without the algorithm prefix.
    pub fn hex(&self) -> &str {
        &self.0[Self::PREFIX.len()..]
    }
}

impl TryFrom<String> for IntegrityHash {
    type Error = InvalidIntegrityHash;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IntegrityHash> for String {
    fn from(hash: IntegrityHash) -> Self {
        hash.0
    }
}

impl Display for IntegrityHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTimestamps {
    /// When the file entered the intake workflow.
    pub collected_at: DateTime<Utc>,
    /// When the evidence record was created.
    pub uploaded_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

/// Finalized description of one collected artifact plus its audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: EvidenceId,
    pub source_pending_id: PendingId,
    pub title: String,
    pub kind: EvidenceKind,
    pub platform: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub file_size_label: String,
    pub resolution_label: String,
    pub dimensions: Option<Dimensions>,
    pub collector: String,
    pub uploaded_by: String,
    pub verification: Verification,
    pub integrity_hash: IntegrityHash,
    pub timestamps: EvidenceTimestamps,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub custody_log: CustodyLog,
    pub preview: PreviewHandle,
}

impl EvidenceRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// Allowed-field patch for an evidence record. Only description and tags are editable;
/// identity, verification and custody are not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidencePatch {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl EvidencePatch {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.tags.is_none()
    }

    /// Apply the patch. Tags are trimmed and empty entries dropped. Returns whether
    /// anything changed.
    pub fn apply(self, record: &mut EvidenceRecord, now: DateTime<Utc>) -> bool {
        let mut changed = false;

        if let Some(description) = self.description {
            if description != record.description {
                record.description = description;
                changed = true;
            }
        }

        if let Some(tags) = self.tags {
            let tags: BTreeSet<String> = tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if tags != record.tags {
                record.tags = tags;
                changed = true;
            }
        }

        if changed {
            record.timestamps.last_modified = now.max(record.timestamps.last_modified);
        }
        changed
    }
}
