use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Authenticity score outside the accepted 1-100 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Authenticity score {0} is outside the range 1-100")]
pub struct ScoreOutOfRange(pub i64);

/// Trust signal (1-100) that an artifact is unaltered and genuine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct AuthenticityScore(u8);

impl AuthenticityScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self, ScoreOutOfRange> {
        if value < Self::MIN as i64 || value > Self::MAX as i64 {
            return Err(ScoreOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for AuthenticityScore {
    type Error = ScoreOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AuthenticityScore> for u8 {
    fn from(score: AuthenticityScore) -> Self {
        score.0
    }
}

impl Display for AuthenticityScore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}%", self.0)
    }
}

/// Coarse admissibility classification derived from the authenticity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegalStatus {
    Admissible,
    UnderReview,
}

impl LegalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalStatus::Admissible => "admissible",
            LegalStatus::UnderReview => "under_review",
        }
    }
}

impl Display for LegalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Policy mapping authenticity scores onto legal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegalPolicy {
    /// Scores strictly greater than this are admissible.
    pub admissible_threshold: u8,
}

impl LegalPolicy {
    pub fn new(admissible_threshold: u8) -> Self {
        Self {
            admissible_threshold,
        }
    }

    pub fn classify(&self, score: AuthenticityScore) -> LegalStatus {
        if score.value() > self.admissible_threshold {
            LegalStatus::Admissible
        } else {
            LegalStatus::UnderReview
        }
    }
}

impl Default for LegalPolicy {
    fn default() -> Self {
        Self::new(70)
    }
}

/// Outcome of authenticity verification for one evidence record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub authenticity_score: AuthenticityScore,
    pub legal_status: LegalStatus,
    pub verified_at: DateTime<Utc>,
    /// Name of the analysis service that produced the score.
    pub analyzer: String,
}
