//! Chain-of-custody audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Action recorded in a custody entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum CustodyAction {
    Collected,
    HashGenerated,
    VerificationStarted,
    LegalReview,
}

impl Display for CustodyAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CustodyAction::Collected => write!(f, "Evidence Collected"),
            CustodyAction::HashGenerated => write!(f, "Hash Generated"),
            CustodyAction::VerificationStarted => write!(f, "Verification Started"),
            CustodyAction::LegalReview => write!(f, "Legal Review"),
        }
    }
}

/// Who performed a custody action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    System,
    Named(String),
}

impl Actor {
    pub fn named(name: impl Into<String>) -> Self {
        Actor::Named(name.into())
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Actor::System => write!(f, "System"),
            Actor::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyEntry {
    pub action: CustodyAction,
    pub actor: Actor,
    pub at: DateTime<Utc>,
    pub notes: String,
}

impl CustodyEntry {
    /// "10/16/2026, 3:04:05 PM"
    pub fn timestamp_label(&self) -> String {
        self.at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CustodyLogError {
    #[error("Custody log is empty")]
    Empty,

    #[error("Custody log must start with a collection entry, found {0}")]
    FirstEntryNotCollected(CustodyAction),

    #[error("Custody entry {index} is earlier than the entry before it")]
    OutOfOrder { index: usize },
}

/// Append-only, chronologically ordered custody log.
///
/// Invariants: the first entry is always [`CustodyAction::Collected`] and timestamps
/// never decrease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<CustodyEntry>", into = "Vec<CustodyEntry>")]
pub struct CustodyLog {
    entries: Vec<CustodyEntry>,
}

impl CustodyLog {
    /// Start a log with the collection entry.
    pub fn collected(actor: Actor, at: DateTime<Utc>, notes: impl Into<String>) -> Self {
        Self {
            entries: vec![CustodyEntry {
                action: CustodyAction::Collected,
                actor,
                at,
                notes: notes.into(),
            }],
        }
    }

    /// Append an entry. A timestamp earlier than the previous entry (wall clock stepped
    /// backwards) is clamped to the previous entry's time.
    pub fn append(
        &mut self,
        action: CustodyAction,
        actor: Actor,
        at: DateTime<Utc>,
        notes: impl Into<String>,
    ) -> &CustodyEntry {
        let at = match self.entries.last() {
            Some(last) if at < last.at => {
                tracing::warn!(
                    action = %action,
                    requested = %at,
                    previous = %last.at,
                    "Custody timestamp went backwards, clamping to previous entry"
                );
                last.at
            }
            _ => at,
        };

        self.entries.push(CustodyEntry {
            action,
            actor,
            at,
            notes: notes.into(),
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[CustodyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&CustodyEntry> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CustodyEntry> {
        self.entries.iter()
    }
}

impl TryFrom<Vec<CustodyEntry>> for CustodyLog {
    type Error = CustodyLogError;

    fn try_from(entries: Vec<CustodyEntry>) -> Result<Self, Self::Error> {
        let first = entries.first().ok_or(CustodyLogError::Empty)?;
        if first.action != CustodyAction::Collected {
            return Err(CustodyLogError::FirstEntryNotCollected(first.action));
        }
        if let Some(index) = entries
            .windows(2)
            .position(|pair| pair[1].at < pair[0].at)
        {
            return Err(CustodyLogError::OutOfOrder { index: index + 1 });
        }
        Ok(Self { entries })
    }
}

impl From<CustodyLog> for Vec<CustodyEntry> {
    fn from(log: CustodyLog) -> Self {
        log.entries
    }
}

impl<'a> IntoIterator for &'a CustodyLog {
    type Item = &'a CustodyEntry;
    type IntoIter = std::slice::Iter<'a, CustodyEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 15, 4, 5).unwrap()
    }

    #[test]
    fn test_log_starts_with_collected() {
        let log = CustodyLog::collected(Actor::named("agent"), t0(), "collected");
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].action, CustodyAction::Collected);
    }

    #[test]
    fn test_append_keeps_order() {
        let mut log = CustodyLog::collected(Actor::named("agent"), t0(), "collected");
        log.append(
            CustodyAction::HashGenerated,
            Actor::System,
            t0() + Duration::seconds(1),
            "hashed",
        );
        log.append(
            CustodyAction::VerificationStarted,
            Actor::named("Verification Desk"),
            t0() + Duration::seconds(2),
            "started",
        );

        let actions: Vec<_> = log.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                CustodyAction::Collected,
                CustodyAction::HashGenerated,
                CustodyAction::VerificationStarted
            ]
        );
    }

    #[test]
    fn test_append_clamps_backwards_time() {
        let mut log = CustodyLog::collected(Actor::named("agent"), t0(), "collected");
        let entry = log.append(
            CustodyAction::HashGenerated,
            Actor::System,
            t0() - Duration::seconds(30),
            "hashed",
        );
        assert_eq!(entry.at, t0());
    }

    #[test]
    fn test_timestamp_label() {
        let log = CustodyLog::collected(Actor::named("agent"), t0(), "collected");
        assert_eq!(log.entries()[0].timestamp_label(), "10/16/2026, 3:04:05 PM");
    }

    #[test]
    fn test_deserialize_rejects_invalid_logs() {
        let bad_first = vec![CustodyEntry {
            action: CustodyAction::HashGenerated,
            actor: Actor::System,
            at: t0(),
            notes: String::new(),
        }];
        assert_eq!(
            CustodyLog::try_from(bad_first),
            Err(CustodyLogError::FirstEntryNotCollected(
                CustodyAction::HashGenerated
            ))
        );
        assert_eq!(CustodyLog::try_from(Vec::new()), Err(CustodyLogError::Empty));

        let json = serde_json::json!([
            {"action": "collected", "actor": "system", "at": "2026-10-16T15:04:05Z", "notes": ""},
            {"action": "hash_generated", "actor": "system", "at": "2026-10-16T15:00:00Z", "notes": ""}
        ]);
        assert!(serde_json::from_value::<CustodyLog>(json).is_err());
    }

    #[test]
    fn test_actor_display() {
        assert_eq!(Actor::System.to_string(), "System");
        assert_eq!(Actor::named("Legal Team").to_string(), "Legal Team");
    }
}
