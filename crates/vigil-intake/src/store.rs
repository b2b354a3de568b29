//! Append-only evidence store with change notifications

use crate::error::IntakeError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use vigil_core::{EvidenceId, EvidenceKind, EvidencePatch, EvidenceRecord, LegalStatus};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notification emitted after the store is modified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Appended(EvidenceId),
    Updated(EvidenceId),
}

impl StoreEvent {
    pub fn evidence_id(&self) -> EvidenceId {
        match self {
            StoreEvent::Appended(id) | StoreEvent::Updated(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Most recently collected first
    #[default]
    Newest,
    /// By kind name
    Kind,
    /// Highest authenticity score first
    Authenticity,
}

/// Gallery filter. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EvidenceQuery {
    pub kind: Option<EvidenceKind>,
    pub legal_status: Option<LegalStatus>,
    pub tag: Option<String>,
    pub sort: SortKey,
}

impl EvidenceQuery {
    fn matches(&self, record: &EvidenceRecord) -> bool {
        self.kind.map_or(true, |k| record.kind == k)
            && self
                .legal_status
                .map_or(true, |s| record.verification.legal_status == s)
            && self.tag.as_deref().map_or(true, |t| record.has_tag(t))
    }
}

/// Serialized export of the whole store
#[derive(Debug, Serialize)]
pub struct EvidencePackage<'a> {
    pub exported_at: DateTime<Utc>,
    pub record_count: usize,
    pub records: Vec<&'a EvidenceRecord>,
}

pub struct EvidenceStore {
    records: Vec<Arc<EvidenceRecord>>,
    index: HashMap<EvidenceId, usize>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for EvidenceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            events,
        }
    }

    /// Sender half of the change channel, for subscribing without the store lock
    pub fn event_sender(&self) -> broadcast::Sender<StoreEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn notify(&self, event: StoreEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    pub fn append(&mut self, record: EvidenceRecord) -> Result<Arc<EvidenceRecord>, IntakeError> {
        if self.index.contains_key(&record.id) {
            return Err(IntakeError::Internal(format!(
                "{} is already in the store",
                record.id
            )));
        }

        let id = record.id;
        let record = Arc::new(record);
        self.index.insert(id, self.records.len());
        self.records.push(Arc::clone(&record));

        tracing::info!(evidence_id = %id, title = %record.title, "Evidence record appended");
        self.notify(StoreEvent::Appended(id));
        Ok(record)
    }

    /// Patch description and tags. Snapshots handed out earlier keep the old values.
    pub fn update(
        &mut self,
        id: EvidenceId,
        patch: EvidencePatch,
        now: DateTime<Utc>,
    ) -> Result<Arc<EvidenceRecord>, IntakeError> {
        let index = *self
            .index
            .get(&id)
            .ok_or_else(|| IntakeError::NotFound(id.to_string()))?;

        let slot = &mut self.records[index];
        if !patch.is_empty() && patch.apply(Arc::make_mut(slot), now) {
            tracing::info!(evidence_id = %id, "Evidence record updated");
            let updated = Arc::clone(slot);
            self.notify(StoreEvent::Updated(id));
            return Ok(updated);
        }
        Ok(Arc::clone(&self.records[index]))
    }

    pub fn get(&self, id: EvidenceId) -> Option<Arc<EvidenceRecord>> {
        self.index.get(&id).map(|&i| Arc::clone(&self.records[i]))
    }

    /// Point-in-time snapshot in append order
    pub fn list(&self) -> Vec<Arc<EvidenceRecord>> {
        self.records.clone()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn query(&self, query: &EvidenceQuery) -> Vec<Arc<EvidenceRecord>> {
        let mut matched: Vec<Arc<EvidenceRecord>> = self
            .records
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();

        match query.sort {
            SortKey::Newest => {
                matched.sort_by(|a, b| b.timestamps.collected_at.cmp(&a.timestamps.collected_at))
            }
            SortKey::Kind => matched.sort_by(|a, b| a.kind.as_str().cmp(b.kind.as_str())),
            SortKey::Authenticity => matched.sort_by(|a, b| {
                b.verification
                    .authenticity_score
                    .cmp(&a.verification.authenticity_score)
            }),
        }
        matched
    }

    pub fn export_json(&self, now: DateTime<Utc>) -> Result<String, IntakeError> {
        let package = EvidencePackage {
            exported_at: now,
            record_count: self.records.len(),
            records: self.records.iter().map(|r| r.as_ref()).collect(),
        };
        serde_json::to_string_pretty(&package)
            .map_err(|e| IntakeError::Internal(format!("Failed to serialize evidence: {}", e)))
    }
}
