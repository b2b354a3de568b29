//! Pending queue of acquired files awaiting metadata synthesis

use crate::error::IntakeError;
use crate::synthesis::{StageTracker, SynthesisStage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use vigil_core::{Dimensions, PendingId, PendingState, PreviewHandle};
use vigil_processing::metadata::file_size_label;
use vigil_storage::FileSource;

/// An accepted upload. Owns the only reference the workflow holds to the
/// file's bytes until it is promoted or discarded.
pub struct PendingFile {
    pub id: PendingId,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub dimensions: Option<Dimensions>,
    pub preview: PreviewHandle,
    pub acquired_at: DateTime<Utc>,
    pub state: PendingState,
    pub last_error: Option<String>,
    source: Arc<dyn FileSource>,
    stage: Option<watch::Receiver<SynthesisStage>>,
}

impl PendingFile {
    pub fn new(
        file_name: String,
        mime_type: String,
        size_bytes: u64,
        dimensions: Option<Dimensions>,
        preview: PreviewHandle,
        acquired_at: DateTime<Utc>,
        source: Arc<dyn FileSource>,
    ) -> Self {
        Self {
            id: PendingId::new(),
            file_name,
            mime_type,
            size_bytes,
            dimensions,
            preview,
            acquired_at,
            state: PendingState::Queued,
            last_error: None,
            source,
            stage: None,
        }
    }

    pub fn view(&self) -> PendingFileView {
        PendingFileView {
            id: self.id,
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
            file_size_label: file_size_label(self.size_bytes),
            dimensions: self.dimensions,
            preview_url: self.preview.url(),
            acquired_at: self.acquired_at,
            state: self.state,
            synthesis_stage: self.stage.as_ref().map(|rx| *rx.borrow()),
            last_error: self.last_error.clone(),
        }
    }

    fn job(&mut self) -> SynthesisJob {
        let (stage, rx) = StageTracker::new();
        self.stage = Some(rx);
        SynthesisJob {
            pending_id: self.id,
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
            dimensions: self.dimensions,
            preview: self.preview.clone(),
            acquired_at: self.acquired_at,
            source: Arc::clone(&self.source),
            stage,
        }
    }
}

/// Read-only view of a pending file for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingFileView {
    pub id: PendingId,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub file_size_label: String,
    pub dimensions: Option<Dimensions>,
    pub preview_url: String,
    pub acquired_at: DateTime<Utc>,
    pub state: PendingState,
    /// Stage reached by the running synthesis, `None` unless synthesizing
    pub synthesis_stage: Option<SynthesisStage>,
    pub last_error: Option<String>,
}

/// Everything synthesis needs from a claimed pending file
#[derive(Clone)]
pub struct SynthesisJob {
    pub pending_id: PendingId,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub dimensions: Option<Dimensions>,
    pub preview: PreviewHandle,
    pub acquired_at: DateTime<Utc>,
    pub source: Arc<dyn FileSource>,
    pub stage: StageTracker,
}

/// Insertion-ordered queue of pending files
#[derive(Default)]
pub struct PendingQueue {
    entries: Vec<PendingFile>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: PendingFile) {
        tracing::debug!(pending_id = %file.id, file_name = %file.file_name, "Queued pending file");
        self.entries.push(file);
    }

    fn position(&self, id: PendingId) -> Option<usize> {
        self.entries.iter().position(|f| f.id == id)
    }

    pub fn get(&self, id: PendingId) -> Option<PendingFileView> {
        self.entries.iter().find(|f| f.id == id).map(PendingFile::view)
    }

    pub fn contains(&self, id: PendingId) -> bool {
        self.position(id).is_some()
    }

    pub fn list(&self) -> Vec<PendingFileView> {
        self.entries.iter().map(PendingFile::view).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of files waiting for synthesis, oldest first
    pub fn queued_ids(&self) -> Vec<PendingId> {
        self.entries
            .iter()
            .filter(|f| f.state == PendingState::Queued)
            .map(|f| f.id)
            .collect()
    }

    /// Remove a file that is not being synthesized. `Ok(None)` when absent.
    pub fn remove(&mut self, id: PendingId) -> Result<Option<PendingFile>, IntakeError> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };
        if self.entries[index].state == PendingState::Synthesizing {
            return Err(IntakeError::SynthesisInProgress(id));
        }
        Ok(Some(self.entries.remove(index)))
    }

    /// Mark a queued file as being synthesized and hand out its job
    pub fn claim(&mut self, id: PendingId) -> Result<SynthesisJob, IntakeError> {
        let file = self
            .entries
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| IntakeError::NotFound(id.to_string()))?;

        match file.state {
            PendingState::Queued => {
                file.state = PendingState::Synthesizing;
                Ok(file.job())
            }
            PendingState::Synthesizing | PendingState::Promoted => {
                Err(IntakeError::SynthesisInProgress(id))
            }
        }
    }

    /// Return a claimed file to the queue after a failed attempt
    pub fn release_claim(&mut self, id: PendingId, error: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|f| f.id == id) {
            Some(file) if file.state == PendingState::Synthesizing => {
                file.state = PendingState::Queued;
                file.stage = None;
                file.last_error = Some(error.into());
                true
            }
            _ => false,
        }
    }

    /// Take a claimed file out of the queue
    pub fn take(&mut self, id: PendingId) -> Option<PendingFile> {
        let index = self.position(id)?;
        if self.entries[index].state != PendingState::Synthesizing {
            return None;
        }
        let mut file = self.entries.remove(index);
        file.state = PendingState::Promoted;
        Some(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_storage::MemorySource;

    fn pending(name: &str) -> PendingFile {
        PendingFile::new(
            name.to_string(),
            "image/png".to_string(),
            3,
            None,
            PreviewHandle::new(),
            Utc::now(),
            Arc::new(MemorySource::new(name, vec![1u8, 2, 3])),
        )
    }

    #[test]
    fn test_insertion_order_survives_removal() {
        let mut queue = PendingQueue::new();
        let a = pending("a.png");
        let b = pending("b.png");
        let c = pending("c.png");
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        queue.push(a);
        queue.push(b);
        queue.push(c);

        assert!(queue.remove(b_id).unwrap().is_some());
        let names: Vec<_> = queue.list().into_iter().map(|v| v.file_name).collect();
        assert_eq!(names, vec!["a.png", "c.png"]);
        assert_eq!(queue.queued_ids(), vec![a_id, c_id]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut queue = PendingQueue::new();
        let file = pending("a.png");
        let id = file.id;
        queue.push(file);

        assert!(queue.remove(id).unwrap().is_some());
        assert!(queue.remove(id).unwrap().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_claim_lifecycle() {
        let mut queue = PendingQueue::new();
        let file = pending("a.png");
        let id = file.id;
        queue.push(file);

        assert_eq!(queue.get(id).unwrap().synthesis_stage, None);
        let job = queue.claim(id).unwrap();
        assert_eq!(job.pending_id, id);
        assert_eq!(
            queue.get(id).unwrap().synthesis_stage,
            Some(SynthesisStage::Collected)
        );
        assert!(matches!(
            queue.claim(id),
            Err(IntakeError::SynthesisInProgress(_))
        ));
        assert!(matches!(
            queue.remove(id),
            Err(IntakeError::SynthesisInProgress(_))
        ));
        assert!(queue.queued_ids().is_empty());

        assert!(queue.release_claim(id, "analysis timed out"));
        let view = queue.get(id).unwrap();
        assert_eq!(view.state, PendingState::Queued);
        assert_eq!(view.last_error.as_deref(), Some("analysis timed out"));
        assert_eq!(view.synthesis_stage, None);

        queue.claim(id).unwrap();
        let taken = queue.take(id).unwrap();
        assert_eq!(taken.state, PendingState::Promoted);
        assert!(!queue.contains(id));
        assert!(queue.take(id).is_none());
    }

    #[test]
    fn test_view_follows_stage_updates() {
        let mut queue = PendingQueue::new();
        let file = pending("a.png");
        let id = file.id;
        queue.push(file);

        let job = queue.claim(id).unwrap();
        job.stage.advance(SynthesisStage::Verifying);
        assert_eq!(
            queue.get(id).unwrap().synthesis_stage,
            Some(SynthesisStage::Verifying)
        );
    }

    #[test]
    fn test_take_requires_claim() {
        let mut queue = PendingQueue::new();
        let file = pending("a.png");
        let id = file.id;
        queue.push(file);
        assert!(queue.take(id).is_none());
        assert!(queue.contains(id));
    }

    #[test]
    fn test_claim_missing() {
        let mut queue = PendingQueue::new();
        assert!(matches!(
            queue.claim(PendingId::new()),
            Err(IntakeError::NotFound(_))
        ));
    }

    #[test]
    fn test_view_labels() {
        let file = pending("a.png");
        let view = file.view();
        assert_eq!(view.file_size_label, "0.0 MB");
        assert!(view.preview_url.starts_with("preview://vigil/"));
    }
}
