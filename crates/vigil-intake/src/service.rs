//! Intake service: acquisition, queue management, promotion and auth gating

use crate::candidate::CandidateFile;
use crate::error::IntakeError;
use crate::queue::{PendingFile, PendingFileView, PendingQueue, SynthesisJob};
use crate::store::{EvidenceQuery, EvidenceStore, StoreEvent};
use crate::synthesis::Synthesizer;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use vigil_core::error::report;
use vigil_core::{
    Clock, EvidenceId, EvidencePatch, EvidenceRecord, Identity, PendingId, PreviewHandle, Session,
    VigilConfig,
};
use vigil_processing::{ImageProcessor, UploadValidator};
use vigil_services::{AuthProvider, AuthenticityAnalyzer};
use vigil_storage::PreviewRegistry;

/// Queue and store share one lock so a promotion moves a file between them atomically.
#[derive(Default)]
pub struct IntakeState {
    pub queue: PendingQueue,
    pub store: EvidenceStore,
}

/// Operation parked until the user signs in
#[derive(Debug, Clone)]
pub enum DeferredOperation {
    Acquire(Vec<CandidateFile>),
    Promote(PendingId),
    GenerateAll,
}

/// Result of replaying a parked operation after sign-in
#[derive(Debug)]
pub enum DeferredOutcome {
    Acquired(AcquisitionReport),
    Promoted(Result<Arc<EvidenceRecord>, IntakeError>),
    Generated(Result<BatchReport, IntakeError>),
}

pub const CANCELLED_ERROR: &str = "Synthesis cancelled before it finished";

/// A claimed pending file. Dropping it unsettled (the promoting future was
/// cancelled) returns the file to the queue.
struct ClaimGuard {
    state: Arc<Mutex<IntakeState>>,
    id: PendingId,
    settled: bool,
}

impl ClaimGuard {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let id = self.id;
        tracing::warn!(pending_id = %id, "Synthesis cancelled, releasing claim");

        if let Ok(mut state) = self.state.try_lock() {
            state.queue.release_claim(id, CANCELLED_ERROR);
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let state = Arc::clone(&self.state);
                handle.spawn(async move {
                    state.lock().await.queue.release_claim(id, CANCELLED_ERROR);
                });
            }
            Err(_) => {
                tracing::error!(pending_id = %id, "No runtime available to release cancelled claim");
            }
        }
    }
}

#[derive(Debug)]
pub struct SignInOutcome {
    pub session: Session,
    pub replayed: Option<DeferredOutcome>,
}

#[derive(Debug)]
pub struct AcquisitionOutcome {
    pub file_name: String,
    pub result: Result<PendingFileView, IntakeError>,
}

#[derive(Debug, Default)]
pub struct AcquisitionReport {
    pub outcomes: Vec<AcquisitionOutcome>,
    /// The request was parked because nobody is signed in
    pub deferred: bool,
}

impl AcquisitionReport {
    pub fn accepted(&self) -> impl Iterator<Item = &PendingFileView> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn rejected(&self) -> impl Iterator<Item = (&str, &IntakeError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.file_name.as_str(), e)))
    }
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub pending_id: PendingId,
    pub result: Result<Arc<EvidenceRecord>, IntakeError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn promoted(&self) -> impl Iterator<Item = &Arc<EvidenceRecord>> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Files that left the queue before their turn
    pub fn skipped(&self) -> impl Iterator<Item = PendingId> + '_ {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Err(IntakeError::NotFound(_))))
            .map(|o| o.pending_id)
    }

    pub fn failed(&self) -> impl Iterator<Item = (PendingId, &IntakeError)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Err(IntakeError::NotFound(_)) | Ok(_) => None,
            Err(e) => Some((o.pending_id, e)),
        })
    }
}

pub struct IntakeService {
    state: Arc<Mutex<IntakeState>>,
    events: broadcast::Sender<StoreEvent>,
    previews: PreviewRegistry,
    auth: Arc<dyn AuthProvider>,
    synthesizer: Synthesizer,
    validator: UploadValidator,
    clock: Arc<dyn Clock>,
    concurrency: usize,
    deferred: Mutex<Option<DeferredOperation>>,
}

impl IntakeService {
    pub fn new(
        config: &VigilConfig,
        auth: Arc<dyn AuthProvider>,
        analyzer: Arc<dyn AuthenticityAnalyzer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = IntakeState::default();
        let events = state.store.event_sender();
        Self {
            state: Arc::new(Mutex::new(state)),
            events,
            previews: PreviewRegistry::new(),
            auth,
            synthesizer: Synthesizer::from_config(config, analyzer, Arc::clone(&clock)),
            validator: UploadValidator::from_config(config),
            clock,
            concurrency: config.synthesis_concurrency.max(1),
            deferred: Mutex::new(None),
        }
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    pub async fn current_user(&self) -> Option<Identity> {
        self.auth.current_user().await
    }

    /// The signed-in identity, or park `operation` and fail with `Unauthenticated`
    async fn require_identity(&self, operation: DeferredOperation) -> Result<Identity, IntakeError> {
        if let Some(identity) = self.auth.current_user().await {
            return Ok(identity);
        }

        let mut deferred = self.deferred.lock().await;
        if let Some(previous) = deferred.replace(operation) {
            tracing::warn!(?previous, "Replacing operation parked for sign-in");
        }
        tracing::info!("Operation parked until sign-in");
        Err(IntakeError::Unauthenticated)
    }

    pub async fn deferred_operation(&self) -> Option<DeferredOperation> {
        self.deferred.lock().await.clone()
    }

    /// Sign in and replay the operation parked while signed out, if any
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInOutcome, IntakeError> {
        let session = self.auth.sign_in(email, password).await.map_err(|e| {
            let err = IntakeError::from(e);
            report(&err, "sign_in");
            err
        })?;

        let parked = self.deferred.lock().await.take();
        let replayed = match parked {
            None => None,
            Some(DeferredOperation::Acquire(candidates)) => {
                tracing::info!(files = candidates.len(), "Replaying parked acquisition");
                Some(DeferredOutcome::Acquired(self.acquire(candidates).await))
            }
            Some(DeferredOperation::Promote(id)) => {
                tracing::info!(pending_id = %id, "Replaying parked promotion");
                Some(DeferredOutcome::Promoted(self.promote(id).await))
            }
            Some(DeferredOperation::GenerateAll) => {
                tracing::info!("Replaying parked batch generation");
                Some(DeferredOutcome::Generated(self.generate_all().await))
            }
        };

        Ok(SignInOutcome { session, replayed })
    }

    pub async fn sign_out(&self) {
        self.auth.sign_out().await;
    }

    /// Validate candidates and queue the accepted ones in input order
    #[tracing::instrument(skip(self, candidates), fields(files = candidates.len()))]
    pub async fn acquire(&self, candidates: Vec<CandidateFile>) -> AcquisitionReport {
        let file_names: Vec<String> = candidates.iter().map(|c| c.file_name.clone()).collect();
        if self
            .require_identity(DeferredOperation::Acquire(candidates.clone()))
            .await
            .is_err()
        {
            return AcquisitionReport {
                outcomes: file_names
                    .into_iter()
                    .map(|file_name| AcquisitionOutcome {
                        file_name,
                        result: Err(IntakeError::Unauthenticated),
                    })
                    .collect(),
                deferred: true,
            };
        }

        let mut outcomes = Vec::with_capacity(candidates.len());
        let mut accepted = Vec::new();

        for candidate in candidates {
            let size = usize::try_from(candidate.size_bytes).unwrap_or(usize::MAX);
            if let Err(e) = self
                .validator
                .validate_all(&candidate.file_name, &candidate.mime_type, size)
            {
                let err = IntakeError::from_validation(
                    &candidate.file_name,
                    &candidate.mime_type,
                    candidate.size_bytes,
                    e,
                );
                tracing::warn!(
                    file_name = %candidate.file_name,
                    mime_type = %candidate.mime_type,
                    error = %err,
                    "Upload rejected"
                );
                outcomes.push(AcquisitionOutcome {
                    file_name: candidate.file_name,
                    result: Err(err),
                });
                continue;
            }

            let preview = self.previews.create(Arc::clone(&candidate.source)).await;
            let dimensions = match candidate.source.read_all().await {
                Ok(data) => ImageProcessor::probe_dimensions_blocking(data).await,
                Err(e) => {
                    tracing::debug!(file_name = %candidate.file_name, error = %e, "Dimension probe skipped");
                    None
                }
            };

            let file = PendingFile::new(
                candidate.file_name.clone(),
                candidate.mime_type,
                candidate.size_bytes,
                dimensions,
                preview,
                self.clock.now(),
                candidate.source,
            );
            outcomes.push(AcquisitionOutcome {
                file_name: candidate.file_name,
                result: Ok(file.view()),
            });
            accepted.push(file);
        }

        if !accepted.is_empty() {
            let mut state = self.state.lock().await;
            for file in accepted {
                state.queue.push(file);
            }
        }

        let report = AcquisitionReport {
            outcomes,
            deferred: false,
        };
        tracing::info!(
            accepted = report.accepted().count(),
            rejected = report.rejected().count(),
            "Acquisition finished"
        );
        report
    }

    /// Discard a pending file and release its preview. `Ok(false)` when absent.
    pub async fn remove(&self, id: PendingId) -> Result<bool, IntakeError> {
        let removed = self.state.lock().await.queue.remove(id)?;
        match removed {
            Some(file) => {
                self.previews.revoke(&file.preview).await;
                tracing::info!(pending_id = %id, file_name = %file.file_name, "Pending file removed");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn pending(&self) -> Vec<PendingFileView> {
        self.state.lock().await.queue.list()
    }

    pub async fn pending_file(&self, id: PendingId) -> Option<PendingFileView> {
        self.state.lock().await.queue.get(id)
    }

    /// Synthesize metadata for one pending file and move it into the store
    #[tracing::instrument(skip(self))]
    pub async fn promote(&self, id: PendingId) -> Result<Arc<EvidenceRecord>, IntakeError> {
        let identity = self
            .require_identity(DeferredOperation::Promote(id))
            .await?;
        let (claim, job) = self.claim(id).await?;
        let preview = job.preview.clone();
        let result = self.run(job, &identity).await;
        self.commit(claim, &preview, result).await
    }

    /// Promote every queued file. Records are committed in queue order while up to
    /// `synthesis_concurrency` files are synthesized at once.
    #[tracing::instrument(skip(self))]
    pub async fn generate_all(&self) -> Result<BatchReport, IntakeError> {
        let identity = self
            .require_identity(DeferredOperation::GenerateAll)
            .await?;
        let ids = self.state.lock().await.queue.queued_ids();
        tracing::info!(files = ids.len(), concurrency = self.concurrency, "Generating metadata for queued files");

        let identity = &identity;
        let mut pipeline = stream::iter(ids)
            .map(move |id| async move {
                match self.claim(id).await {
                    Ok((claim, job)) => {
                        let preview = job.preview.clone();
                        let result = self.run(job, identity).await;
                        (id, Ok((claim, preview, result)))
                    }
                    Err(e) => (id, Err(e)),
                }
            })
            .buffered(self.concurrency);

        let mut report = BatchReport::default();
        while let Some((pending_id, prepared)) = pipeline.next().await {
            let result = match prepared {
                Ok((claim, preview, result)) => self.commit(claim, &preview, result).await,
                Err(e) => {
                    tracing::debug!(pending_id = %pending_id, error = %e, "Skipping file no longer queued");
                    Err(e)
                }
            };
            report.outcomes.push(BatchOutcome { pending_id, result });
        }

        tracing::info!(
            promoted = report.promoted().count(),
            skipped = report.skipped().count(),
            failed = report.failed().count(),
            "Batch generation finished"
        );
        Ok(report)
    }

    async fn claim(&self, id: PendingId) -> Result<(ClaimGuard, SynthesisJob), IntakeError> {
        let job = self.state.lock().await.queue.claim(id)?;
        let guard = ClaimGuard {
            state: Arc::clone(&self.state),
            id,
            settled: false,
        };
        Ok((guard, job))
    }

    async fn run(&self, job: SynthesisJob, identity: &Identity) -> Result<EvidenceRecord, IntakeError> {
        self.synthesizer.synthesize(job, identity).await
    }

    /// Settle a synthesis attempt against the queue and store
    async fn commit(
        &self,
        claim: ClaimGuard,
        preview: &PreviewHandle,
        result: Result<EvidenceRecord, IntakeError>,
    ) -> Result<Arc<EvidenceRecord>, IntakeError> {
        let id = claim.id;
        match result {
            Ok(record) => {
                let mut state = self.state.lock().await;
                let taken = state.queue.take(id);
                claim.settle();
                if taken.is_none() {
                    return Err(IntakeError::Internal(format!("{} was not claimed", id)));
                }
                state.store.append(record)
            }
            Err(err @ IntakeError::SourceUnavailable { .. }) => {
                let dropped = {
                    let mut state = self.state.lock().await;
                    let dropped = state.queue.take(id);
                    claim.settle();
                    dropped
                };
                if dropped.is_some() {
                    self.previews.revoke(preview).await;
                }
                report(&err, "synthesis");
                Err(err)
            }
            Err(err) => {
                {
                    let mut state = self.state.lock().await;
                    state.queue.release_claim(id, err.to_string());
                    claim.settle();
                }
                report(&err, "synthesis");
                Err(err)
            }
        }
    }

    pub async fn update(
        &self,
        id: EvidenceId,
        patch: EvidencePatch,
    ) -> Result<Arc<EvidenceRecord>, IntakeError> {
        let now = self.clock.now();
        self.state.lock().await.store.update(id, patch, now)
    }

    pub async fn get(&self, id: EvidenceId) -> Option<Arc<EvidenceRecord>> {
        self.state.lock().await.store.get(id)
    }

    pub async fn list(&self) -> Vec<Arc<EvidenceRecord>> {
        self.state.lock().await.store.list()
    }

    pub async fn query(&self, query: &EvidenceQuery) -> Vec<Arc<EvidenceRecord>> {
        self.state.lock().await.store.query(query)
    }

    pub async fn export_json(&self) -> Result<String, IntakeError> {
        let now = self.clock.now();
        self.state.lock().await.store.export_json(now)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Invoke `callback` for every store change until the returned task is aborted
    pub fn on_change<F>(&self, callback: F) -> JoinHandle<()>
    where
        F: Fn(StoreEvent) + Send + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => callback(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "Change listener lagged behind the store");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
