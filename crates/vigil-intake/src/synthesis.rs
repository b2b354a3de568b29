//! Metadata synthesis: turns a claimed pending file into an evidence record
//!
//! Synthesis runs as a fixed sequence of stages. Each stage appends its custody
//! entry at the moment the step actually happens, so the log reflects real
//! elapsed time between hashing, analysis and legal review.

use crate::error::IntakeError;
use crate::queue::SynthesisJob;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use tokio::sync::watch;
use vigil_core::{
    Actor, Clock, CustodyAction, CustodyLog, EvidenceId, EvidenceRecord, EvidenceTimestamps,
    Identity, LegalPolicy, Verification, VigilConfig,
};
use vigil_processing::{sha256_source, DerivedMetadata};
use vigil_services::{AnalysisRequest, AuthenticityAnalyzer};

pub const COLLECTED_NOTES: &str = "Initial evidence collection from web upload interface";
pub const HASH_NOTES: &str = "SHA-256 hash generated for integrity verification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisStage {
    Collected,
    Hashing,
    Verifying,
    Reviewed,
}

impl Display for SynthesisStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SynthesisStage::Collected => write!(f, "collected"),
            SynthesisStage::Hashing => write!(f, "hashing"),
            SynthesisStage::Verifying => write!(f, "verifying"),
            SynthesisStage::Reviewed => write!(f, "reviewed"),
        }
    }
}

/// Publishes the stage a running synthesis has reached. The pending queue
/// keeps the receiving half so views show live progress.
#[derive(Clone)]
pub struct StageTracker {
    tx: Arc<watch::Sender<SynthesisStage>>,
}

impl StageTracker {
    pub fn new() -> (Self, watch::Receiver<SynthesisStage>) {
        let (tx, rx) = watch::channel(SynthesisStage::Collected);
        (Self { tx: Arc::new(tx) }, rx)
    }

    pub fn current(&self) -> SynthesisStage {
        *self.tx.borrow()
    }

    pub(crate) fn advance(&self, to: SynthesisStage) {
        let from = self.tx.send_replace(to);
        tracing::debug!(from = %from, to = %to, "Synthesis stage transition");
    }
}

pub struct Synthesizer {
    analyzer: Arc<dyn AuthenticityAnalyzer>,
    policy: LegalPolicy,
    clock: Arc<dyn Clock>,
    reviewer_actor: String,
    legal_actor: String,
}

impl Synthesizer {
    pub fn new(
        analyzer: Arc<dyn AuthenticityAnalyzer>,
        policy: LegalPolicy,
        clock: Arc<dyn Clock>,
        reviewer_actor: impl Into<String>,
        legal_actor: impl Into<String>,
    ) -> Self {
        Self {
            analyzer,
            policy,
            clock,
            reviewer_actor: reviewer_actor.into(),
            legal_actor: legal_actor.into(),
        }
    }

    pub fn from_config(
        config: &VigilConfig,
        analyzer: Arc<dyn AuthenticityAnalyzer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            analyzer,
            LegalPolicy::new(config.admissible_threshold),
            clock,
            config.reviewer_actor.clone(),
            config.legal_actor.clone(),
        )
    }

    #[tracing::instrument(skip(self, job, uploader), fields(pending_id = %job.pending_id, file_name = %job.file_name))]
    pub async fn synthesize(
        &self,
        job: SynthesisJob,
        uploader: &Identity,
    ) -> Result<EvidenceRecord, IntakeError> {
        let collector = uploader.collector_name();

        let mut custody = CustodyLog::collected(
            Actor::named(collector.clone()),
            job.acquired_at,
            COLLECTED_NOTES,
        );

        job.stage.advance(SynthesisStage::Hashing);
        let (integrity_hash, hashed_bytes) = sha256_source(job.source.as_ref())
            .await
            .map_err(|e| IntakeError::from_digest(&job.file_name, e))?;
        if hashed_bytes != job.size_bytes {
            tracing::warn!(
                declared = job.size_bytes,
                hashed = hashed_bytes,
                "Source size differs from the size recorded at acquisition"
            );
        }
        custody.append(
            CustodyAction::HashGenerated,
            Actor::System,
            self.clock.now(),
            HASH_NOTES,
        );

        job.stage.advance(SynthesisStage::Verifying);
        custody.append(
            CustodyAction::VerificationStarted,
            Actor::named(self.reviewer_actor.clone()),
            self.clock.now(),
            format!(
                "Authenticity analysis requested from {}",
                self.analyzer.name()
            ),
        );
        let assessment = self
            .analyzer
            .analyze(AnalysisRequest {
                integrity_hash: integrity_hash.clone(),
                file_name: job.file_name.clone(),
                mime_type: job.mime_type.clone(),
                size_bytes: job.size_bytes,
                source: Arc::clone(&job.source),
            })
            .await
            .map_err(|e| IntakeError::from_analysis(&job.file_name, e))?;

        let legal_status = self.policy.classify(assessment.score);
        let verified_at = self.clock.now();
        custody.append(
            CustodyAction::LegalReview,
            Actor::named(self.legal_actor.clone()),
            verified_at,
            format!(
                "Legal status: {} (authenticity score {})",
                legal_status.as_str(),
                assessment.score
            ),
        );
        job.stage.advance(SynthesisStage::Reviewed);

        let derived = DerivedMetadata::derive(
            &job.file_name,
            &job.mime_type,
            job.size_bytes,
            job.dimensions,
            legal_status,
        );
        let uploaded_at = self.clock.now().max(verified_at);

        tracing::debug!(score = assessment.score.value(), "Synthesis complete");

        Ok(EvidenceRecord {
            id: EvidenceId::new(),
            source_pending_id: job.pending_id,
            title: derived.title,
            kind: derived.kind,
            platform: derived.platform,
            file_name: job.file_name,
            mime_type: job.mime_type,
            size_bytes: job.size_bytes,
            file_size_label: derived.file_size_label,
            resolution_label: derived.resolution_label,
            dimensions: job.dimensions,
            collector,
            uploaded_by: uploader.email.clone(),
            verification: Verification {
                authenticity_score: assessment.score,
                legal_status,
                verified_at,
                analyzer: assessment.analyzer,
            },
            integrity_hash,
            timestamps: EvidenceTimestamps {
                collected_at: job.acquired_at,
                uploaded_at,
                last_modified: uploaded_at,
            },
            description: derived.description,
            tags: derived.tags,
            custody_log: custody,
            preview: job.preview,
        })
    }
}
