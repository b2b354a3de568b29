//! Scripted authenticity analyzer for driving synthesis from tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use vigil_core::AuthenticityScore;
use vigil_services::{AnalysisError, AnalysisRequest, AuthenticityAnalyzer, AuthenticityAssessment};

/// Pauses analysis of one file until released
#[derive(Clone, Default)]
pub struct Gate {
    pub started: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct ScriptedAnalyzer {
    default_score: i64,
    scores: HashMap<String, i64>,
    delays: HashMap<String, Duration>,
    gates: HashMap<String, Gate>,
    failures_remaining: AtomicU32,
    completed: Mutex<Vec<String>>,
}

impl ScriptedAnalyzer {
    pub fn new(default_score: i64) -> Self {
        Self {
            default_score,
            ..Default::default()
        }
    }

    pub fn with_score(mut self, file_name: &str, score: i64) -> Self {
        self.scores.insert(file_name.to_string(), score);
        self
    }

    pub fn with_delay(mut self, file_name: &str, delay: Duration) -> Self {
        self.delays.insert(file_name.to_string(), delay);
        self
    }

    pub fn with_gate(mut self, file_name: &str, gate: Gate) -> Self {
        self.gates.insert(file_name.to_string(), gate);
        self
    }

    /// Fail the next `count` calls with a transport error
    pub fn failing(self, count: u32) -> Self {
        self.failures_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// File names in the order their analysis finished
    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthenticityAnalyzer for ScriptedAnalyzer {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AuthenticityAssessment, AnalysisError> {
        request.source.read_all().await?;

        if let Some(gate) = self.gates.get(&request.file_name) {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        if let Some(delay) = self.delays.get(&request.file_name) {
            tokio::time::sleep(*delay).await;
        }

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(AnalysisError::Transport("connection reset".to_string()));
        }

        let score = *self
            .scores
            .get(&request.file_name)
            .unwrap_or(&self.default_score);
        self.completed
            .lock()
            .unwrap()
            .push(request.file_name.clone());

        Ok(AuthenticityAssessment {
            score: AuthenticityScore::new(score).expect("scripted score in range"),
            analyzer: "scripted".to_string(),
        })
    }
}
