//! HTTP client for an external authenticity analysis service

use super::{AnalysisError, AnalysisRequest, AuthenticityAnalyzer, AuthenticityAssessment};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;
use vigil_core::{AnalysisConfig, AuthenticityScore};

const ANALYZER_NAME: &str = "http-authenticity";
const MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Debug, Serialize)]
struct AnalyzeRequestBody<'a> {
    integrity_hash: &'a str,
    file_name: &'a str,
    mime_type: &'a str,
    size_bytes: u64,
    content_base64: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponseBody {
    score: i64,
    #[serde(default)]
    analyzer: Option<String>,
}

pub struct HttpAuthenticityAnalyzer {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    max_retries: u32,
    backoff_ms: u64,
}

impl Debug for HttpAuthenticityAnalyzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("HttpAuthenticityAnalyzer")
            .field("endpoint", &self.endpoint)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Delay before retry number `attempt` (0-based), doubling up to a cap
pub(crate) fn compute_retry_backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    base_ms
        .saturating_mul(2_u64.saturating_pow(attempt))
        .min(MAX_BACKOFF_MS)
}

impl HttpAuthenticityAnalyzer {
    pub fn new(endpoint: impl Into<String>, config: &AnalysisConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client for authenticity analysis")?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries,
            backoff_ms: config.backoff_ms,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .context("VIGIL_ANALYSIS_ENDPOINT is not set")?;
        Self::new(endpoint, config)
    }

    async fn send_once(&self, body: &AnalyzeRequestBody<'_>) -> Result<AuthenticityAssessment, AnalysisError> {
        let mut request = self.http_client.post(&self.endpoint).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalysisError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let parsed: AnalyzeResponseBody = response
            .json()
            .await
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

        let score = AuthenticityScore::new(parsed.score)
            .map_err(|e| AnalysisError::InvalidResponse(e.to_string()))?;

        Ok(AuthenticityAssessment {
            score,
            analyzer: parsed
                .analyzer
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| ANALYZER_NAME.to_string()),
        })
    }
}

#[async_trait]
impl AuthenticityAnalyzer for HttpAuthenticityAnalyzer {
    fn name(&self) -> &str {
        ANALYZER_NAME
    }

    #[tracing::instrument(skip(self, request), fields(file_name = %request.file_name, hash = %request.integrity_hash))]
    async fn analyze(
        &self,
        request: AnalysisRequest,
    ) -> Result<AuthenticityAssessment, AnalysisError> {
        use base64::Engine;

        let data = request.source.read_all().await?;
        let body = AnalyzeRequestBody {
            integrity_hash: request.integrity_hash.as_str(),
            file_name: &request.file_name,
            mime_type: &request.mime_type,
            size_bytes: request.size_bytes,
            content_base64: base64::engine::general_purpose::STANDARD.encode(&data),
        };

        let mut attempt: u32 = 0;
        loop {
            match self.send_once(&body).await {
                Ok(assessment) => {
                    tracing::info!(
                        score = assessment.score.value(),
                        analyzer = %assessment.analyzer,
                        attempts = attempt + 1,
                        "Authenticity analysis completed"
                    );
                    return Ok(assessment);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay_ms = compute_retry_backoff_ms(self.backoff_ms, attempt);
                    tracing::warn!(
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms,
                        "Authenticity analysis failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, attempts = attempt + 1, "Authenticity analysis failed");
                    return Err(e);
                }
            }
        }
    }
}
