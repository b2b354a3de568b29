//! Configuration module
//!
//! This module provides the configuration for the evidence intake workflow:
//! upload limits, the legal-status policy threshold, synthesis concurrency,
//! custody actor names, and the external analysis service.

use std::env;

// Common constants
const MAX_FILE_SIZE_MB: usize = 25;
const ADMISSIBLE_THRESHOLD: u8 = 70;
const SYNTHESIS_CONCURRENCY: usize = 2;
const SESSION_EXPIRY_HOURS: i64 = 12;
const MAX_SESSION_EXPIRY_HOURS: i64 = 24 * 365;
const ANALYSIS_TIMEOUT_SECS: u64 = 30;
const ANALYSIS_MAX_RETRIES: u32 = 3;
const ANALYSIS_BACKOFF_MS: u64 = 500;
const REVIEWER_ACTOR: &str = "Verification Desk";
const LEGAL_ACTOR: &str = "Legal Team";

/// External authenticity analysis service settings
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Full URL of the assessment endpoint. `None` leaves the analyzer unconfigured.
    pub endpoint: Option<String>,
    /// Bearer token sent to the service.
    ///
    /// WARNING: secret. Never log this field.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Base delay for exponential backoff between retries.
    pub backoff_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: ANALYSIS_TIMEOUT_SECS,
            max_retries: ANALYSIS_MAX_RETRIES,
            backoff_ms: ANALYSIS_BACKOFF_MS,
        }
    }
}

/// Evidence intake configuration
#[derive(Clone, Debug)]
pub struct VigilConfig {
    pub environment: String,
    pub max_file_size_bytes: usize,
    /// Reject files whose extension contradicts the declared image MIME type.
    pub enforce_extension_match: bool,
    /// Scores strictly above this value are classified as admissible.
    pub admissible_threshold: u8,
    /// Upper bound on files synthesized at the same time during a batch.
    pub synthesis_concurrency: usize,
    /// Custody actor recorded when verification starts.
    pub reviewer_actor: String,
    /// Custody actor recorded for the legal review step.
    pub legal_actor: String,
    pub session_expiry_hours: i64,
    /// "json" or "pretty"
    pub log_format: String,
    pub analysis: AnalysisConfig,
}

impl Default for VigilConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            enforce_extension_match: true,
            admissible_threshold: ADMISSIBLE_THRESHOLD,
            synthesis_concurrency: SYNTHESIS_CONCURRENCY,
            reviewer_actor: REVIEWER_ACTOR.to_string(),
            legal_actor: LEGAL_ACTOR.to_string(),
            session_expiry_hours: SESSION_EXPIRY_HOURS,
            log_format: "pretty".to_string(),
            analysis: AnalysisConfig::default(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl VigilConfig {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from an arbitrary key lookup. Unset keys fall back to defaults;
    /// malformed numeric values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let parse_num = |key: &str| -> Result<Option<u64>, anyhow::Error> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map(Some)
                    .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer", key)),
                None => Ok(None),
            }
        };

        let max_file_size_bytes = match parse_num("VIGIL_MAX_FILE_SIZE_MB")? {
            Some(mb) => usize::try_from(mb)
                .ok()
                .and_then(|mb| mb.checked_mul(1024 * 1024))
                .ok_or_else(|| anyhow::anyhow!("VIGIL_MAX_FILE_SIZE_MB is too large"))?,
            None => defaults.max_file_size_bytes,
        };

        let admissible_threshold = match parse_num("VIGIL_ADMISSIBLE_THRESHOLD")? {
            Some(v) => u8::try_from(v)
                .map_err(|_| anyhow::anyhow!("VIGIL_ADMISSIBLE_THRESHOLD must be between 0 and 99"))?,
            None => defaults.admissible_threshold,
        };

        let enforce_extension_match = match lookup("VIGIL_ENFORCE_EXTENSION_MATCH") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                anyhow::anyhow!("VIGIL_ENFORCE_EXTENSION_MATCH must be true or false")
            })?,
            None => defaults.enforce_extension_match,
        };

        let analysis = AnalysisConfig {
            endpoint: lookup("VIGIL_ANALYSIS_ENDPOINT").filter(|s| !s.trim().is_empty()),
            api_key: lookup("VIGIL_ANALYSIS_API_KEY").filter(|s| !s.trim().is_empty()),
            timeout_secs: parse_num("VIGIL_ANALYSIS_TIMEOUT_SECS")?
                .unwrap_or(defaults.analysis.timeout_secs),
            max_retries: match parse_num("VIGIL_ANALYSIS_MAX_RETRIES")? {
                Some(v) => u32::try_from(v)
                    .map_err(|_| anyhow::anyhow!("VIGIL_ANALYSIS_MAX_RETRIES is too large"))?,
                None => defaults.analysis.max_retries,
            },
            backoff_ms: parse_num("VIGIL_ANALYSIS_BACKOFF_MS")?
                .unwrap_or(defaults.analysis.backoff_ms),
        };

        Ok(Self {
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or(defaults.environment),
            max_file_size_bytes,
            enforce_extension_match,
            admissible_threshold,
            synthesis_concurrency: match parse_num("VIGIL_SYNTHESIS_CONCURRENCY")? {
                Some(v) => usize::try_from(v)
                    .map_err(|_| anyhow::anyhow!("VIGIL_SYNTHESIS_CONCURRENCY is too large"))?,
                None => defaults.synthesis_concurrency,
            },
            reviewer_actor: lookup("VIGIL_REVIEWER_ACTOR").unwrap_or(defaults.reviewer_actor),
            legal_actor: lookup("VIGIL_LEGAL_ACTOR").unwrap_or(defaults.legal_actor),
            session_expiry_hours: match parse_num("VIGIL_SESSION_EXPIRY_HOURS")? {
                Some(v) => i64::try_from(v)
                    .map_err(|_| anyhow::anyhow!("VIGIL_SESSION_EXPIRY_HOURS is too large"))?,
                None => defaults.session_expiry_hours,
            },
            log_format: lookup("LOG_FORMAT")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or(defaults.log_format),
            analysis,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("VIGIL_MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.admissible_threshold > 99 {
            return Err(anyhow::anyhow!(
                "VIGIL_ADMISSIBLE_THRESHOLD must be between 0 and 99 (scores range 1-100)"
            ));
        }

        if self.synthesis_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "VIGIL_SYNTHESIS_CONCURRENCY must be at least 1"
            ));
        }

        if !(1..=MAX_SESSION_EXPIRY_HOURS).contains(&self.session_expiry_hours) {
            return Err(anyhow::anyhow!(
                "VIGIL_SESSION_EXPIRY_HOURS must be between 1 and {}",
                MAX_SESSION_EXPIRY_HOURS
            ));
        }

        if self.reviewer_actor.trim().is_empty() || self.legal_actor.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "VIGIL_REVIEWER_ACTOR and VIGIL_LEGAL_ACTOR cannot be empty"
            ));
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(anyhow::anyhow!("LOG_FORMAT must be 'json' or 'pretty'"));
        }

        match &self.analysis.endpoint {
            Some(endpoint) => {
                if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                    return Err(anyhow::anyhow!(
                        "VIGIL_ANALYSIS_ENDPOINT must be an http(s) URL"
                    ));
                }
                if self.is_production() && endpoint.starts_with("http://") {
                    return Err(anyhow::anyhow!(
                        "VIGIL_ANALYSIS_ENDPOINT must use https in production"
                    ));
                }
            }
            None if self.is_production() => {
                return Err(anyhow::anyhow!(
                    "VIGIL_ANALYSIS_ENDPOINT must be set in production"
                ));
            }
            None => {}
        }

        if self.analysis.timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "VIGIL_ANALYSIS_TIMEOUT_SECS must be greater than 0"
            ));
        }

        Ok(())
    }
}
