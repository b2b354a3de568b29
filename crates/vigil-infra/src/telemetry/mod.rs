use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vigil_core::VigilConfig;

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "vigil=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Initialize tracing with a plain or JSON formatter, per `LOG_FORMAT`
pub fn init_telemetry(config: &VigilConfig) -> Result<(), anyhow::Error> {
    let registry = tracing_subscriber::registry().with(env_filter());

    if config.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .context("Failed to install JSON tracing subscriber")?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to install tracing subscriber")?;
    }

    tracing::debug!(
        environment = %config.environment,
        log_format = %config.log_format,
        "Telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = VigilConfig {
            log_format: "json".to_string(),
            ..VigilConfig::default()
        };
        // Only one global subscriber can be installed per process.
        let first = init_telemetry(&config);
        let second = init_telemetry(&config);
        assert!(first.is_ok());
        assert!(second.is_err());
    }
}
