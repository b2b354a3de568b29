//! Error metadata module
//!
//! Errors in Vigil are all recoverable at the presentation layer (toast or inline
//! message). Each crate defines its own `thiserror` enum; those enums describe
//! how they should be surfaced by implementing [`ErrorMetadata`].

use std::fmt::Display;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues the user should act on
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error presentation - defines how an error should be surfaced
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "UNSUPPORTED_FILE_TYPE")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (the same operation can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Emit a tracing event for `err` at the level it declares.
pub fn report<E>(err: &E, context: &str)
where
    E: ErrorMetadata + Display,
{
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, error_code = code, "{}", context),
        LogLevel::Warn => tracing::warn!(error = %err, error_code = code, "{}", context),
        LogLevel::Error => tracing::error!(error = %err, error_code = code, "{}", context),
    }
}
