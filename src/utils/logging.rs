//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the PhaseBot engine.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::utils::errors::{ErrorSeverity, PhaseBotError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level).map_err(|e| {
        PhaseBotError::Config(format!("Invalid log filter '{}': {}", config.level, e))
    })?;

    let (file_layer, guard) = match &config.file_path {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "phasebot.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| PhaseBotError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log an inbound message routed by the engine
pub fn log_inbound(user_id: i64, chat_id: i64, token: &str, routing: &str) {
    debug!(
        user_id = user_id,
        chat_id = chat_id,
        token = token,
        routing = routing,
        "Inbound message routed"
    );
}

/// Log a phase transition
pub fn log_transition(user_id: i64, command: &str, from: &str, to: &str) {
    info!(
        user_id = user_id,
        command = command,
        from = from,
        to = to,
        "Phase transition"
    );
}

/// Log a failed outbound send that was not propagated
pub fn log_send_failure(user_id: i64, command: &str, phase: &str, error: &PhaseBotError) {
    warn!(
        user_id = user_id,
        command = command,
        phase = phase,
        error = %error,
        "Outbound message failed"
    );
}

/// Log a failure that reached the top-level message handler
pub fn log_dispatch_failure(user_id: i64, chat_id: i64, error: &PhaseBotError) {
    match error.severity() {
        ErrorSeverity::Info | ErrorSeverity::Warning => {
            warn!(
                user_id = user_id,
                chat_id = chat_id,
                error = %error,
                severity = %error.severity(),
                "Message handling rejected"
            );
        }
        _ => {
            error!(
                user_id = user_id,
                chat_id = chat_id,
                error = %error,
                severity = %error.severity(),
                "Message handling failed"
            );
        }
    }
}
