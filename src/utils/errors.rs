//! Error handling for PhaseBot
//!
//! This module defines the main error type used throughout the engine
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for PhaseBot
#[derive(Error, Debug)]
pub enum PhaseBotError {
    #[error("Command {command} can only be used in a private chat")]
    ScopeViolation { command: String },

    #[error("Handler for {command} failed in phase '{phase}': {source}")]
    HandlerFailure {
        command: String,
        phase: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Malformed outbound message: {0}")]
    MalformedOutboundMessage(String),

    #[error("Invalid command definition: {0}")]
    InvalidCommand(String),

    #[error("Unknown phase '{phase}' in command {command}")]
    UnknownPhase { command: String, phase: String },

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for PhaseBot operations
pub type Result<T> = std::result::Result<T, PhaseBotError>;

impl PhaseBotError {
    /// Check if the error leaves the conversation retryable
    pub fn is_recoverable(&self) -> bool {
        match self {
            PhaseBotError::ScopeViolation { .. } => true,
            PhaseBotError::HandlerFailure { .. } => true,
            PhaseBotError::MalformedOutboundMessage(_) => true,
            PhaseBotError::InvalidCommand(_) => false,
            PhaseBotError::UnknownPhase { .. } => false,
            PhaseBotError::Telegram(_) => true,
            PhaseBotError::Config(_) => false,
            PhaseBotError::ConfigLoad(_) => false,
            PhaseBotError::Serialization(_) => false,
            PhaseBotError::Io(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PhaseBotError::Config(_) => ErrorSeverity::Critical,
            PhaseBotError::ConfigLoad(_) => ErrorSeverity::Critical,
            PhaseBotError::InvalidCommand(_) => ErrorSeverity::Critical,
            PhaseBotError::ScopeViolation { .. } => ErrorSeverity::Warning,
            PhaseBotError::MalformedOutboundMessage(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
