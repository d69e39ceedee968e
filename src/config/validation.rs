//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use super::Settings;
use crate::utils::errors::{PhaseBotError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_messages_config(&settings.messages)?;
    validate_engine_config(&settings.engine)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(PhaseBotError::Config("Bot token is required".to_string()));
    }

    if !config.token.contains(':') {
        return Err(PhaseBotError::Config(
            "Bot token must have the form <id>:<secret>".to_string(),
        ));
    }

    Ok(())
}

/// Validate static message texts
fn validate_messages_config(config: &super::MessagesConfig) -> Result<()> {
    if config.help_header.trim().is_empty() {
        return Err(PhaseBotError::Config("Help header must not be empty".to_string()));
    }

    if config.private_command_notice.trim().is_empty() {
        return Err(PhaseBotError::Config(
            "Private command notice must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate engine configuration
fn validate_engine_config(config: &super::EngineConfig) -> Result<()> {
    if config.context_ttl_seconds == Some(0) {
        return Err(PhaseBotError::Config(
            "Context TTL must be greater than 0 when set".to_string(),
        ));
    }

    config.context_ttl()?;

    if config.cleanup_interval_seconds == 0 {
        return Err(PhaseBotError::Config(
            "Cleanup interval must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(PhaseBotError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(PhaseBotError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}
