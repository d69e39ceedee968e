//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

use crate::utils::errors::PhaseBotError;

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub messages: MessagesConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
}

/// Static texts the engine sends on its own behalf
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MessagesConfig {
    /// Sent for /start, and as the header of /help
    pub help_header: String,
    /// Sent when a private command is used in a group
    pub private_command_notice: String,
    /// Prefix of the notice sent when a handler fails
    pub failure_prefix: String,
    pub notify_on_failure: bool,
}

/// Conversation engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Idle lifetime of a conversation; `None` keeps contexts until replaced
    pub context_ttl_seconds: Option<u64>,
    pub cleanup_interval_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily rolling log file; stdout only when absent
    pub file_path: Option<String>,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_file("config")
    }

    /// Load settings from a named configuration file (extension optional)
    /// layered over the defaults, with `PHASEBOT__SECTION__KEY` overrides.
    pub fn from_file(name: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix("PHASEBOT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), PhaseBotError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
            },
            messages: MessagesConfig::default(),
            engine: EngineConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            help_header: "This bot is using CommandsAPI. I obey these commands:".to_string(),
            private_command_notice: "This command should only be used in 1-on-1 conversations with me"
                .to_string(),
            failure_prefix: "Error: ".to_string(),
            notify_on_failure: true,
        }
    }
}

impl EngineConfig {
    /// The configured TTL as a duration; errors when it does not fit one
    pub fn context_ttl(&self) -> Result<Option<chrono::Duration>, PhaseBotError> {
        let Some(seconds) = self.context_ttl_seconds else {
            return Ok(None);
        };
        i64::try_from(seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .map(Some)
            .ok_or_else(|| {
                PhaseBotError::Config(format!("Context TTL of {} seconds is too large", seconds))
            })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_ttl_seconds: None,
            cleanup_interval_seconds: 300,
        }
    }
}
