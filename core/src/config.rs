//! Service configuration, loaded from a JSON file at bootstrap.

use std::path::Path;

use serde::Deserialize;

/// Errors from reading or decoding the config file. Bootstrap treats these
/// as fatal; nothing on the runtime path touches the config file again.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Destination and transport parameters for the outbound mailer. Opaque to
/// the core pipeline; only the SMTP mailer interprets them.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    /// Sender address, also used as the SMTP username.
    pub email: String,
    /// Recipient address submissions are forwarded to.
    pub to: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
}

/// Top-level service configuration (`config/app.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub smtp: SmtpConfig,
    pub hostname: String,
    pub port: u16,
}

impl Config {
    /// Read and decode the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Listen address for the HTTP server.
    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}
