//! Process configuration.
//!
//! The API secret is read once at startup, either directly from flag or
//! environment or out of a key file, and wrapped in [`ApiKey`] so the
//! plain text never travels further than this module.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::middleware::ApiKey;

/// Command-line and environment configuration.
#[derive(Debug, Parser)]
#[command(name = "podium", version, about = "Leaderboard service")]
pub struct Cli {
    /// Socket address to listen on.
    #[arg(long, env = "PODIUM_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Shared API secret presented by clients in the key header.
    #[arg(long, env = "API_SECRET_KEY", hide_env_values = true)]
    pub api_secret_key: Option<String>,

    /// File holding the API secret; trailing whitespace is trimmed.
    #[arg(long, env = "API_SECRET_KEY_FILE", conflicts_with = "api_secret_key")]
    pub api_secret_key_file: Option<PathBuf>,
}

/// Configuration failures surfaced before the server starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no API secret configured; set API_SECRET_KEY or API_SECRET_KEY_FILE")]
    MissingSecret,
    #[error("failed to read API secret from {path}")]
    UnreadableSecret {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("configured API secret is empty")]
    EmptySecret,
}

/// Resolved runtime configuration.
#[derive(Debug)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub api_key: ApiKey,
}

impl Cli {
    /// Resolve the secret source and produce the runtime configuration.
    pub fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let secret = match (self.api_secret_key, self.api_secret_key_file) {
            (Some(secret), _) => secret,
            (None, Some(path)) => std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::UnreadableSecret { path, source })?
                .trim_end()
                .to_owned(),
            (None, None) => return Err(ConfigError::MissingSecret),
        };
        if secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(ServerConfig {
            bind: self.bind,
            api_key: ApiKey::new(secret),
        })
    }
}
