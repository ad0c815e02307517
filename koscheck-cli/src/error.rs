//! Error types for the command-line shell.

use koscheck_core::KosError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Kos(#[from] KosError),
    #[error("No Fleet_*.txt chat log found in {dir}")]
    NoChatLog { dir: String },
    #[error("Failed to init logging: {0}")]
    Telemetry(String),
}
