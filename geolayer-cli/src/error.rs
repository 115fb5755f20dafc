//! CLI error type.

use std::fmt;

use geolayer::api::ApiError;
use geolayer::config::ConfigError;

/// Errors that end a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// Missing or invalid configuration.
    Config(String),
    /// The HTTP client could not be created.
    Client(ApiError),
    /// Invalid command-line argument.
    Argument(String),
    /// Writing output failed.
    Output(String),
    /// The polling task panicked or was aborted.
    Task(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Client(e) => write!(f, "Failed to create API client: {}", e),
            CliError::Argument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Output(msg) => write!(f, "Failed to write output: {}", msg),
            CliError::Task(msg) => write!(f, "Loader task failed: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        CliError::Client(e)
    }
}
