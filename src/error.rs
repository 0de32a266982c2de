use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a harvest run before any recipe work starts
#[derive(Error, Debug)]
pub enum HarvestError {
    /// No API credential found in config or environment
    #[error("missing API credential: set {0} or providers.api_key in config.toml")]
    MissingCredential(&'static str),

    /// Input document could not be read
    #[error("failed to read input {path}: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input document is not valid JSON of the expected shape
    #[error("malformed input document {path}: {source}")]
    InputMalformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Input path is neither a thread directory nor an export file
    #[error("input not found: {0}")]
    InputMissing(PathBuf),

    /// Output corpus could not be prepared
    #[error("failed to prepare output directory {path}: {source}")]
    OutputUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Failed to construct the HTTP client
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
