use thiserror::Error;

use crate::analysis::resolve::ResolutionError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("GraphQL error: {0}")]
    GraphQl(String),

    #[error("Unexpected response shape: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
