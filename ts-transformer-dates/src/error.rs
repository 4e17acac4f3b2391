//! Error types for loading configuration and type tables.
//!
//! The rewrite pass itself never fails: resolution misses are silent
//! non-matches. Only the I/O and parsing around it report errors.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformerError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Failed to parse type table JSON: {0}")]
    TypeTable(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TransformerError>;
