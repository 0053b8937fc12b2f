use crate::Configuration;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning counter records into phases
#[derive(Debug, Error)]
pub enum PhaseError {
    /// A record (or a whole run) could not be parsed into sample fields
    #[error("Malformed record in {source_name} at line {line}: {reason}")]
    MalformedRecord {
        /// Name of the run the record came from
        source_name: String,
        /// 1-based line number, 0 when the whole run is affected
        line: usize,
        /// What went wrong
        reason: String,
    },

    /// The mixture model could not be fitted
    #[error("Clustering failed: {reason}")]
    ClusteringFailure { reason: String },

    /// No eligible samples remain for a configuration
    #[error("Configuration {configuration} has no eligible samples")]
    EmptyConfiguration { configuration: Configuration },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {0}")]
    Config(String),
}

impl PhaseError {
    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        PhaseError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PhaseError>;
