//! Errors surfaced by adapters and the write-back.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("source file {} is unavailable", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse source file {}", path.display())]
    MalformedSource {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("target system is unavailable: {reason}")]
    TargetUnavailable { reason: String },

    #[error("failed to parse ledger file {}", path.display())]
    MalformedTarget {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("target rejected account '{name}': {reason}")]
    WriteRejected { name: String, reason: String },

    #[error("unexpected response from target for '{name}': {reason}")]
    AmbiguousResponse { name: String, reason: String },

    #[error("account '{name}' has unknown category '{category}'")]
    UnknownCategory { name: String, category: String },

    #[error("failed to serialize ledger: {0}")]
    SerializeLedger(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure concerns a single record rather than the whole session.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Error::WriteRejected { .. }
                | Error::AmbiguousResponse { .. }
                | Error::UnknownCategory { .. }
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
