// ⚠️ Import errors
// Operator-facing failures. Row-level data gaps are never errors; they are
// dropped or degraded by the parsers and counted in the summary.

use std::path::PathBuf;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ImportError {
    /// An input CSV does not exist
    #[error("input file for {input} not found: {path}")]
    MissingInput { input: String, path: PathBuf },

    /// No storage target was configured
    #[error("missing {name}: pass --database or --json-dir")]
    MissingCredential { name: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The record sink could not be opened
    #[error("cannot open record sink {target}: {source}")]
    SinkUnavailable {
        target: String,
        #[source]
        source: BoxError,
    },

    /// The record sink rejected a batch; the import stops here
    #[error("failed writing {collection}: {source}")]
    SinkWrite {
        collection: String,
        #[source]
        source: BoxError,
    },
}

impl ImportError {
    pub fn sink_unavailable(target: impl Into<String>, source: anyhow::Error) -> Self {
        ImportError::SinkUnavailable {
            target: target.into(),
            source: source.into(),
        }
    }

    pub fn sink_write(collection: impl Into<String>, source: anyhow::Error) -> Self {
        ImportError::SinkWrite {
            collection: collection.into(),
            source: source.into(),
        }
    }
}
