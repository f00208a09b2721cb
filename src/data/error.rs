use std::path::PathBuf;

use thiserror::Error;

/// Why a dataset could not be turned into a [`TrackTable`](super::model::TrackTable).
///
/// Any of these halts the session: no partial table is ever handed out.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("data file not found or unreadable: {}", path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("malformed {format} input: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },
}

impl LoadError {
    pub(crate) fn malformed(format: &'static str, err: impl std::fmt::Display) -> Self {
        LoadError::Malformed {
            format,
            message: err.to_string(),
        }
    }
}

/// Failure while writing a filtered view back out.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}
