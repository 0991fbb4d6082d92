use std::io;
use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

/// Error type for fetching, loading, reconciling and writing.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch '{url}': {reason}")]
    Fetch { url: String, reason: String },
    #[error("malformed {source_name} data: {details}")]
    DataFormat {
        source_name: &'static str,
        details: String,
    },
    #[error("reconciliation failed for region '{region_key}': {details}")]
    Reconciliation { region_key: String, details: String },
    #[error("failed to write '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl PipelineError {
    pub(crate) fn data_format(source_name: &'static str, details: impl Into<String>) -> Self {
        PipelineError::DataFormat {
            source_name,
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
