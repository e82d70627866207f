use std::{io, path::PathBuf};

use gumshoe::{ExtractionError, GumshoeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Device(#[from] GumshoeError),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("failed to read {path:?}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{failed} of {attempted} collections failed")]
    Incomplete { failed: usize, attempted: usize },
}
