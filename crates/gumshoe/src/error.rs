use std::{path::PathBuf, process::ExitStatus, time::Duration};

use thiserror::Error;

use crate::ArtifactType;

/// Failures surfaced by the normalization pipeline.
///
/// Missing leaf fields never show up here; they resolve to [`crate::NOT_AVAILABLE`].
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{artifact} output is still not valid JSON after repair: {source} (near `{excerpt}`)")]
    RepairIneffective {
        artifact: ArtifactType,
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{artifact} output is not valid JSON: {source} (near `{excerpt}`)")]
    InvalidJson {
        artifact: ArtifactType,
        excerpt: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{artifact} document is missing `{expected}`")]
    StructuralMismatch {
        artifact: ArtifactType,
        expected: &'static str,
    },
}

impl ExtractionError {
    pub fn artifact(&self) -> ArtifactType {
        match self {
            ExtractionError::RepairIneffective { artifact, .. }
            | ExtractionError::InvalidJson { artifact, .. }
            | ExtractionError::StructuralMismatch { artifact, .. } => *artifact,
        }
    }
}

/// Errors raised while talking to the device.
#[derive(Debug, Error)]
pub enum GumshoeError {
    #[error("no device connected")]
    NotConnected,
    #[error("failed to spawn ssh process (binary={binary:?}): {source}")]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("remote command timed out after {timeout:?}")]
    Timeout { timeout: Duration },
    #[error("failed waiting for ssh process: {0}")]
    Wait(std::io::Error),
    #[error("failed reading stdout: {0}")]
    StdoutRead(std::io::Error),
    #[error("failed reading stderr: {0}")]
    StderrRead(std::io::Error),
    #[error("internal error: missing stdout pipe")]
    MissingStdout,
    #[error("internal error: missing stderr pipe")]
    MissingStderr,
    #[error("internal error: join failure: {0}")]
    Join(String),
    #[error("ssh session to {destination} could not be opened ({status})")]
    ConnectFailed {
        destination: String,
        status: ExitStatus,
    },
    #[error("failed to prepare ssh control directory: {0}")]
    ControlDir(std::io::Error),
    #[error("request is invalid: {0}")]
    InvalidRequest(String),
    #[error("remote command `{command}` exited with {status}: {stderr}")]
    NonZeroExit {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("remote output was not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}
