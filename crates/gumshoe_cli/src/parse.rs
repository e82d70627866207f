use std::path::{Path, PathBuf};

use clap::Args;
use gumshoe::ArtifactType;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::{
    error::CliError,
    render::{self, Output, OutputFormat},
};

/// Normalizes previously captured command output without touching a device.
#[derive(Debug, Clone, Args)]
pub struct ParseArgs {
    /// Artifact the text was captured from, e.g. `wifi-history` or `trust-peers`.
    #[arg(long)]
    pub artifact: ArtifactType,

    /// File holding the captured output; `-` reads stdin.
    #[arg(long, default_value = "-")]
    pub input: PathBuf,
}

pub async fn run(args: &ParseArgs, format: OutputFormat) -> Result<(), CliError> {
    let raw = read_input(&args.input).await?;
    debug!(artifact = %args.artifact, bytes = raw.len(), "parsing captured output");
    let report = gumshoe::collect(args.artifact, &raw)?;
    let output = Output {
        device_info: None,
        reports: vec![report],
    };
    render::print(&output, format)
}

async fn read_input(path: &Path) -> Result<String, CliError> {
    let read_error = |source| CliError::ReadInput {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .map_err(read_error)?;
        Ok(raw)
    } else {
        tokio::fs::read_to_string(path).await.map_err(read_error)
    }
}
