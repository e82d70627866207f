use std::fmt;

use clap::{Args, ValueEnum};
use gumshoe::{ArtifactType, DeviceClient, GumshoeError};
use tracing::debug;

use crate::{
    connection::ConnectionArgs,
    error::CliError,
    render::{self, Output, OutputFormat},
};

/// One thing the device can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    DeviceInfo,
    Artifact(ArtifactType),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::DeviceInfo => f.write_str("device-info"),
            Target::Artifact(artifact) => write!(f, "{artifact}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppScope {
    /// Bundles under /Applications.
    Apple,
    /// App Store installs under the bundle container directory.
    User,
    All,
}

#[derive(Debug, Clone, Args)]
pub struct AppsArgs {
    #[arg(long, value_enum, default_value_t = AppScope::All)]
    pub source: AppScope,
}

impl AppsArgs {
    pub fn targets(&self) -> Vec<Target> {
        let apple = Target::Artifact(ArtifactType::InstalledAppsApple);
        let user = Target::Artifact(ArtifactType::InstalledAppsUser);
        match self.source {
            AppScope::Apple => vec![apple],
            AppScope::User => vec![user],
            AppScope::All => vec![apple, user],
        }
    }
}

/// Every target, in menu order.
pub fn everything() -> Vec<Target> {
    std::iter::once(Target::DeviceInfo)
        .chain([
            ArtifactType::TrustPeers,
            ArtifactType::WifiHistory,
            ArtifactType::IdentityCache,
            ArtifactType::LocationHistory,
            ArtifactType::InstalledAppsApple,
            ArtifactType::InstalledAppsUser,
        ]
        .into_iter()
        .map(Target::Artifact))
        .collect()
}

#[derive(Debug, Default)]
pub struct Gathered {
    pub output: Output,
    pub failures: Vec<(Target, GumshoeError)>,
}

/// Collects each target in turn; one failing target does not stop the rest.
pub async fn gather(client: &DeviceClient, targets: &[Target]) -> Gathered {
    let mut gathered = Gathered::default();
    for &target in targets {
        debug!(%target, "collecting");
        let outcome = match target {
            Target::DeviceInfo => client
                .collect_device_info()
                .await
                .map(|report| gathered.output.device_info = Some(report)),
            Target::Artifact(artifact) => client
                .collect_artifact(artifact)
                .await
                .map(|report| gathered.output.reports.push(report)),
        };
        if let Err(err) = outcome {
            gathered.failures.push((target, err));
        }
    }
    gathered
}

/// Connects, collects `targets`, disconnects, then prints what was gathered.
pub async fn run(
    connection: &ConnectionArgs,
    format: OutputFormat,
    targets: &[Target],
) -> Result<(), CliError> {
    let mut client = connection.connect().await?;
    let gathered = gather(&client, targets).await;
    client.disconnect().await;

    render::print(&gathered.output, format)?;

    let mut failures = gathered.failures;
    match failures.len() {
        0 => Ok(()),
        1 if targets.len() == 1 => Err(failures.remove(0).1.into()),
        failed => {
            for (target, err) in &failures {
                eprintln!("{target}: {err}");
            }
            Err(CliError::Incomplete {
                failed,
                attempted: targets.len(),
            })
        }
    }
}
